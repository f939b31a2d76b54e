//! In-memory fake of the vStats Cloud for unit and integration tests
//!
//! [`FakeCloudApi`] implements [`CloudApi`] on top of plain vectors and
//! records every call it receives, so tests can assert not only on results
//! but on which requests a workflow issued (and how many times).
//!
//! # Example
//!
//! ```
//! use vstats::api::fake::FakeCloudApi;
//! use vstats::api::CloudApi;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let cloud = FakeCloudApi::new();
//! cloud.add_server("srv-1", "web-01");
//!
//! let server = cloud.get_server("srv-1").await.unwrap();
//! assert_eq!(server.name, "web-01");
//! assert_eq!(cloud.call_count("get_server"), 1);
//! # }
//! ```

use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::api::types::{
    web_status, AgentKey, CurrentUser, HistoryRange, InstallCommand, MetricsHistory,
    MetricsResponse, Server, User, UserPlan, VerifyResponse, WebInstance, WebInstanceHealth,
    WebInstanceRegistration,
};
use crate::api::CloudApi;
use crate::error::{Result, VstatsError};

#[derive(Debug)]
struct FakeState {
    servers: Vec<Server>,
    web_instances: Vec<WebInstance>,
    plan: UserPlan,
    verify: VerifyResponse,
    history: Vec<crate::api::types::MetricsPoint>,
    failing: HashSet<String>,
    calls: Vec<String>,
    next_id: u64,
}

/// Recording in-memory implementation of [`CloudApi`]
#[derive(Debug)]
pub struct FakeCloudApi {
    state: Mutex<FakeState>,
}

impl Default for FakeCloudApi {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeCloudApi {
    /// Empty cloud on a free plan allowing one web instance
    pub fn new() -> Self {
        Self {
            state: Mutex::new(FakeState {
                servers: Vec::new(),
                web_instances: Vec::new(),
                plan: UserPlan {
                    plan: "free".to_string(),
                    max_web_apps: 1,
                    current_count: 0,
                    is_pro: false,
                },
                verify: VerifyResponse {
                    valid: true,
                    user_id: "user-1".to_string(),
                    username: "tester".to_string(),
                    plan: "free".to_string(),
                },
                history: Vec::new(),
                failing: HashSet::new(),
                calls: Vec::new(),
                next_id: 1,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seed a server and return it
    pub fn add_server(&self, id: &str, name: &str) -> Server {
        let server = sample_server(id, name, &format!("key-{}", id));
        self.lock().servers.push(server.clone());
        server
    }

    /// Seed a web instance and return it
    pub fn add_web_instance(&self, id: &str, name: &str) -> WebInstance {
        let instance = WebInstance {
            id: id.to_string(),
            name: name.to_string(),
            host: format!("{}.example.test", name),
            port: 3001,
            url: format!("http://{}.example.test:3001", name),
            status: web_status::ONLINE.to_string(),
            version: "1.0.0".to_string(),
            cloud_mode: true,
            ssl_enabled: false,
            created_at: Utc::now(),
            last_check_at: None,
        };
        let mut state = self.lock();
        state.web_instances.push(instance.clone());
        state.plan.current_count = state.web_instances.len() as i64;
        instance
    }

    /// Replace the plan returned by `user_plan`
    pub fn set_plan(&self, plan: UserPlan) {
        self.lock().plan = plan;
    }

    /// Replace the response returned by `verify_token`
    pub fn set_verify(&self, verify: VerifyResponse) {
        self.lock().verify = verify;
    }

    /// Replace the history points returned by `server_history`
    pub fn set_history(&self, points: Vec<crate::api::types::MetricsPoint>) {
        self.lock().history = points;
    }

    /// Make every call to `operation` fail with a 500 `Api` error
    pub fn fail_on(&self, operation: &str) {
        self.lock().failing.insert(operation.to_string());
    }

    /// Every call received so far, as `operation` or `operation:argument`
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Number of calls to `operation`, whatever the argument
    pub fn call_count(&self, operation: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.as_str() == operation || c.starts_with(&format!("{}:", operation)))
            .count()
    }

    /// Current server records
    pub fn servers(&self) -> Vec<Server> {
        self.lock().servers.clone()
    }

    /// Current web instance records
    pub fn web_instances(&self) -> Vec<WebInstance> {
        self.lock().web_instances.clone()
    }

    /// Record a call and fail it when configured to
    fn enter(&self, operation: &str, argument: Option<&str>) -> Result<MutexGuard<'_, FakeState>> {
        let mut state = self.lock();
        state.calls.push(match argument {
            Some(arg) => format!("{}:{}", operation, arg),
            None => operation.to_string(),
        });
        if state.failing.contains(operation) {
            return Err(VstatsError::Api {
                status: 500,
                message: format!("injected failure in {}", operation),
            }
            .into());
        }
        Ok(state)
    }

    fn next_id(state: &mut FakeState, prefix: &str) -> String {
        let id = format!("{}-{}", prefix, state.next_id);
        state.next_id += 1;
        id
    }
}

fn not_found(what: &str) -> anyhow::Error {
    VstatsError::Api {
        status: 404,
        message: format!("{} not found", what),
    }
    .into()
}

/// Server record with fixed timestamps and no metrics
pub fn sample_server(id: &str, name: &str, agent_key: &str) -> Server {
    Server {
        id: id.to_string(),
        name: name.to_string(),
        hostname: None,
        ip_address: None,
        agent_key: agent_key.to_string(),
        agent_version: None,
        os_type: None,
        os_version: None,
        status: "pending".to_string(),
        last_seen_at: None,
        created_at: Utc::now(),
        metrics: None,
    }
}

#[async_trait]
impl CloudApi for FakeCloudApi {
    async fn verify_token(&self) -> Result<VerifyResponse> {
        let state = self.enter("verify_token", None)?;
        Ok(state.verify.clone())
    }

    async fn current_user(&self) -> Result<CurrentUser> {
        let state = self.enter("current_user", None)?;
        Ok(CurrentUser {
            user: User {
                id: state.verify.user_id.clone(),
                username: state.verify.username.clone(),
                email: None,
                avatar_url: None,
                plan: state.verify.plan.clone(),
                server_limit: 5,
                status: "active".to_string(),
            },
            server_count: state.servers.len() as i64,
            server_limit: 5,
        })
    }

    async fn list_servers(&self) -> Result<Vec<Server>> {
        let state = self.enter("list_servers", None)?;
        Ok(state.servers.clone())
    }

    async fn create_server(&self, name: &str) -> Result<Server> {
        let mut state = self.enter("create_server", Some(name))?;
        let id = Self::next_id(&mut state, "srv");
        let server = sample_server(&id, name, &format!("key-{}", id));
        state.servers.push(server.clone());
        Ok(server)
    }

    async fn get_server(&self, id: &str) -> Result<Server> {
        let state = self.enter("get_server", Some(id))?;
        state
            .servers
            .iter()
            .find(|s| s.id == id)
            .cloned()
            .ok_or_else(|| not_found("server"))
    }

    async fn update_server(&self, id: &str, name: &str) -> Result<Server> {
        let mut state = self.enter("update_server", Some(id))?;
        let server = state
            .servers
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("server"))?;
        server.name = name.to_string();
        Ok(server.clone())
    }

    async fn delete_server(&self, id: &str) -> Result<()> {
        let mut state = self.enter("delete_server", Some(id))?;
        let before = state.servers.len();
        state.servers.retain(|s| s.id != id);
        if state.servers.len() == before {
            return Err(not_found("server"));
        }
        Ok(())
    }

    async fn regenerate_agent_key(&self, id: &str) -> Result<AgentKey> {
        let mut state = self.enter("regenerate_agent_key", Some(id))?;
        let generation = state.next_id;
        state.next_id += 1;
        let server = state
            .servers
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("server"))?;
        server.agent_key = format!("key-{}-rotated-{}", id, generation);
        Ok(AgentKey {
            agent_key: server.agent_key.clone(),
        })
    }

    async fn install_command(&self, id: &str) -> Result<InstallCommand> {
        let state = self.enter("install_command", Some(id))?;
        let server = state
            .servers
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("server"))?;
        Ok(InstallCommand {
            command: format!(
                "curl -fsSL https://vstats.zsoft.cc/agent.sh | sudo bash -s -- --key {}",
                server.agent_key
            ),
            agent_key: server.agent_key.clone(),
        })
    }

    async fn server_metrics(&self, id: &str) -> Result<MetricsResponse> {
        let state = self.enter("server_metrics", Some(id))?;
        let server = state
            .servers
            .iter()
            .find(|s| s.id == id)
            .ok_or_else(|| not_found("server"))?;
        Ok(MetricsResponse {
            metrics: server.metrics.clone(),
        })
    }

    async fn server_history(
        &self,
        id: &str,
        range: Option<HistoryRange>,
    ) -> Result<MetricsHistory> {
        let state = self.enter("server_history", Some(id))?;
        Ok(MetricsHistory {
            server_id: id.to_string(),
            range: range.unwrap_or(HistoryRange::OneHour).to_string(),
            data: state.history.clone(),
        })
    }

    async fn list_web_instances(&self) -> Result<Vec<WebInstance>> {
        let state = self.enter("list_web_instances", None)?;
        Ok(state.web_instances.clone())
    }

    async fn get_web_instance(&self, id: &str) -> Result<WebInstance> {
        let state = self.enter("get_web_instance", Some(id))?;
        state
            .web_instances
            .iter()
            .find(|w| w.id == id)
            .cloned()
            .ok_or_else(|| not_found("web instance"))
    }

    async fn register_web_instance(
        &self,
        registration: &WebInstanceRegistration,
    ) -> Result<WebInstance> {
        let mut state = self.enter("register_web_instance", Some(&registration.name))?;
        let id = Self::next_id(&mut state, "web");
        let instance = WebInstance {
            id,
            name: registration.name.clone(),
            host: registration.host.clone(),
            port: registration.port,
            url: registration.url.clone(),
            status: registration.status.clone(),
            version: String::new(),
            cloud_mode: registration.cloud_mode,
            ssl_enabled: registration.ssl_enabled,
            created_at: Utc::now(),
            last_check_at: None,
        };
        state.web_instances.push(instance.clone());
        state.plan.current_count = state.web_instances.len() as i64;
        Ok(instance)
    }

    async fn update_web_instance(&self, instance: &WebInstance) -> Result<()> {
        let mut state = self.enter("update_web_instance", Some(&instance.id))?;
        let stored = state
            .web_instances
            .iter_mut()
            .find(|w| w.id == instance.id)
            .ok_or_else(|| not_found("web instance"))?;
        *stored = instance.clone();
        Ok(())
    }

    async fn remove_web_instance(&self, id: &str) -> Result<()> {
        let mut state = self.enter("remove_web_instance", Some(id))?;
        let before = state.web_instances.len();
        state.web_instances.retain(|w| w.id != id);
        if state.web_instances.len() == before {
            return Err(not_found("web instance"));
        }
        state.plan.current_count = state.web_instances.len() as i64;
        Ok(())
    }

    async fn check_web_instance(&self, id: &str) -> Result<WebInstanceHealth> {
        let state = self.enter("check_web_instance", Some(id))?;
        let instance = state
            .web_instances
            .iter()
            .find(|w| w.id == id)
            .ok_or_else(|| not_found("web instance"))?;
        Ok(WebInstanceHealth {
            status: instance.status.clone(),
            response_time: "12ms".to_string(),
            version: instance.version.clone(),
            cloud_connected: true,
            checked_at: Some(Utc::now()),
        })
    }

    async fn user_plan(&self) -> Result<UserPlan> {
        let state = self.enter("user_plan", None)?;
        Ok(state.plan.clone())
    }
}
