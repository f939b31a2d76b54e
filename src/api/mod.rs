//! vStats Cloud API access
//!
//! [`CloudApi`] is the seam between the command handlers / deployment
//! workflows and the REST backend. [`ApiClient`] is the reqwest-backed
//! implementation; `fake::FakeCloudApi`, built for tests and with the
//! `test-util` feature, is an in-memory implementation that records calls.

pub mod client;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod types;

pub use client::ApiClient;
pub use types::{
    web_status, AgentKey, CurrentUser, HistoryRange, InstallCommand, MetricsHistory,
    MetricsPoint, MetricsResponse, Server, ServerMetrics, User, UserPlan, VerifyResponse,
    WebInstance, WebInstanceHealth, WebInstanceRegistration,
};

use async_trait::async_trait;

use crate::error::Result;

/// Typed operations offered by the vStats Cloud
///
/// Every method maps to exactly one HTTP request. Implementations do not
/// retry and do not cache.
#[async_trait]
pub trait CloudApi: Send + Sync {
    /// `GET /api/auth/verify`
    async fn verify_token(&self) -> Result<VerifyResponse>;

    /// `GET /api/auth/me`
    async fn current_user(&self) -> Result<CurrentUser>;

    /// `GET /api/servers`
    async fn list_servers(&self) -> Result<Vec<Server>>;

    /// `POST /api/servers`
    async fn create_server(&self, name: &str) -> Result<Server>;

    /// `GET /api/servers/{id}`
    async fn get_server(&self, id: &str) -> Result<Server>;

    /// `PUT /api/servers/{id}`
    async fn update_server(&self, id: &str, name: &str) -> Result<Server>;

    /// `DELETE /api/servers/{id}`
    async fn delete_server(&self, id: &str) -> Result<()>;

    /// `POST /api/servers/{id}/regenerate-key`
    async fn regenerate_agent_key(&self, id: &str) -> Result<AgentKey>;

    /// `GET /api/servers/{id}/install-command`
    async fn install_command(&self, id: &str) -> Result<InstallCommand>;

    /// `GET /api/servers/{id}/metrics`
    async fn server_metrics(&self, id: &str) -> Result<MetricsResponse>;

    /// `GET /api/servers/{id}/history[?range=..]`
    async fn server_history(&self, id: &str, range: Option<HistoryRange>)
        -> Result<MetricsHistory>;

    /// `GET /api/web/instances`
    async fn list_web_instances(&self) -> Result<Vec<WebInstance>>;

    /// `GET /api/web/instances/{id}`
    async fn get_web_instance(&self, id: &str) -> Result<WebInstance>;

    /// `POST /api/web/instances`
    async fn register_web_instance(
        &self,
        registration: &WebInstanceRegistration,
    ) -> Result<WebInstance>;

    /// `PUT /api/web/instances/{id}`
    async fn update_web_instance(&self, instance: &WebInstance) -> Result<()>;

    /// `DELETE /api/web/instances/{id}`
    async fn remove_web_instance(&self, id: &str) -> Result<()>;

    /// `GET /api/web/instances/{id}/check`
    async fn check_web_instance(&self, id: &str) -> Result<WebInstanceHealth>;

    /// `GET /api/user/plan`
    async fn user_plan(&self) -> Result<UserPlan>;
}
