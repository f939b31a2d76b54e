//! HTTP client for the vStats Cloud REST API
//!
//! [`ApiClient`] owns request construction (method, path, headers, bearer
//! token), response decoding and error classification. Failures come back
//! as one of three `VstatsError` kinds:
//!
//! - `Transport` when no HTTP response was obtained
//! - `Api` when the cloud answered with a status >= 400
//! - `Decode` when a success body does not match the expected type

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::api::types::{
    AgentKey, CurrentUser, HistoryRange, InstallCommand, MetricsHistory, MetricsResponse, Server,
    UserPlan, VerifyResponse, WebInstance, WebInstanceHealth, WebInstanceRegistration,
};
use crate::api::CloudApi;
use crate::config::Session;
use crate::error::{Result, VstatsError};

/// Upper bound for a single request, connection included
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `User-Agent` sent with every request
pub const USER_AGENT: &str = concat!("vstats-cli/", env!("CARGO_PKG_VERSION"));

/// Error payload the cloud returns alongside 4xx/5xx statuses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Name payload used by server create and update
#[derive(Debug, Serialize)]
struct NameBody<'a> {
    name: &'a str,
}

/// vStats Cloud REST client
///
/// Stateless apart from the base URL and optional token supplied at
/// construction.
///
/// # Examples
///
/// ```no_run
/// use vstats::api::{ApiClient, CloudApi};
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = ApiClient::new("https://api.vstats.zsoft.cc", Some("token".to_string()))?;
/// let servers = client.list_servers().await?;
/// println!("{} servers", servers.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client for `base_url`, authenticating with `token` when set
    ///
    /// # Errors
    ///
    /// Returns `VstatsError::Config` if `base_url` is not a usable URL and
    /// `VstatsError::Transport` if the HTTP client cannot be built
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self> {
        let base_url = Url::parse(base_url).map_err(|e| {
            VstatsError::Config(format!("Invalid cloud_url '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(VstatsError::Config(format!(
                "Invalid cloud_url '{}': not a base URL",
                base_url
            ))
            .into());
        }

        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| VstatsError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    /// Create an authenticated client from the current session
    pub fn from_session(session: &Session) -> Result<Self> {
        Self::new(&session.cloud_url, Some(session.token.clone()))
    }

    /// Base URL the client talks to
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build an endpoint URL from path segments
    ///
    /// Segments are percent-encoded, so identifiers containing spaces or
    /// slashes stay within a single segment.
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| VstatsError::Config(format!("Invalid cloud_url '{}'", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Perform a request and return the raw success body
    ///
    /// # Errors
    ///
    /// `Transport` when the request cannot be completed, `Api` when the
    /// status is >= 400
    async fn send<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<Vec<u8>> {
        tracing::debug!("{} {}", method, url.path());

        let mut req = self
            .http
            .request(method, url)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::ACCEPT, "application/json");

        if let Some(token) = &self.token {
            req = req.bearer_auth(token);
        }

        if let Some(body) = body {
            req = req.body(serde_json::to_vec(body).map_err(VstatsError::Serialization)?);
        }

        let response = req
            .send()
            .await
            .map_err(|e| VstatsError::Transport(e.to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| VstatsError::Transport(format!("failed to read response: {}", e)))?;

        if status.as_u16() >= 400 {
            return Err(classify_error(status, &bytes).into());
        }

        Ok(bytes.to_vec())
    }

    /// Perform a request and decode the success body into `T`
    async fn request<B: Serialize + Sync + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<T> {
        let bytes = self.send(method, url, body).await?;
        serde_json::from_slice(&bytes).map_err(|e| VstatsError::Decode(e.to_string()).into())
    }

    /// Perform a request whose success body is ignored
    async fn request_empty<B: Serialize + Sync + ?Sized>(
        &self,
        method: Method,
        url: Url,
        body: Option<&B>,
    ) -> Result<()> {
        self.send(method, url, body).await.map(|_| ())
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        self.request::<(), T>(Method::GET, url, None).await
    }
}

/// Map an error status and body to `VstatsError::Api`
fn classify_error(status: reqwest::StatusCode, body: &[u8]) -> VstatsError {
    if let Ok(parsed) = serde_json::from_slice::<ErrorBody>(body) {
        if let Some(error) = parsed.error.filter(|e| !e.is_empty()) {
            let message = match parsed.message.filter(|m| !m.is_empty() && *m != error) {
                Some(detail) => format!("{}: {}", error, detail),
                None => error,
            };
            return VstatsError::Api {
                status: status.as_u16(),
                message,
            };
        }
        if let Some(message) = parsed.message.filter(|m| !m.is_empty()) {
            return VstatsError::Api {
                status: status.as_u16(),
                message,
            };
        }
    }

    let text = String::from_utf8_lossy(body).trim().to_string();
    let message = if text.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("empty response body")
            .to_string()
    } else {
        text
    };
    VstatsError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl CloudApi for ApiClient {
    async fn verify_token(&self) -> Result<VerifyResponse> {
        self.get(&["api", "auth", "verify"]).await
    }

    async fn current_user(&self) -> Result<CurrentUser> {
        self.get(&["api", "auth", "me"]).await
    }

    async fn list_servers(&self) -> Result<Vec<Server>> {
        self.get(&["api", "servers"]).await
    }

    async fn create_server(&self, name: &str) -> Result<Server> {
        let url = self.endpoint(&["api", "servers"])?;
        self.request(Method::POST, url, Some(&NameBody { name }))
            .await
    }

    async fn get_server(&self, id: &str) -> Result<Server> {
        self.get(&["api", "servers", id]).await
    }

    async fn update_server(&self, id: &str, name: &str) -> Result<Server> {
        let url = self.endpoint(&["api", "servers", id])?;
        self.request(Method::PUT, url, Some(&NameBody { name }))
            .await
    }

    async fn delete_server(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["api", "servers", id])?;
        self.request_empty::<()>(Method::DELETE, url, None).await
    }

    async fn regenerate_agent_key(&self, id: &str) -> Result<AgentKey> {
        let url = self.endpoint(&["api", "servers", id, "regenerate-key"])?;
        self.request::<(), _>(Method::POST, url, None).await
    }

    async fn install_command(&self, id: &str) -> Result<InstallCommand> {
        self.get(&["api", "servers", id, "install-command"]).await
    }

    async fn server_metrics(&self, id: &str) -> Result<MetricsResponse> {
        self.get(&["api", "servers", id, "metrics"]).await
    }

    async fn server_history(
        &self,
        id: &str,
        range: Option<HistoryRange>,
    ) -> Result<MetricsHistory> {
        let mut url = self.endpoint(&["api", "servers", id, "history"])?;
        if let Some(range) = range {
            url.query_pairs_mut().append_pair("range", range.as_str());
        }
        self.request::<(), _>(Method::GET, url, None).await
    }

    async fn list_web_instances(&self) -> Result<Vec<WebInstance>> {
        self.get(&["api", "web", "instances"]).await
    }

    async fn get_web_instance(&self, id: &str) -> Result<WebInstance> {
        self.get(&["api", "web", "instances", id]).await
    }

    async fn register_web_instance(
        &self,
        registration: &WebInstanceRegistration,
    ) -> Result<WebInstance> {
        let url = self.endpoint(&["api", "web", "instances"])?;
        self.request(Method::POST, url, Some(registration)).await
    }

    async fn update_web_instance(&self, instance: &WebInstance) -> Result<()> {
        let url = self.endpoint(&["api", "web", "instances", &instance.id])?;
        self.request_empty(Method::PUT, url, Some(instance)).await
    }

    async fn remove_web_instance(&self, id: &str) -> Result<()> {
        let url = self.endpoint(&["api", "web", "instances", id])?;
        self.request_empty::<()>(Method::DELETE, url, None).await
    }

    async fn check_web_instance(&self, id: &str) -> Result<WebInstanceHealth> {
        self.get(&["api", "web", "instances", id, "check"]).await
    }

    async fn user_plan(&self) -> Result<UserPlan> {
        self.get(&["api", "user", "plan"]).await
    }
}
