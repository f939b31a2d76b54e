//! Resource resolution and remote deployment orchestration
//!
//! This module sequences [`CloudApi`](crate::api::CloudApi) calls with an
//! invocation of the system `ssh` client to provision monitoring agents
//! and web dashboards on remote hosts.
//!
//! - `resolve`: name-or-id lookup for servers and web instances
//! - `ssh`: host parsing, argument building and the [`RemoteShell`] seam
//! - `agent`: the `ssh agent` workflow
//! - `web`: the `ssh web` workflow, including its compensating cleanup
//! - `fake`: a recording [`RemoteShell`] for tests (`test-util` feature)

use std::future::Future;

use crate::error::Result;

pub mod agent;
#[cfg(any(test, feature = "test-util"))]
pub mod fake;
pub mod resolve;
pub mod ssh;
pub mod web;

pub use agent::{
    agent_install_command, deploy_agent, install_agent, prepare_agent_server, AgentDeployment,
    AgentRequest, AgentServer,
};
pub use resolve::{find_server_by_name_or_id, find_web_instance_by_name_or_id};
#[cfg(any(test, feature = "test-util"))]
pub use fake::FakeRemoteShell;
pub use ssh::{build_ssh_args, parse_ssh_host, RemoteShell, SshTarget, SystemSsh};
pub use web::{build_web_url, deploy_web, web_install_command, WebDeployment, WebRequest};

/// Login user when neither `user@host` nor `--user` names one
pub const DEFAULT_SSH_USER: &str = "root";

/// Port the web dashboard listens on unless `--web-port` is given
pub const DEFAULT_WEB_PORT: u16 = 3001;

/// Public installer for the monitoring agent
pub const AGENT_INSTALLER_URL: &str = "https://vstats.zsoft.cc/agent.sh";

/// Public installer for the web dashboard
pub const WEB_INSTALLER_URL: &str = "https://vstats.zsoft.cc/install.sh";

/// Run a step whose failure must not change the outcome of the workflow
///
/// The error is logged at `warn` and dropped. Returns the value on success.
///
/// # Examples
///
/// ```
/// use vstats::deploy::best_effort;
///
/// # #[tokio::main]
/// # async fn main() {
/// let ok = best_effort("noop", async { Ok::<_, anyhow::Error>(7) }).await;
/// assert_eq!(ok, Some(7));
///
/// let ignored = best_effort("cleanup", async { Err::<(), _>(anyhow::anyhow!("boom")) }).await;
/// assert!(ignored.is_none());
/// # }
/// ```
pub async fn best_effort<T, F>(label: &str, step: F) -> Option<T>
where
    F: Future<Output = Result<T>>,
{
    match step.await {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!("{} failed (ignored): {:#}", label, e);
            None
        }
    }
}
