//! `ssh agent` workflow
//!
//! Resolves or creates the server record, then runs the public agent
//! installer on the target host. A failed install leaves a freshly created
//! server in place: the record (and its agent key) stays usable for a
//! manual install or a later `--server` retry.

use serde::Serialize;
use shell_words::quote;

use crate::api::{CloudApi, Server};
use crate::config::Session;
use crate::deploy::resolve::find_server_by_name_or_id;
use crate::deploy::ssh::{RemoteShell, SshTarget};
use crate::deploy::AGENT_INSTALLER_URL;
use crate::error::Result;

/// Inputs of an agent deployment
#[derive(Debug, Clone)]
pub struct AgentRequest {
    /// Host to install on
    pub target: SshTarget,
    /// Name for a newly created server; defaults to the host
    pub name: Option<String>,
    /// Existing server (name or id) to attach instead of creating one
    pub server: Option<String>,
}

impl AgentRequest {
    /// Name used when a server is created
    pub fn server_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.target.host.clone())
    }
}

/// Outcome of a successful agent deployment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentDeployment {
    pub server_id: String,
    pub server_name: String,
    pub agent_key: String,
    /// Whether the server record was created by this deployment
    pub created: bool,
}

/// Remote command that installs and registers the agent
///
/// The remote login shell parses this line, so every value is shell-quoted.
/// Server names come from the cloud record and may contain anything.
pub fn agent_install_command(cloud_url: &str, token: &str, server_name: &str) -> String {
    format!(
        "curl -fsSL {} | sudo bash -s -- --server {} --token {} --name {}",
        AGENT_INSTALLER_URL,
        quote(cloud_url),
        quote(token),
        quote(server_name)
    )
}

/// Deploy the monitoring agent to `request.target`
///
/// # Errors
///
/// - [`VstatsError::NotFound`](crate::error::VstatsError::NotFound) when `--server` does not resolve
/// - API errors from server creation
/// - [`VstatsError::Deployment`](crate::error::VstatsError::Deployment) when the remote install fails
pub async fn deploy_agent(
    api: &dyn CloudApi,
    shell: &dyn RemoteShell,
    session: &Session,
    request: &AgentRequest,
) -> Result<AgentDeployment> {
    let server = prepare_agent_server(api, request).await?;
    install_agent(shell, session, request, server).await
}

/// Server record the agent will report to
///
/// Resolves `--server` when given, otherwise creates a new server.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentServer {
    pub server: Server,
    /// Whether the record was created for this deployment
    pub created: bool,
}

/// First step of [`deploy_agent`]: resolve or create the server record
pub async fn prepare_agent_server(
    api: &dyn CloudApi,
    request: &AgentRequest,
) -> Result<AgentServer> {
    match &request.server {
        Some(reference) => Ok(AgentServer {
            server: find_server_by_name_or_id(api, reference).await?,
            created: false,
        }),
        None => {
            let name = request.server_name();
            tracing::info!("Creating server '{}'", name);
            Ok(AgentServer {
                server: api.create_server(&name).await?,
                created: true,
            })
        }
    }
}

/// Second step of [`deploy_agent`]: run the installer on the target host
///
/// Nothing is rolled back when the install fails.
pub async fn install_agent(
    shell: &dyn RemoteShell,
    session: &Session,
    request: &AgentRequest,
    prepared: AgentServer,
) -> Result<AgentDeployment> {
    let AgentServer { server, created } = prepared;
    tracing::info!(
        "Deploying agent for server {} to {}",
        server.id,
        request.target.destination()
    );

    let command = agent_install_command(&session.cloud_url, &session.token, &server.name);
    shell.run(&request.target, &command).await?;

    Ok(AgentDeployment {
        server_id: server.id,
        server_name: server.name,
        agent_key: server.agent_key,
        created,
    })
}
