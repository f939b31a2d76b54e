//! `ssh web` workflow
//!
//! The dashboard is registered in the cloud before anything touches the
//! remote host, so a failed install must undo the registration. The
//! instance moves `pending -> online` on success and is removed on failure;
//! every other status change is reported by the cloud's own health checks.

use serde::Serialize;
use shell_words::quote;

use crate::api::{web_status, CloudApi, WebInstance, WebInstanceRegistration};
use crate::config::Session;
use crate::deploy::ssh::{RemoteShell, SshTarget};
use crate::deploy::{best_effort, WEB_INSTALLER_URL};
use crate::error::{Result, VstatsError};

/// Inputs of a web dashboard deployment
#[derive(Debug, Clone)]
pub struct WebRequest {
    /// Host to install on
    pub target: SshTarget,
    /// Dashboard name; defaults to `web-<host>`
    pub name: Option<String>,
    /// Port the dashboard listens on
    pub port: u16,
    /// Public domain, if any
    pub domain: Option<String>,
    /// Serve over TLS
    pub ssl: bool,
}

impl WebRequest {
    /// Name the instance is registered under
    pub fn instance_name(&self) -> String {
        self.name
            .clone()
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("web-{}", self.target.host))
    }

    fn domain(&self) -> &str {
        self.domain.as_deref().unwrap_or("")
    }

    /// Public URL recorded with the registration
    pub fn url(&self) -> String {
        build_web_url(&self.target.host, self.port, self.domain(), self.ssl)
    }
}

/// Outcome of a successful web deployment
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebDeployment {
    /// Instance as last pushed to the cloud
    pub instance: WebInstance,
    /// Whether the final `online` status update reached the cloud
    pub status_synced: bool,
}

/// Displayable dashboard URL
///
/// With a domain, the port is dropped only when it is the scheme's default.
/// Without one, ports 80 and 443 are dropped whatever the scheme.
///
/// # Examples
///
/// ```
/// use vstats::deploy::build_web_url;
///
/// assert_eq!(build_web_url("h", 443, "", true), "https://h");
/// assert_eq!(build_web_url("h", 8080, "", true), "https://h:8080");
/// assert_eq!(build_web_url("h", 80, "d.example.com", false), "http://d.example.com");
/// assert_eq!(build_web_url("h", 3001, "d.example.com", true), "https://d.example.com:3001");
/// ```
pub fn build_web_url(host: &str, port: u16, domain: &str, ssl: bool) -> String {
    let scheme = if ssl { "https" } else { "http" };

    if !domain.is_empty() {
        let default_port = if ssl { 443 } else { 80 };
        if port == default_port {
            return format!("{}://{}", scheme, domain);
        }
        return format!("{}://{}:{}", scheme, domain, port);
    }

    if port == 80 || port == 443 {
        return format!("{}://{}", scheme, host);
    }
    format!("{}://{}:{}", scheme, host, port)
}

/// Remote command that installs the dashboard in cloud mode
///
/// SSL flags are only passed when a domain is also set. Values are
/// shell-quoted for the remote login shell.
pub fn web_install_command(
    cloud_url: &str,
    token: &str,
    port: u16,
    domain: &str,
    ssl: bool,
) -> String {
    let mut command = format!(
        "curl -fsSL {} | sudo bash -s -- --cloud-mode --cloud-url {} --cloud-token {} --port {}",
        WEB_INSTALLER_URL,
        quote(cloud_url),
        quote(token),
        port
    );
    if ssl && !domain.is_empty() {
        command.push_str(&format!(" --ssl --domain {}", quote(domain)));
    }
    command
}

/// Fail with [`VstatsError::QuotaExceeded`] when the plan is full
///
/// The instance count is the larger of the plan's own counter and the
/// listing, so a stale counter cannot let an extra instance through.
async fn check_quota(api: &dyn CloudApi) -> Result<()> {
    let plan = api.user_plan().await?;
    let instances = api.list_web_instances().await?;
    let current = plan.current_count.max(instances.len() as i64);
    tracing::debug!(
        "Plan '{}': {} of {} web instances (pro: {})",
        plan.plan,
        current,
        plan.max_web_apps,
        plan.is_pro
    );

    let mut effective = plan.clone();
    effective.current_count = current;
    if !effective.allows_another_web_instance() {
        return Err(VstatsError::QuotaExceeded {
            plan: plan.plan,
            current,
            max: plan.max_web_apps,
        }
        .into());
    }
    Ok(())
}

/// Deploy a web dashboard to `request.target`
///
/// Steps: quota pre-flight, registration (`pending`), remote install, then
/// either the `online` update or removal of the registration.
///
/// # Errors
///
/// - [`VstatsError::QuotaExceeded`] before anything is created
/// - API errors from the plan check or registration
/// - [`VstatsError::Deployment`] when the remote install fails; cleanup
///   errors are logged, never returned
pub async fn deploy_web(
    api: &dyn CloudApi,
    shell: &dyn RemoteShell,
    session: &Session,
    request: &WebRequest,
) -> Result<WebDeployment> {
    check_quota(api).await?;

    let registration = WebInstanceRegistration {
        name: request.instance_name(),
        host: request.target.host.clone(),
        port: request.port,
        url: request.url(),
        status: web_status::PENDING.to_string(),
        cloud_mode: true,
        ssl_enabled: request.ssl,
    };
    let mut instance = api.register_web_instance(&registration).await?;
    tracing::info!("Registered web instance {} ({})", instance.id, instance.name);

    let command = web_install_command(
        &session.cloud_url,
        &session.token,
        request.port,
        request.domain(),
        request.ssl,
    );

    if let Err(e) = shell.run(&request.target, &command).await {
        best_effort(
            "removing web instance after failed install",
            api.remove_web_instance(&instance.id),
        )
        .await;
        return Err(e);
    }

    instance.status = web_status::ONLINE.to_string();
    let status_synced = best_effort(
        "updating web instance status",
        api.update_web_instance(&instance),
    )
    .await
    .is_some();

    Ok(WebDeployment {
        instance,
        status_synced,
    })
}
