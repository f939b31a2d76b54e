//! Web dashboard instance commands

use colored::Colorize;
use serde::Serialize;

use crate::api::{CloudApi, UserPlan, WebInstance, WebInstanceHealth};
use crate::cli::WebCommand;
use crate::commands::{confirm, connect, print_success};
use crate::config::Config;
use crate::deploy::{find_web_instance_by_name_or_id, WEB_INSTALLER_URL};
use crate::error::Result;
use crate::output::{
    format_connected, format_limit, format_status, format_time, new_table, print_details,
    Renderer, TableView,
};

/// Dispatch a `vstats web` subcommand
pub async fn run_web(config: &Config, renderer: &Renderer, command: WebCommand) -> Result<()> {
    let (_, client) = connect(config)?;
    let api: &dyn CloudApi = &client;

    match command {
        WebCommand::List => {
            let instances = api.list_web_instances().await?;
            renderer.render(instances.as_slice())
        }
        WebCommand::Status => {
            let status = web_status(api).await?;
            renderer.render(&status)
        }
        WebCommand::Check { instance } => {
            let instance = find_web_instance_by_name_or_id(api, &instance).await?;
            if renderer.is_table() {
                println!("Checking web instance '{}'...", instance.name);
                println!();
            }
            let report = check_instance(api, instance).await;
            renderer.render(&report)
        }
        WebCommand::Remove { instance, force } => {
            let instance = find_web_instance_by_name_or_id(api, &instance).await?;
            let prompt = format!(
                "Are you sure you want to remove web instance '{}'?",
                instance.name
            );
            if !confirm(&prompt, force)? {
                return Ok(());
            }
            api.remove_web_instance(&instance.id).await?;
            print_success(&format!("Web instance '{}' removed", instance.name));
            println!();
            println!("To uninstall from the server, SSH in and run:");
            println!(
                "  {}",
                format!("curl -fsSL {} | sudo bash -s -- --uninstall", WEB_INSTALLER_URL).cyan()
            );
            Ok(())
        }
    }
}

/// Plan limits together with the deployed instances
#[derive(Debug, Clone, Serialize)]
pub struct WebStatus {
    pub plan: UserPlan,
    pub instances: Vec<WebInstance>,
}

/// Fetch the plan and the instance listing
pub async fn web_status(api: &dyn CloudApi) -> Result<WebStatus> {
    let plan = api.user_plan().await?;
    let instances = api.list_web_instances().await?;
    Ok(WebStatus { plan, instances })
}

/// Result of `web check`
///
/// A failed health check is part of the report, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub instance: WebInstance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health: Option<WebInstanceHealth>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Run the cloud-side health check for `instance`
pub async fn check_instance(api: &dyn CloudApi, instance: WebInstance) -> HealthReport {
    match api.check_web_instance(&instance.id).await {
        Ok(health) => HealthReport {
            instance,
            health: Some(health),
            error: None,
        },
        Err(e) => {
            tracing::debug!("Health check for {} failed: {:#}", instance.id, e);
            HealthReport {
                instance,
                health: None,
                error: Some(format!("{:#}", e)),
            }
        }
    }
}

impl TableView for [WebInstance] {
    fn print_table(&self) {
        if self.is_empty() {
            println!("No web instances found.");
            println!("Use 'vstats ssh web <host>' to deploy a web dashboard.");
            return;
        }

        let mut table = new_table(&["NAME", "HOST", "PORT", "STATUS", "URL", "CREATED"]);
        for instance in self {
            table.add_row(prettytable::row![
                instance.name,
                instance.host,
                instance.port,
                format_status(&instance.status),
                instance.url,
                format_time(Some(&instance.created_at))
            ]);
        }
        table.printstd();
    }
}

impl TableView for WebStatus {
    fn print_table(&self) {
        println!("{}", "Web Dashboard Status".bold());
        println!("====================");
        println!();
        print_details(&[
            ("Plan", self.plan.plan.clone()),
            (
                "Web Instances",
                format!(
                    "{} / {}",
                    self.plan.current_count,
                    format_limit(self.plan.max_web_apps)
                ),
            ),
        ]);
        println!();

        if self.instances.is_empty() {
            println!("No web instances deployed yet.");
            println!("Deploy with: vstats ssh web <host>");
        } else {
            println!("Deployed Instances:");
            for w in &self.instances {
                println!("  • {} ({}) - {}", w.name, w.url, format_status(&w.status));
            }
        }

        if !self.plan.is_pro {
            println!();
            println!("{}", "━".repeat(40));
            println!("Upgrade to Pro for unlimited web instances!");
            println!("  {}", crate::commands::ssh::PRICING_URL.cyan());
            println!("{}", "━".repeat(40));
        }
    }
}

impl TableView for HealthReport {
    fn print_table(&self) {
        match (&self.health, &self.error) {
            (Some(health), _) => print_details(&[
                ("Status", format_status(&health.status).to_string()),
                ("URL", self.instance.url.clone()),
                ("Response", health.response_time.clone()),
                ("Version", health.version.clone()),
                ("Cloud Sync", format_connected(health.cloud_connected).to_string()),
                ("Last Check", format_time(health.checked_at.as_ref())),
            ]),
            (None, Some(error)) => {
                println!("{} Health check failed: {}", "✗".red(), error);
            }
            (None, None) => println!("{} Health check returned no result", "✗".red()),
        }
    }
}
