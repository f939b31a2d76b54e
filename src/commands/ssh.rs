//! Remote deployment commands
//!
//! Thin front end over [`crate::deploy`]: builds the request from the
//! parsed flags, prints progress around the workflow and renders the
//! outcome. Progress lines are only printed for table output so that
//! `-o json` stays machine-readable.

use colored::Colorize;

use crate::cli::{SshArgs, SshCommand};
use crate::commands::connect;
use crate::config::Config;
use crate::deploy::{
    deploy_web, install_agent, prepare_agent_server, AgentDeployment, AgentRequest, AgentServer,
    SshTarget, SystemSsh, WebDeployment, WebRequest,
};
use crate::error::{kind_of, Result, VstatsError};
use crate::output::{format_limit, print_banner, print_details, Renderer, TableView};

/// Where to buy more web instances
pub const PRICING_URL: &str = "https://vstats.zsoft.cc/pricing";

fn target(host: &str, ssh: &SshArgs) -> SshTarget {
    SshTarget::new(host, ssh.user.as_deref(), ssh.port, ssh.key.as_deref())
}

/// Dispatch a `vstats ssh` subcommand
pub async fn run_ssh(config: &Config, renderer: &Renderer, command: SshCommand) -> Result<()> {
    let (session, client) = connect(config)?;
    let shell = SystemSsh::locate()?;
    let verbose = renderer.is_table();

    match command {
        SshCommand::Agent {
            host,
            ssh,
            name,
            server,
        } => {
            let request = AgentRequest {
                target: target(&host, &ssh),
                name,
                server,
            };
            if verbose && request.server.is_none() {
                println!("Creating server '{}'...", request.server_name());
            }
            let prepared = prepare_agent_server(&client, &request).await?;
            if verbose {
                if let Some(notice) = existing_server_notice(&prepared) {
                    println!("{}", notice);
                }
                println!();
                println!("Connecting to {}...", host);
                println!("Deploying vStats agent...");
                println!();
            }

            let deployment = install_agent(&shell, &session, &request, prepared).await?;
            renderer.render(&deployment)
        }
        SshCommand::Web {
            host,
            ssh,
            name,
            web_port,
            domain,
            ssl,
        } => {
            let request = WebRequest {
                target: target(&host, &ssh),
                name,
                port: web_port,
                domain,
                ssl,
            };
            if verbose {
                println!("Deploying web dashboard '{}'...", request.instance_name());
                let mut rows = vec![("Host", host.clone()), ("Port", request.port.to_string())];
                if let Some(domain) = &request.domain {
                    rows.push(("Domain", domain.clone()));
                }
                if request.ssl {
                    rows.push(("SSL", "enabled".to_string()));
                }
                print_details(&rows);
                println!();
            }

            let deployment = match deploy_web(&client, &shell, &session, &request).await {
                Ok(d) => d,
                Err(e) => {
                    if let Some(VstatsError::QuotaExceeded { plan, current, max }) = kind_of(&e) {
                        if verbose {
                            print_limit_reached(plan, *current, *max);
                        }
                    }
                    return Err(e);
                }
            };
            renderer.render(&deployment)
        }
    }
}

/// Progress line naming an existing server, once it has been resolved
fn existing_server_notice(prepared: &AgentServer) -> Option<String> {
    if prepared.created {
        None
    } else {
        Some(format!("Using existing server: {}", prepared.server.name))
    }
}

fn print_limit_reached(plan: &str, current: i64, max: i64) {
    print_banner("Web Instance Limit Reached");
    println!();
    print_details(&[
        ("Your plan", plan.to_string()),
        ("Web instances", format!("{} / {}", current, format_limit(max))),
    ]);
    println!();
    println!("  Upgrade to Pro for unlimited web instances:");
    println!("    {}", PRICING_URL.cyan());
    println!();
}

impl TableView for AgentDeployment {
    fn print_table(&self) {
        println!();
        print_banner("Agent Deployed Successfully!");
        println!();
        print_details(&[
            ("Server ID", self.server_id.clone()),
            ("Agent Key", self.agent_key.clone()),
        ]);
        println!();
        println!("  View metrics:");
        println!(
            "    {}",
            format!("vstats server metrics {}", self.server_name).cyan()
        );
        println!();
    }
}

impl TableView for WebDeployment {
    fn print_table(&self) {
        println!();
        print_banner("Web Dashboard Deployed Successfully!");
        println!();
        print_details(&[
            ("Name", self.instance.name.clone()),
            ("Instance ID", self.instance.id.clone()),
            ("URL", self.instance.url.clone()),
        ]);
        println!();
        println!("  The dashboard is connected to vStats Cloud");
        println!("  and will display all your monitored servers.");
        if !self.status_synced {
            println!();
            println!(
                "  {}",
                "Note: the instance status could not be updated in the cloud yet.".yellow()
            );
        }
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeCloudApi;

    fn request_for(server: &str) -> AgentRequest {
        AgentRequest {
            target: SshTarget::new("box", None, None, None),
            name: None,
            server: Some(server.to_string()),
        }
    }

    #[tokio::test]
    async fn test_existing_server_notice_uses_resolved_name() {
        let cloud = FakeCloudApi::new();
        cloud.add_server("srv-9", "prod-01");

        let prepared = prepare_agent_server(&cloud, &request_for("srv-9"))
            .await
            .unwrap();
        assert_eq!(
            existing_server_notice(&prepared).as_deref(),
            Some("Using existing server: prod-01")
        );
    }

    #[tokio::test]
    async fn test_unresolved_server_yields_no_notice() {
        let cloud = FakeCloudApi::new();

        let err = prepare_agent_server(&cloud, &request_for("ghost"))
            .await
            .unwrap_err();
        assert!(matches!(kind_of(&err), Some(VstatsError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_created_server_has_no_existing_notice() {
        let cloud = FakeCloudApi::new();
        let mut request = request_for("unused");
        request.server = None;

        let prepared = prepare_agent_server(&cloud, &request).await.unwrap();
        assert!(prepared.created);
        assert_eq!(existing_server_notice(&prepared), None);
    }

    #[test]
    fn test_target_from_flags() {
        let args = SshArgs {
            user: Some("deploy".to_string()),
            port: Some(2222),
            key: None,
        };
        let target = target("admin@box", &args);
        assert_eq!(target.destination(), "deploy@box");
        assert_eq!(target.port, Some(2222));
        assert_eq!(target.identity_file, None);
    }
}
