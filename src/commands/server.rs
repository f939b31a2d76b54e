//! Server management commands

use colored::Colorize;
use serde::Serialize;

use crate::api::{CloudApi, HistoryRange, InstallCommand, MetricsHistory, Server, ServerMetrics};
use crate::cli::ServerCommand;
use crate::commands::{confirm, connect, print_success};
use crate::config::Config;
use crate::deploy::find_server_by_name_or_id;
use crate::error::{Result, VstatsError};
use crate::output::{
    format_percent, format_short_time, format_status, format_time, format_time_ago, new_table,
    opt_bytes, opt_float, opt_int, opt_percent, opt_str, print_details, Renderer, TableView,
};

/// Dispatch a `vstats server` subcommand
pub async fn run_server(
    config: &Config,
    renderer: &Renderer,
    command: ServerCommand,
) -> Result<()> {
    let (_, client) = connect(config)?;
    let api: &dyn CloudApi = &client;

    match command {
        ServerCommand::List => {
            let servers = api.list_servers().await?;
            renderer.render(servers.as_slice())
        }
        ServerCommand::Create { name } => {
            tracing::info!("Creating server '{}'", name);
            let server = api.create_server(&name).await?;
            if renderer.is_table() {
                print_success(&format!("Server '{}' created successfully!", server.name));
                println!();
                print_details(&[
                    ("ID", server.id.clone()),
                    ("Agent Key", server.agent_key.clone()),
                ]);
                println!();
                println!("To install the agent, run:");
                println!("  {}", format!("vstats server install {}", server.id).cyan());
                Ok(())
            } else {
                renderer.render(&server)
            }
        }
        ServerCommand::Show { server } => {
            let server = find_server_by_name_or_id(api, &server).await?;
            renderer.render(&server)
        }
        ServerCommand::Update { server, name } => {
            let updated = rename_server(api, &server, name.as_deref()).await?;
            if renderer.is_table() {
                print_success(&format!("Server updated: {}", updated.name));
                Ok(())
            } else {
                renderer.render(&updated)
            }
        }
        ServerCommand::Delete { server, force } => {
            let server = find_server_by_name_or_id(api, &server).await?;
            let prompt = format!("Are you sure you want to delete server '{}'?", server.name);
            if !confirm(&prompt, force)? {
                return Ok(());
            }
            api.delete_server(&server.id).await?;
            print_success(&format!("Server '{}' deleted", server.name));
            Ok(())
        }
        ServerCommand::Metrics { server } => {
            let report = server_metrics(api, &server).await?;
            renderer.render(&report)
        }
        ServerCommand::History { server, range } => {
            let report = server_history(api, &server, range).await?;
            renderer.render(&report)
        }
        ServerCommand::Install { server } => {
            let server = find_server_by_name_or_id(api, &server).await?;
            let install = api.install_command(&server.id).await?;
            renderer.render(&InstallReport {
                server_name: server.name,
                install,
            })
        }
        ServerCommand::Key { server, regenerate } => {
            let report = if regenerate {
                rotate_agent_key(api, &server).await?
            } else {
                let server = find_server_by_name_or_id(api, &server).await?;
                AgentKeyReport {
                    server_id: server.id,
                    server_name: server.name,
                    agent_key: server.agent_key,
                    regenerated: false,
                }
            };
            renderer.render(&report)
        }
    }
}

/// Rename a server after resolving the reference
///
/// # Errors
///
/// Returns `VstatsError::Config` when no new name is given, before any
/// request is made
pub async fn rename_server(
    api: &dyn CloudApi,
    reference: &str,
    name: Option<&str>,
) -> Result<Server> {
    let name = match name {
        Some(n) if !n.is_empty() => n,
        _ => {
            return Err(VstatsError::Config(
                "no changes specified. Use --name to update the server name".to_string(),
            )
            .into())
        }
    };
    let server = find_server_by_name_or_id(api, reference).await?;
    api.update_server(&server.id, name).await
}

/// Latest metrics of one server
#[derive(Debug, Clone, Serialize)]
pub struct MetricsReport {
    pub server_id: String,
    pub server_name: String,
    pub metrics: Option<ServerMetrics>,
}

/// Resolve `reference` and fetch its latest metrics
pub async fn server_metrics(api: &dyn CloudApi, reference: &str) -> Result<MetricsReport> {
    let server = find_server_by_name_or_id(api, reference).await?;
    let response = api.server_metrics(&server.id).await?;
    Ok(MetricsReport {
        server_id: server.id,
        server_name: server.name,
        metrics: response.metrics,
    })
}

/// History of one server over a range
#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    pub server_name: String,
    #[serde(flatten)]
    pub history: MetricsHistory,
}

/// Resolve `reference` and fetch its history over `range`
pub async fn server_history(
    api: &dyn CloudApi,
    reference: &str,
    range: HistoryRange,
) -> Result<HistoryReport> {
    let server = find_server_by_name_or_id(api, reference).await?;
    let history = api.server_history(&server.id, Some(range)).await?;
    Ok(HistoryReport {
        server_name: server.name,
        history,
    })
}

/// Agent installation instructions for one server
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub server_name: String,
    #[serde(flatten)]
    pub install: InstallCommand,
}

/// Agent key of one server
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AgentKeyReport {
    pub server_id: String,
    pub server_name: String,
    pub agent_key: String,
    /// Whether the key was just regenerated
    pub regenerated: bool,
}

/// Resolve `reference` and issue it a new agent key
///
/// The returned report carries the key from the regenerate response; the
/// previous key is invalid from then on.
pub async fn rotate_agent_key(api: &dyn CloudApi, reference: &str) -> Result<AgentKeyReport> {
    let server = find_server_by_name_or_id(api, reference).await?;
    let key = api.regenerate_agent_key(&server.id).await?;
    tracing::info!("Regenerated agent key for server {}", server.id);
    Ok(AgentKeyReport {
        server_id: server.id,
        server_name: server.name,
        agent_key: key.agent_key,
        regenerated: true,
    })
}

impl TableView for [Server] {
    fn print_table(&self) {
        if self.is_empty() {
            println!("No servers found.");
            println!("Use 'vstats server create <name>' to add a server.");
            return;
        }

        let mut table = new_table(&["NAME", "STATUS", "CPU", "MEM", "IP", "LAST SEEN"]);
        for server in self {
            let metrics = server.metrics.as_ref();
            let cpu = opt_percent(metrics.and_then(|m| m.cpu_usage));
            let mem = opt_percent(metrics.and_then(ServerMetrics::memory_percent));
            table.add_row(prettytable::row![
                server.name,
                format_status(&server.status),
                cpu,
                mem,
                opt_str(server.ip_address.as_deref()),
                format_time_ago(server.last_seen_at.as_ref())
            ]);
        }
        table.printstd();
    }
}

impl TableView for Server {
    fn print_table(&self) {
        println!("{}", "Server Details".bold());
        println!("==============");
        print_details(&[
            ("ID", self.id.clone()),
            ("Name", self.name.clone()),
            ("Status", format_status(&self.status).to_string()),
            ("Hostname", opt_str(self.hostname.as_deref())),
            ("IP Address", opt_str(self.ip_address.as_deref())),
            (
                "OS",
                format!(
                    "{} {}",
                    opt_str(self.os_type.as_deref()),
                    opt_str(self.os_version.as_deref())
                ),
            ),
            ("Agent Version", opt_str(self.agent_version.as_deref())),
            ("Last Seen", format_time(self.last_seen_at.as_ref())),
            ("Created", format_time(Some(&self.created_at))),
        ]);

        if let Some(m) = &self.metrics {
            println!();
            println!("{}", "Current Metrics".bold());
            println!("---------------");
            print_details(&[
                ("CPU Usage", opt_percent(m.cpu_usage)),
                ("Load Average", load_average(m)),
                (
                    "Memory",
                    format!("{} / {}", opt_bytes(m.memory_used), opt_bytes(m.memory_total)),
                ),
                (
                    "Disk",
                    format!("{} / {}", opt_bytes(m.disk_used), opt_bytes(m.disk_total)),
                ),
                ("Processes", opt_int(m.process_count)),
            ]);
        }
    }
}

fn load_average(m: &ServerMetrics) -> String {
    format!(
        "{} / {} / {}",
        opt_float(m.load_avg_1),
        opt_float(m.load_avg_5),
        opt_float(m.load_avg_15)
    )
}

impl TableView for MetricsReport {
    fn print_table(&self) {
        let Some(m) = &self.metrics else {
            println!("No metrics available for this server.");
            return;
        };

        println!("{}", format!("Metrics for {}", self.server_name).bold());
        println!("{}", "=".repeat(40));
        println!();
        println!("CPU");
        print_details(&[
            ("Usage", opt_percent(m.cpu_usage)),
            ("Cores", opt_int(m.cpu_cores)),
            ("Load Avg", load_average(m)),
        ]);
        println!();
        println!("Memory");
        print_details(&[
            ("Total", opt_bytes(m.memory_total)),
            ("Used", opt_bytes(m.memory_used)),
            ("Free", opt_bytes(m.memory_free)),
            ("Usage", m.memory_percent().map(format_percent).unwrap_or_else(|| "-".into())),
        ]);
        println!();
        println!("Disk");
        print_details(&[
            ("Total", opt_bytes(m.disk_total)),
            ("Used", opt_bytes(m.disk_used)),
            ("Free", opt_bytes(m.disk_free)),
        ]);
        println!();
        println!("Processes");
        print_details(&[("Count", opt_int(m.process_count))]);
    }
}

impl TableView for HistoryReport {
    fn print_table(&self) {
        println!(
            "{}",
            format!(
                "Metrics History for {} (range: {})",
                self.server_name, self.history.range
            )
            .bold()
        );
        println!("{}", "=".repeat(50));

        if self.history.data.is_empty() {
            println!("No historical data available.");
            return;
        }

        let mut table = new_table(&["TIME", "CPU", "MEM USED", "DISK USED"]);
        for point in &self.history.data {
            table.add_row(prettytable::row![
                format_short_time(&point.collected_at),
                opt_percent(point.cpu_usage),
                opt_bytes(point.memory_used),
                opt_bytes(point.disk_used)
            ]);
        }
        table.printstd();
    }
}

impl TableView for InstallReport {
    fn print_table(&self) {
        println!(
            "{}",
            format!("Agent Installation for '{}'", self.server_name).bold()
        );
        println!("{}", "=".repeat(50));
        println!();
        println!("Run this command on your server:");
        println!();
        println!("  {}", self.install.command.cyan());
        println!();
        println!("Agent Key: {}", self.install.agent_key);
    }
}

impl TableView for AgentKeyReport {
    fn print_table(&self) {
        if self.regenerated {
            print_success(&format!("New agent key for '{}':", self.server_name));
            println!("  {}", self.agent_key);
            println!();
            println!(
                "{}",
                "Note: The old key is now invalid. Update your agent configuration.".yellow()
            );
        } else {
            println!("Agent key for '{}':", self.server_name);
            println!("  {}", self.agent_key);
        }
    }
}
