//! Command-line interface definition for vstats
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for authentication, server management, remote
//! deployment over SSH, web dashboard management and configuration.

use clap::{Parser, Subcommand};

use crate::api::HistoryRange;
use crate::output::OutputFormat;

/// vStats CLI - Server monitoring management tool
///
/// Manage your vStats Cloud servers, view real-time metrics and history,
/// and deploy agents and web dashboards to remote hosts via SSH.
#[derive(Parser, Debug, Clone)]
#[command(name = "vstats")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file (default: ~/.vstats/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub output: OutputFormat,

    /// vStats Cloud URL (default from config)
    #[arg(long, global = true)]
    pub cloud_url: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands for vstats
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Print the version number
    Version,

    /// Login to vStats Cloud
    Login {
        /// Authentication token (prompted for when omitted)
        #[arg(short, long)]
        token: Option<String>,
    },

    /// Logout from vStats Cloud and remove stored credentials
    Logout,

    /// Show current user information
    Whoami,

    /// Manage servers
    #[command(visible_aliases = ["servers", "srv"])]
    Server {
        /// Server management subcommand
        #[command(subcommand)]
        command: ServerCommand,
    },

    /// Deploy agents or web dashboards via SSH
    Ssh {
        /// Deployment subcommand
        #[command(subcommand)]
        command: SshCommand,
    },

    /// Manage web dashboard instances
    Web {
        /// Web instance subcommand
        #[command(subcommand)]
        command: WebCommand,
    },

    /// Manage CLI configuration
    Config {
        /// Configuration subcommand
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Server management subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ServerCommand {
    /// List all servers
    #[command(visible_alias = "ls")]
    List,

    /// Create a new server
    Create {
        /// Server name
        name: String,
    },

    /// Show server details
    #[command(visible_aliases = ["get", "info"])]
    Show {
        /// Server name or ID
        server: String,
    },

    /// Update server settings
    Update {
        /// Server name or ID
        server: String,

        /// New server name
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Delete a server
    #[command(visible_aliases = ["rm", "remove"])]
    Delete {
        /// Server name or ID
        server: String,

        /// Delete without confirmation
        #[arg(short, long)]
        force: bool,
    },

    /// View the latest server metrics
    Metrics {
        /// Server name or ID
        server: String,
    },

    /// View metrics history
    History {
        /// Server name or ID
        server: String,

        /// Time range
        #[arg(short, long, value_enum, default_value_t = HistoryRange::OneHour)]
        range: HistoryRange,
    },

    /// Get the agent installation command
    Install {
        /// Server name or ID
        server: String,
    },

    /// Show or regenerate the agent key
    Key {
        /// Server name or ID
        server: String,

        /// Regenerate the agent key
        #[arg(long)]
        regenerate: bool,
    },
}

/// SSH connection options shared by the deployment subcommands
#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct SshArgs {
    /// SSH username (default: root)
    #[arg(short, long)]
    pub user: Option<String>,

    /// SSH port (uses ssh config default)
    #[arg(short, long)]
    pub port: Option<u16>,

    /// SSH private key path
    #[arg(short = 'i', long)]
    pub key: Option<String>,
}

/// Remote deployment subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum SshCommand {
    /// Deploy the vStats agent via SSH
    Agent {
        /// Target host (`user@host` or an ssh config alias)
        host: String,

        #[command(flatten)]
        ssh: SshArgs,

        /// Server name in vStats (default: the host)
        #[arg(long)]
        name: Option<String>,

        /// Use an existing server (name or ID) instead of creating one
        #[arg(long)]
        server: Option<String>,
    },

    /// Deploy a vStats web dashboard via SSH
    Web {
        /// Target host (`user@host` or an ssh config alias)
        host: String,

        #[command(flatten)]
        ssh: SshArgs,

        /// Web dashboard name (default: web-<host>)
        #[arg(long)]
        name: Option<String>,

        /// Web dashboard port
        #[arg(long, default_value_t = crate::deploy::DEFAULT_WEB_PORT)]
        web_port: u16,

        /// Custom domain for the dashboard
        #[arg(long)]
        domain: Option<String>,

        /// Enable SSL (requires domain)
        #[arg(long)]
        ssl: bool,
    },
}

/// Web dashboard subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum WebCommand {
    /// List all web dashboard instances
    #[command(visible_alias = "ls")]
    List,

    /// Show plan and web instance limits
    Status,

    /// Check web instance health
    Check {
        /// Web instance name or ID
        instance: String,
    },

    /// Remove a web dashboard instance
    #[command(visible_aliases = ["rm", "delete"])]
    Remove {
        /// Web instance name or ID
        instance: String,

        /// Remove without confirmation
        #[arg(short, long)]
        force: bool,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,

    /// Set a configuration value (keys: cloud_url)
    Set {
        /// Configuration key
        key: String,
        /// New value
        value: String,
    },

    /// Show configuration file path
    Path,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

impl Default for Cli {
    fn default() -> Self {
        Self {
            config: None,
            output: OutputFormat::Table,
            cloud_url: None,
            no_color: false,
            verbose: false,
            command: Commands::Version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_default() {
        let cli = Cli::default();
        assert_eq!(cli.config, None);
        assert_eq!(cli.output, OutputFormat::Table);
        assert!(!cli.verbose);
        assert!(matches!(cli.command, Commands::Version));
    }

    #[test]
    fn test_cli_parse_login_with_token() {
        let cli = Cli::try_parse_from(["vstats", "login", "--token", "abc"]).unwrap();
        if let Commands::Login { token } = cli.command {
            assert_eq!(token, Some("abc".to_string()));
        } else {
            panic!("Expected Login command");
        }
    }

    #[test]
    fn test_cli_parse_global_output_after_subcommand() {
        let cli = Cli::try_parse_from(["vstats", "server", "list", "-o", "json"]).unwrap();
        assert_eq!(cli.output, OutputFormat::Json);
        assert!(matches!(
            cli.command,
            Commands::Server {
                command: ServerCommand::List
            }
        ));
    }

    #[test]
    fn test_cli_parse_server_alias() {
        let cli = Cli::try_parse_from(["vstats", "srv", "ls"]).unwrap();
        assert!(matches!(cli.command, Commands::Server { .. }));
    }

    #[test]
    fn test_cli_parse_history_default_range() {
        let cli = Cli::try_parse_from(["vstats", "server", "history", "web-01"]).unwrap();
        if let Commands::Server {
            command: ServerCommand::History { server, range },
        } = cli.command
        {
            assert_eq!(server, "web-01");
            assert_eq!(range, HistoryRange::OneHour);
        } else {
            panic!("Expected History command");
        }
    }

    #[test]
    fn test_cli_parse_history_range() {
        let cli =
            Cli::try_parse_from(["vstats", "server", "history", "web-01", "--range", "7d"]).unwrap();
        if let Commands::Server {
            command: ServerCommand::History { range, .. },
        } = cli.command
        {
            assert_eq!(range, HistoryRange::SevenDays);
        } else {
            panic!("Expected History command");
        }
    }

    #[test]
    fn test_cli_parse_history_invalid_range() {
        let cli = Cli::try_parse_from(["vstats", "server", "history", "web-01", "--range", "2w"]);
        assert!(cli.is_err());
    }

    #[test]
    fn test_cli_parse_delete_force() {
        let cli = Cli::try_parse_from(["vstats", "server", "delete", "web-01", "-f"]).unwrap();
        if let Commands::Server {
            command: ServerCommand::Delete { server, force },
        } = cli.command
        {
            assert_eq!(server, "web-01");
            assert!(force);
        } else {
            panic!("Expected Delete command");
        }
    }

    #[test]
    fn test_cli_parse_ssh_agent_flags() {
        let cli = Cli::try_parse_from([
            "vstats",
            "ssh",
            "agent",
            "admin@10.0.0.5",
            "-p",
            "2222",
            "-i",
            "~/.ssh/id_ed25519",
            "--name",
            "Prod-01",
        ])
        .unwrap();
        if let Commands::Ssh {
            command:
                SshCommand::Agent {
                    host,
                    ssh,
                    name,
                    server,
                },
        } = cli.command
        {
            assert_eq!(host, "admin@10.0.0.5");
            assert_eq!(ssh.port, Some(2222));
            assert_eq!(ssh.key.as_deref(), Some("~/.ssh/id_ed25519"));
            assert_eq!(ssh.user, None);
            assert_eq!(name.as_deref(), Some("Prod-01"));
            assert_eq!(server, None);
        } else {
            panic!("Expected ssh agent command");
        }
    }

    #[test]
    fn test_cli_parse_ssh_web_defaults() {
        let cli = Cli::try_parse_from(["vstats", "ssh", "web", "dash.example.com"]).unwrap();
        if let Commands::Ssh {
            command:
                SshCommand::Web {
                    web_port,
                    ssl,
                    domain,
                    ..
                },
        } = cli.command
        {
            assert_eq!(web_port, 3001);
            assert!(!ssl);
            assert_eq!(domain, None);
        } else {
            panic!("Expected ssh web command");
        }
    }

    #[test]
    fn test_cli_parse_web_remove_alias() {
        let cli = Cli::try_parse_from(["vstats", "web", "rm", "dash", "--force"]).unwrap();
        if let Commands::Web {
            command: WebCommand::Remove { instance, force },
        } = cli.command
        {
            assert_eq!(instance, "dash");
            assert!(force);
        } else {
            panic!("Expected web remove command");
        }
    }

    #[test]
    fn test_cli_parse_config_set() {
        let cli =
            Cli::try_parse_from(["vstats", "config", "set", "cloud_url", "https://x.test"]).unwrap();
        if let Commands::Config {
            command: ConfigCommand::Set { key, value },
        } = cli.command
        {
            assert_eq!(key, "cloud_url");
            assert_eq!(value, "https://x.test");
        } else {
            panic!("Expected config set command");
        }
    }

    #[test]
    fn test_cli_parse_missing_command() {
        assert!(Cli::try_parse_from(["vstats"]).is_err());
    }

    #[test]
    fn test_cli_parse_invalid_output_format() {
        assert!(Cli::try_parse_from(["vstats", "-o", "xml", "whoami"]).is_err());
    }
}
