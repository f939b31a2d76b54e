//! vstats - vStats Cloud command-line client
//!
#![doc = "Main entry point for the vstats CLI."]

use anyhow::Result;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vstats::cli::{Cli, Commands};
use vstats::commands;
use vstats::config::Config;
use vstats::output::{self, Renderer};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize tracing
    init_tracing(cli.verbose);

    output::set_color_enabled(!cli.no_color);
    let renderer = Renderer::new(cli.output);

    // Load configuration
    let mut config = Config::load(cli.config.as_deref(), &cli)?;

    // `config` commands must stay usable to repair an invalid file
    if !matches!(cli.command, Commands::Config { .. } | Commands::Version) {
        config.validate()?;
    }

    match cli.command {
        Commands::Version => {
            commands::print_version();
            Ok(())
        }
        Commands::Login { token } => {
            tracing::info!("Starting login");
            commands::auth::run_login(&mut config, token).await
        }
        Commands::Logout => commands::auth::run_logout(&mut config),
        Commands::Whoami => commands::auth::run_whoami(&config, &renderer).await,
        Commands::Server { command } => {
            tracing::info!("Starting server command");
            tracing::debug!("Server command: {:?}", command);
            commands::server::run_server(&config, &renderer, command).await
        }
        Commands::Ssh { command } => {
            tracing::info!("Starting ssh deployment");
            commands::ssh::run_ssh(&config, &renderer, command).await
        }
        Commands::Web { command } => {
            tracing::info!("Starting web command");
            tracing::debug!("Web command: {:?}", command);
            commands::web::run_web(&config, &renderer, command).await
        }
        Commands::Config { command } => {
            commands::config::run_config(&mut config, &renderer, command)
        }
    }
}

/// Initialize tracing subscriber with environment filter
///
/// Logs go to stderr so JSON and YAML output on stdout stay parseable.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "vstats=debug" } else { "vstats=warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
