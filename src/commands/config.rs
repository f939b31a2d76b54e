//! Local configuration commands

use colored::Colorize;

use crate::cli::ConfigCommand;
use crate::commands::print_success;
use crate::config::{Config, ConfigSummary};
use crate::error::Result;
use crate::output::{print_details, Renderer, TableView};

/// Dispatch a `vstats config` subcommand
pub fn run_config(config: &mut Config, renderer: &Renderer, command: ConfigCommand) -> Result<()> {
    match command {
        ConfigCommand::Show => renderer.render(&config.summary()),
        ConfigCommand::Set { key, value } => {
            config.set_value(&key, &value)?;
            config.save()?;
            print_success(&format!("Configuration updated: {} = {}", key, value));
            Ok(())
        }
        ConfigCommand::Path => {
            println!("{}", config.path().display());
            Ok(())
        }
    }
}

impl TableView for ConfigSummary {
    fn print_table(&self) {
        println!("{}", "vStats CLI Configuration".bold());
        println!("========================");
        let username = if self.username.is_empty() {
            "-".to_string()
        } else {
            self.username.clone()
        };
        print_details(&[
            ("Cloud URL", self.cloud_url.clone()),
            ("Username", username),
            ("Logged In", self.logged_in.to_string()),
        ]);
    }
}
