/*!
Command handlers for the CLI

Each submodule owns one command group:

- `auth`: login, logout, whoami
- `server`: server CRUD, metrics, history, agent keys
- `ssh`: agent and web dashboard deployment
- `web`: web dashboard instances and plan status
- `config`: local configuration

Handlers receive the loaded [`Config`] and the [`Renderer`] selected by
`--output`; nothing reads configuration from global state. The work that
talks to the cloud is split into functions taking `&dyn CloudApi` so it
can be exercised against `FakeCloudApi` in tests.
*/

use colored::Colorize;
use dialoguer::Confirm;

use crate::api::ApiClient;
use crate::config::{Config, Session};
use crate::error::{Result, VstatsError};

pub mod auth;
pub mod config;
pub mod server;
pub mod ssh;
pub mod web;

/// Session and API client for an authenticated command
///
/// # Errors
///
/// Returns `VstatsError::AuthenticationRequired` before any request is
/// made when no token is stored
pub fn connect(config: &Config) -> Result<(Session, ApiClient)> {
    let session = config.session()?;
    let client = ApiClient::from_session(&session)?;
    tracing::debug!("Using vStats Cloud at {}", client.base_url());
    Ok((session, client))
}

/// Ask a yes/no question on the terminal, defaulting to no
///
/// `force` skips the prompt and answers yes.
pub fn confirm(prompt: &str, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }
    let answer = Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .map_err(VstatsError::Prompt)?;
    if !answer {
        println!("Cancelled.");
    }
    Ok(answer)
}

/// Print a green check line
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// `vstats version`
pub fn print_version() {
    println!("vstats version {}", env!("CARGO_PKG_VERSION"));
}
