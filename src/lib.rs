//! vstats - command-line client for the vStats Cloud monitoring service
//!
//! This library provides the pieces behind the `vstats` binary: a typed
//! client for the vStats Cloud REST API, the orchestration that deploys
//! monitoring agents and web dashboards over SSH, local session
//! configuration and result rendering.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: `CloudApi` trait, reqwest-backed `ApiClient`, wire types and an
//!   in-memory fake behind the `test-util` feature
//! - `deploy`: name-or-id resolution and the agent/web deployment workflows
//! - `config`: session persistence and validation
//! - `output`: table/JSON/YAML rendering and formatting helpers
//! - `commands`: handlers for each CLI command group
//! - `error`: error types and result aliases
//! - `cli`: command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use vstats::api::{ApiClient, CloudApi};
//! use vstats::deploy::find_server_by_name_or_id;
//! use vstats::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None, &Default::default())?;
//!     config.validate()?;
//!
//!     let session = config.session()?;
//!     let client = ApiClient::from_session(&session)?;
//!     let server = find_server_by_name_or_id(&client, "web-01").await?;
//!     println!("{} is {}", server.name, server.status);
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod deploy;
pub mod error;
pub mod output;

// Re-export commonly used types
pub use api::{ApiClient, CloudApi};
pub use config::{Config, Session};
pub use error::{Result, VstatsError};
pub use output::{OutputFormat, Renderer};
