//! Error types for vstats
//!
//! This module defines all error types used throughout the client,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for vstats operations
///
/// Every failure that reaches the command boundary is one of these
/// variants. Callers that need to branch on the kind of failure use
/// `anyhow::Error::downcast_ref::<VstatsError>()`.
#[derive(Error, Debug)]
pub enum VstatsError {
    /// No session token is configured for a command that needs one
    #[error("not logged in. Run 'vstats login' first")]
    AuthenticationRequired,

    /// The cloud rejected the token presented during login
    #[error("invalid token")]
    InvalidToken,

    /// Network-level failure (DNS, connection refused, timeout)
    #[error("request failed: {0}")]
    Transport(String),

    /// The cloud answered with a status >= 400
    #[error("API error ({status}): {message}")]
    Api {
        /// HTTP status code returned by the cloud
        status: u16,
        /// Server-supplied message, or the raw body when none was supplied
        message: String,
    },

    /// The response body did not match the expected shape
    #[error("failed to parse response: {0}")]
    Decode(String),

    /// Name-or-id resolution found nothing
    #[error("{kind} not found: {reference}")]
    NotFound {
        /// Resource kind ("server", "web instance")
        kind: &'static str,
        /// The reference exactly as the user supplied it
        reference: String,
    },

    /// Plan limit reached before a web dashboard deployment
    #[error("web instance limit reached: {current} / {max} on plan '{plan}'")]
    QuotaExceeded {
        /// Plan name
        plan: String,
        /// Number of web instances already registered
        current: i64,
        /// Maximum allowed by the plan
        max: i64,
    },

    /// The ssh subprocess failed to launch or exited non-zero
    #[error("deployment failed: {0}")]
    Deployment(String),

    /// The system ssh client is not on PATH
    #[error("ssh not found in PATH. Please install OpenSSH")]
    SshNotFound,

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Interactive prompt errors
    #[error("Prompt error: {0}")]
    Prompt(#[from] dialoguer::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for vstats operations
///
/// Uses `anyhow::Error` so that command handlers can attach context while
/// the typed `VstatsError` stays recoverable through downcasting.
pub type Result<T> = anyhow::Result<T>;

/// Returns the `VstatsError` carried by an `anyhow::Error`, if any
pub fn kind_of(err: &anyhow::Error) -> Option<&VstatsError> {
    err.downcast_ref::<VstatsError>()
}
