//! Remote command execution through the system `ssh` client
//!
//! The client never speaks the SSH protocol itself. It builds an argument
//! list, hands the install command to `ssh` as the remote command and wires
//! the child's stdio to the terminal so installer output and prompts reach
//! the user directly. Host aliases, known hosts and agent forwarding all
//! come from the user's own ssh configuration.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::deploy::DEFAULT_SSH_USER;
use crate::error::{Result, VstatsError};

/// Split `user@host` into its parts
///
/// Only the first `@` separates; anything after it is the host.
///
/// # Examples
///
/// ```
/// use vstats::deploy::parse_ssh_host;
///
/// assert_eq!(parse_ssh_host("admin@10.0.0.5"), (Some("admin"), "10.0.0.5"));
/// assert_eq!(parse_ssh_host("myserver"), (None, "myserver"));
/// ```
pub fn parse_ssh_host(input: &str) -> (Option<&str>, &str) {
    match input.split_once('@') {
        Some((user, host)) if !user.is_empty() => (Some(user), host),
        Some((_, host)) => (None, host),
        None => (None, input),
    }
}

/// Where and how to connect
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshTarget {
    /// Login user
    pub user: String,
    /// Hostname, address or ssh config alias
    pub host: String,
    /// Explicit port, otherwise the ssh config decides
    pub port: Option<u16>,
    /// Explicit identity file, otherwise the ssh config decides
    pub identity_file: Option<String>,
}

impl SshTarget {
    /// Build a target from the positional host argument and flags
    ///
    /// An explicit `user` wins over one embedded in `host_arg`; with neither
    /// the login user is `root`.
    pub fn new(
        host_arg: &str,
        user: Option<&str>,
        port: Option<u16>,
        identity_file: Option<&str>,
    ) -> Self {
        let (parsed_user, host) = parse_ssh_host(host_arg);
        let user = user
            .filter(|u| !u.is_empty())
            .or(parsed_user)
            .unwrap_or(DEFAULT_SSH_USER);

        Self {
            user: user.to_string(),
            host: host.to_string(),
            port: port.filter(|p| *p != 0),
            identity_file: identity_file
                .filter(|k| !k.is_empty())
                .map(str::to_string),
        }
    }

    /// `user@host`, or the bare host when no user is set
    pub fn destination(&self) -> String {
        if self.user.is_empty() {
            self.host.clone()
        } else {
            format!("{}@{}", self.user, self.host)
        }
    }
}

/// Full `ssh` argument vector with `command` as the last element
///
/// # Examples
///
/// ```
/// use vstats::deploy::{build_ssh_args, SshTarget};
///
/// let target = SshTarget::new("admin@box", None, Some(2222), Some("~/.ssh/id"));
/// assert_eq!(
///     build_ssh_args(&target, "uptime"),
///     vec!["-p", "2222", "-i", "~/.ssh/id", "admin@box", "uptime"]
/// );
/// ```
pub fn build_ssh_args(target: &SshTarget, command: &str) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(port) = target.port {
        args.push("-p".to_string());
        args.push(port.to_string());
    }
    if let Some(key) = &target.identity_file {
        args.push("-i".to_string());
        args.push(key.clone());
    }
    args.push(target.destination());
    args.push(command.to_string());
    args
}

/// Runs one command on a remote host
#[async_trait]
pub trait RemoteShell: Send + Sync {
    /// Run `command` on `target`, failing with
    /// [`VstatsError::Deployment`] unless it exits successfully
    async fn run(&self, target: &SshTarget, command: &str) -> Result<()>;
}

/// [`RemoteShell`] backed by the `ssh` executable on `PATH`
#[derive(Debug, Clone)]
pub struct SystemSsh {
    program: PathBuf,
}

impl SystemSsh {
    /// Locate `ssh` on the search path
    ///
    /// # Errors
    ///
    /// Returns [`VstatsError::SshNotFound`] when it is not installed.
    pub fn locate() -> Result<Self> {
        let program = which::which("ssh").map_err(|_| VstatsError::SshNotFound)?;
        tracing::debug!("Using ssh at {}", program.display());
        Ok(Self { program })
    }
}

#[async_trait]
impl RemoteShell for SystemSsh {
    async fn run(&self, target: &SshTarget, command: &str) -> Result<()> {
        let args = build_ssh_args(target, command);
        // The remote command embeds the session token; log the target only.
        tracing::debug!(
            "Running ssh to {} (port: {:?}, identity: {:?})",
            target.destination(),
            target.port,
            target.identity_file
        );

        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| VstatsError::Deployment(format!("failed to launch ssh: {}", e)))?;

        if !status.success() {
            return Err(VstatsError::Deployment(format!("ssh {}", status)).into());
        }
        Ok(())
    }
}
