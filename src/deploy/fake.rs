//! Recording stand-in for the system `ssh` client

use std::sync::Mutex;

use async_trait::async_trait;

use crate::deploy::ssh::{build_ssh_args, RemoteShell, SshTarget};
use crate::error::{Result, VstatsError};

/// Scriptable [`RemoteShell`] that records invocations instead of connecting
#[derive(Debug, Default)]
pub struct FakeRemoteShell {
    failure: Option<String>,
    invocations: Mutex<Vec<Vec<String>>>,
}

impl FakeRemoteShell {
    /// Shell on which every command succeeds
    pub fn succeeding() -> Self {
        Self::default()
    }

    /// Shell on which every command fails with `message`
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    /// Argument vectors of every run, as `ssh` would have received them
    pub fn invocations(&self) -> Vec<Vec<String>> {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[async_trait]
impl RemoteShell for FakeRemoteShell {
    async fn run(&self, target: &SshTarget, command: &str) -> Result<()> {
        self.invocations
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(build_ssh_args(target, command));
        match &self.failure {
            Some(message) => Err(VstatsError::Deployment(message.clone()).into()),
            None => Ok(()),
        }
    }
}
