//! Authentication commands
//!
//! A session is established by verifying a user-supplied token with the
//! cloud and storing it, together with the username and an expiry one
//! week out, in the config file.

use chrono::{Duration, Utc};
use colored::Colorize;
use dialoguer::Password;

use crate::api::{ApiClient, CloudApi, CurrentUser, VerifyResponse};
use crate::commands::{connect, print_success};
use crate::config::Config;
use crate::error::{Result, VstatsError};
use crate::output::{print_details, Renderer, TableView};

/// Lifetime recorded for a new session
pub const SESSION_TTL_DAYS: i64 = 7;

/// `vstats login`
///
/// Uses `--token` when given, otherwise prompts without echo.
pub async fn run_login(config: &mut Config, token: Option<String>) -> Result<()> {
    let token = match token {
        Some(t) => t,
        None => {
            println!("Login to vStats Cloud");
            println!("=====================");
            println!();
            println!("You can get your token from: {}", config.cloud_url);
            println!();
            Password::new()
                .with_prompt("Enter your token")
                .allow_empty_password(true)
                .interact()
                .map_err(VstatsError::Prompt)?
        }
    };

    let token = token.trim().to_string();
    if token.is_empty() {
        return Err(VstatsError::Config("token is required".to_string()).into());
    }

    println!("Verifying token...");
    let client = ApiClient::new(&config.cloud_url, Some(token.clone()))?;
    let verified = login(config, &client, token).await?;

    println!();
    print_success(&format!("Logged in as {}", verified.username));
    println!("  Plan: {}", verified.plan);
    Ok(())
}

/// Verify `token` through `api` and persist the session
///
/// # Errors
///
/// Returns `VstatsError::InvalidToken` when the cloud reports the token
/// as invalid, or the save error when the config cannot be written
pub async fn login(
    config: &mut Config,
    api: &dyn CloudApi,
    token: String,
) -> Result<VerifyResponse> {
    let verified = api.verify_token().await?;
    if !verified.valid {
        return Err(VstatsError::InvalidToken.into());
    }

    let expires_at = (Utc::now() + Duration::days(SESSION_TTL_DAYS)).timestamp();
    config.set_session(token, verified.username.clone(), expires_at);
    config.save()?;
    tracing::info!("Logged in as {}", verified.username);
    Ok(verified)
}

/// `vstats logout`
///
/// Without a stored session this reports it and leaves the file alone.
pub fn run_logout(config: &mut Config) -> Result<()> {
    match logout(config)? {
        Some(username) if !username.is_empty() => {
            print_success(&format!("Logged out from {}", username))
        }
        Some(_) => print_success("Logged out"),
        None => println!("Not logged in"),
    }
    Ok(())
}

/// Clear and persist the session, returning the username that was logged
/// in, or `None` when there was no session
pub fn logout(config: &mut Config) -> Result<Option<String>> {
    if !config.is_logged_in() {
        return Ok(None);
    }
    let username = config.username.clone();
    config.clear_session();
    config.save()?;
    Ok(Some(username))
}

/// `vstats whoami`
pub async fn run_whoami(config: &Config, renderer: &Renderer) -> Result<()> {
    let (_, client) = connect(config)?;
    let me = client.current_user().await?;
    renderer.render(&me)
}

impl TableView for CurrentUser {
    fn print_table(&self) {
        println!("{}", "Current User".bold());
        println!("============");
        let mut rows = vec![("Username", self.user.username.clone())];
        if let Some(email) = &self.user.email {
            rows.push(("Email", email.clone()));
        }
        rows.push(("Plan", self.user.plan.clone()));
        rows.push((
            "Servers",
            format!("{} / {}", self.server_count, self.server_limit),
        ));
        rows.push(("Status", self.user.status.clone()));
        print_details(&rows);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::FakeCloudApi;
    use crate::error::kind_of;
    use tempfile::TempDir;

    fn temp_config() -> (TempDir, Config) {
        let dir = TempDir::new().unwrap();
        let config = Config::new_at(&dir.path().join(".vstats").join("config.yaml"));
        (dir, config)
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let (_dir, mut config) = temp_config();
        let cloud = FakeCloudApi::new();

        let verified = login(&mut config, &cloud, "tok-abc".to_string())
            .await
            .unwrap();
        assert_eq!(verified.username, "tester");

        let reloaded = Config::from_path(config.path()).unwrap();
        assert_eq!(reloaded.token, "tok-abc");
        assert_eq!(reloaded.username, "tester");

        let week = Duration::days(SESSION_TTL_DAYS).num_seconds();
        let remaining = reloaded.expires_at - Utc::now().timestamp();
        assert!(remaining > week - 60 && remaining <= week);
    }

    #[tokio::test]
    async fn test_login_rejects_invalid_token() {
        let (_dir, mut config) = temp_config();
        let cloud = FakeCloudApi::new();
        cloud.set_verify(VerifyResponse {
            valid: false,
            user_id: String::new(),
            username: String::new(),
            plan: String::new(),
        });

        let err = login(&mut config, &cloud, "bad".to_string())
            .await
            .unwrap_err();
        assert!(matches!(kind_of(&err), Some(VstatsError::InvalidToken)));
        assert!(!config.is_logged_in());
        assert!(!config.path().exists());
    }

    #[tokio::test]
    async fn test_logout_clears_session() {
        let (_dir, mut config) = temp_config();
        let cloud = FakeCloudApi::new();
        login(&mut config, &cloud, "tok-abc".to_string())
            .await
            .unwrap();

        let username = logout(&mut config).unwrap();
        assert_eq!(username.as_deref(), Some("tester"));

        let reloaded = Config::from_path(config.path()).unwrap();
        assert_eq!(reloaded.token, "");
        assert_eq!(reloaded.username, "");
        assert_eq!(reloaded.expires_at, 0);
    }

    #[test]
    fn test_logout_without_session_is_noop() {
        let (_dir, mut config) = temp_config();
        let before = config.clone();

        assert_eq!(logout(&mut config).unwrap(), None);
        assert_eq!(config.token, before.token);
        assert_eq!(config.cloud_url, before.cloud_url);
        assert!(!config.path().exists());
    }
}
