//! Configuration management for vstats
//!
//! This module handles loading, saving, and validating the locally
//! persisted session (cloud URL, token, username, expiry), applying
//! environment and CLI overrides on top of the file.

use crate::error::{Result, VstatsError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default vStats Cloud API endpoint
pub const DEFAULT_CLOUD_URL: &str = "https://api.vstats.zsoft.cc";

/// Directory under the user's home holding the config file
const CONFIG_DIR_NAME: &str = ".vstats";

/// Config file name inside [`CONFIG_DIR_NAME`]
const CONFIG_FILE_NAME: &str = "config.yaml";

/// Keys accepted by `vstats config set`
pub const SETTABLE_KEYS: &[&str] = &["cloud_url"];

/// Persisted CLI configuration
///
/// Loaded once at process start and passed down to the API client and
/// the deployment workflows. Mutating commands write it back with
/// [`Config::save`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// vStats Cloud base URL
    #[serde(default = "default_cloud_url")]
    pub cloud_url: String,

    /// Bearer token for the current session (empty when logged out)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub token: String,

    /// Username returned by the token verification at login
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub username: String,

    /// Session expiry as a unix timestamp (0 when logged out)
    #[serde(default, skip_serializing_if = "is_zero")]
    pub expires_at: i64,

    /// Location the configuration was loaded from and is saved to
    #[serde(skip)]
    path: PathBuf,

    /// File values shadowed by environment or CLI overrides for this run
    #[serde(skip)]
    shadowed: Shadowed,
}

/// On-disk values replaced by per-run overrides
///
/// `save` writes these back instead of the override, unless the field was
/// explicitly changed since loading.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Shadowed {
    cloud_url: Option<String>,
    token: Option<String>,
}

fn default_cloud_url() -> String {
    DEFAULT_CLOUD_URL.to_string()
}

fn is_zero(value: &i64) -> bool {
    *value == 0
}

/// Credentials needed by authenticated operations
///
/// Obtained through [`Config::session`], which refuses to build one when
/// no token is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    /// vStats Cloud base URL
    pub cloud_url: String,
    /// Bearer token
    pub token: String,
    /// Username, possibly empty for sessions supplied through the environment
    pub username: String,
}

/// User-facing view of the configuration that never includes the token
#[derive(Debug, Clone, Serialize)]
pub struct ConfigSummary {
    /// vStats Cloud base URL
    pub cloud_url: String,
    /// Logged in username
    #[serde(skip_serializing_if = "String::is_empty")]
    pub username: String,
    /// Whether a token is stored
    pub logged_in: bool,
    /// Session expiry as a unix timestamp
    #[serde(skip_serializing_if = "is_zero")]
    pub expires_at: i64,
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// # Arguments
    ///
    /// * `path` - Explicit config file path; `None` selects `~/.vstats/config.yaml`
    /// * `cli` - CLI arguments for overrides
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed, or
    /// if no home directory can be determined for the default location
    pub fn load(path: Option<&str>, cli: &crate::cli::Cli) -> Result<Self> {
        let path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_path()?,
        };

        let mut config = Self::from_path(&path)?;
        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    /// Load configuration from `path` without applying overrides
    ///
    /// A missing file yields the default configuration bound to `path`.
    pub fn from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file not found at {}, using defaults", path.display());
            return Ok(Self::new_at(path));
        }

        let contents = std::fs::read_to_string(path)
            .map_err(|e| VstatsError::Config(format!("Failed to read config file: {}", e)))?;
        let mut config: Self = if contents.trim().is_empty() {
            Self::new_at(path)
        } else {
            serde_yaml::from_str(&contents)
                .map_err(|e| VstatsError::Config(format!("Failed to parse config: {}", e)))?
        };
        config.path = path.to_path_buf();
        Ok(config)
    }

    /// Default configuration bound to `path`
    pub fn new_at(path: &Path) -> Self {
        Self {
            cloud_url: default_cloud_url(),
            token: String::new(),
            username: String::new(),
            expires_at: 0,
            path: path.to_path_buf(),
            shadowed: Shadowed::default(),
        }
    }

    /// Directory holding the default config file (`~/.vstats`)
    pub fn default_dir() -> Result<PathBuf> {
        let dirs = directories::BaseDirs::new().ok_or_else(|| {
            VstatsError::Config("Could not determine home directory".to_string())
        })?;
        Ok(dirs.home_dir().join(CONFIG_DIR_NAME))
    }

    /// Default config file path (`~/.vstats/config.yaml`)
    pub fn default_path() -> Result<PathBuf> {
        Ok(Self::default_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Path this configuration is saved to
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn apply_env_vars(&mut self) {
        if let Ok(url) = std::env::var("VSTATS_CLOUD_URL") {
            if !url.is_empty() {
                self.override_cloud_url(url);
            }
        }

        if let Ok(token) = std::env::var("VSTATS_TOKEN") {
            if !token.is_empty() {
                tracing::debug!("Using session token from VSTATS_TOKEN");
                let previous = std::mem::replace(&mut self.token, token);
                self.shadowed.token.get_or_insert(previous);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if let Some(url) = &cli.cloud_url {
            self.override_cloud_url(url.clone());
        }
    }

    fn override_cloud_url(&mut self, url: String) {
        let previous = std::mem::replace(&mut self.cloud_url, url);
        // Keep the first shadowed value: that is the one from the file
        self.shadowed.cloud_url.get_or_insert(previous);
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns error if the cloud URL is not an absolute http(s) URL
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.cloud_url).map_err(|e| {
            VstatsError::Config(format!("Invalid cloud_url '{}': {}", self.cloud_url, e))
        })?;

        match parsed.scheme() {
            "http" | "https" => Ok(()),
            other => Err(VstatsError::Config(format!(
                "Invalid cloud_url scheme '{}': expected http or https",
                other
            ))
            .into()),
        }
    }

    /// Whether a session token is stored
    pub fn is_logged_in(&self) -> bool {
        !self.token.is_empty()
    }

    /// Current session credentials
    ///
    /// # Errors
    ///
    /// Returns `VstatsError::AuthenticationRequired` when no token is stored
    pub fn session(&self) -> Result<Session> {
        if !self.is_logged_in() {
            return Err(VstatsError::AuthenticationRequired.into());
        }
        Ok(Session {
            cloud_url: self.cloud_url.clone(),
            token: self.token.clone(),
            username: self.username.clone(),
        })
    }

    /// Store a verified session
    pub fn set_session(&mut self, token: String, username: String, expires_at: i64) {
        self.shadowed.token = None;
        self.token = token;
        self.username = username;
        self.expires_at = expires_at;
    }

    /// Clear token, username and expiry
    pub fn clear_session(&mut self) {
        self.shadowed.token = None;
        self.token.clear();
        self.username.clear();
        self.expires_at = 0;
    }

    /// Set a user-editable key
    ///
    /// # Errors
    ///
    /// Returns `VstatsError::Config` for unknown keys or invalid values
    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "cloud_url" => {
                let previous = std::mem::replace(&mut self.cloud_url, value.to_string());
                if let Err(e) = self.validate() {
                    self.cloud_url = previous;
                    return Err(e);
                }
                self.shadowed.cloud_url = None;
                Ok(())
            }
            _ => Err(VstatsError::Config(format!("unknown configuration key: {}", key)).into()),
        }
    }

    /// Summary suitable for display
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            cloud_url: self.cloud_url.clone(),
            username: self.username.clone(),
            logged_in: self.is_logged_in(),
            expires_at: self.expires_at,
        }
    }

    /// Persist the configuration to [`Config::path`]
    ///
    /// Values that only came from `VSTATS_CLOUD_URL`, `VSTATS_TOKEN` or
    /// `--cloud-url` are not written; the file keeps what it had for those
    /// fields unless they were changed through [`Config::set_value`],
    /// [`Config::set_session`] or [`Config::clear_session`].
    ///
    /// The containing directory is created owner-only (0700) and the file
    /// is written owner-only (0600).
    ///
    /// # Errors
    ///
    /// Returns error if the directory or file cannot be written
    pub fn save(&self) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    VstatsError::Config(format!("Failed to create config directory: {}", e))
                })?;
                restrict_permissions(dir, 0o700)?;
            }
        }

        let mut persisted = self.clone();
        if let Some(url) = &self.shadowed.cloud_url {
            persisted.cloud_url = url.clone();
        }
        if let Some(token) = &self.shadowed.token {
            persisted.token = token.clone();
        }

        let data = serde_yaml::to_string(&persisted)?;
        std::fs::write(&self.path, data)
            .map_err(|e| VstatsError::Config(format!("Failed to write config file: {}", e)))?;
        restrict_permissions(&self.path, 0o600)?;

        tracing::debug!("Saved configuration to {}", self.path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path, mode: u32) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))?;
    Ok(())
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path, _mode: u32) -> Result<()> {
    Ok(())
}
