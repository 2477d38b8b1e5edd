//! Provisioning configuration for deploykey
//!
//! Located at `~/.config/deploykey/config.toml`

use crate::{ConfigError, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable holding the base64-encoded private key
pub const DEFAULT_ENV: &str = "GIT_SSH_KEY";

/// Hosts that get a `Host` stanza when none are configured
pub const DEFAULT_HOSTS: [&str; 2] = ["github.com", "bitbucket.org"];

/// What to provision and where
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Name of the trigger variable holding the base64-encoded key
    pub env: String,
    /// Hosts to generate SSH client stanzas for, in order
    pub hosts: Vec<String>,
    /// SSH directory for the key and config files (default: `~/.ssh`).
    /// `~` and `$VAR` references are expanded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssh_dir: Option<String>,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            env: DEFAULT_ENV.to_string(),
            hosts: DEFAULT_HOSTS.iter().map(|h| h.to_string()).collect(),
            ssh_dir: None,
        }
    }
}

impl ProvisionConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        Self::load_from(&path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

        tracing::debug!(
            "Loaded config from {:?}: env={}, hosts={:?}",
            path,
            config.env,
            config.hosts
        );

        Ok(config)
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;
        self.save_to(&path)
    }

    /// Save configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
                path: path.to_path_buf(),
                source: e,
            })?;
        }

        let content =
            toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))?;

        std::fs::write(path, content).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Get the default config file path
    pub fn config_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "deploykey").ok_or(ConfigError::NoConfigDir)?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Check the trigger variable name and host list.
    pub fn validate(&self) -> Result<()> {
        self.validate_env()?;

        if self.hosts.is_empty() {
            return Err(ConfigError::Invalid("at least one host is required".into()));
        }

        for host in &self.hosts {
            if !is_valid_host(host) {
                return Err(ConfigError::Invalid(format!(
                    "invalid host {:?}: must be non-empty without whitespace",
                    host
                )));
            }
        }

        Ok(())
    }

    /// Check only the trigger variable name. Cleanup never looks at hosts.
    pub fn validate_env(&self) -> Result<()> {
        if !is_valid_env_name(&self.env) {
            return Err(ConfigError::Invalid(format!(
                "'{}' is not a valid environment variable name",
                self.env
            )));
        }
        Ok(())
    }

    /// Absolute SSH directory the credentials are written to.
    ///
    /// Falls back to `.ssh` in the current user's home directory.
    pub fn resolve_ssh_dir(&self) -> Result<PathBuf> {
        let dir = match &self.ssh_dir {
            Some(raw) => {
                let expanded = shellexpand::full(raw)
                    .map_err(|e| ConfigError::Invalid(format!("ssh_dir {:?}: {}", raw, e)))?;
                PathBuf::from(expanded.as_ref())
            }
            None => BaseDirs::new()
                .ok_or(ConfigError::NoHomeDir)?
                .home_dir()
                .join(".ssh"),
        };

        std::path::absolute(&dir)
            .map_err(|e| ConfigError::Invalid(format!("ssh_dir {}: {}", dir.display(), e)))
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`
fn is_valid_env_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// A host is a single `Host` pattern, so whitespace would split it and
/// newlines would inject directives.
fn is_valid_host(host: &str) -> bool {
    !host.is_empty() && !host.chars().any(|c| c.is_whitespace() || c.is_control())
}
