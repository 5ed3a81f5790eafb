mod credentials;

use crate::error::{ExplorerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

pub use credentials::{CredentialStore, FileCredentialStore, MemoryCredentialStore, API_KEY_FIELD};

/// Directory name used under the platform configuration directory
pub const APP_DIR: &str = "repolens";

/// Main configuration struct for the application
///
/// Every field has a default, so a config file only needs the values it
/// wants to change.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the assistant API key is kept; defaults to the config directory
    pub credentials_path: Option<PathBuf>,
    /// GitHub API settings
    pub github: GitHubConfig,
    /// Chat-completion provider settings
    pub assistant: AssistantConfig,
}

/// Settings for the GitHub REST client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// Base URL of the GitHub REST API
    pub api_base: String,
    /// Optional token sent as a bearer credential
    pub token: Option<String>,
    /// Branch tried first when listing a repository
    pub primary_branch: String,
    /// Branch tried once when the primary one is missing
    pub fallback_branch: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Settings for the chat-completion provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Base URL of an OpenAI-compatible API
    pub api_base: String,
    /// Model identifier sent with every request
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.github.com".to_string(),
            token: None,
            primary_branch: "main".to_string(),
            fallback_branch: "master".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.2,
            timeout_secs: 60,
        }
    }
}

impl Config {
    /// Path of the default config file, `<config_dir>/repolens/config.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ExplorerError::Config("Could not find config directory".into()))?;
        Ok(config_dir.join(APP_DIR).join("config.toml"))
    }

    /// Loads configuration from the default config file location
    ///
    /// If the config file doesn't exist, returns the default configuration.
    /// Environment overrides are applied either way.
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        let mut config = if path.exists() {
            Self::from_file(&path)?
        } else {
            Self::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Reads a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            ExplorerError::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Serializes the configuration to TOML text
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Applies `GITHUB_TOKEN` from the environment when set and non-empty
    pub fn apply_env_overrides(&mut self) {
        if let Some(token) = get_env_value("GITHUB_TOKEN") {
            self.github.token = Some(token);
        }
    }

    /// Checks that the configuration is usable
    pub fn validate(&self) -> Result<()> {
        if let Some(token) = &self.github.token {
            if token.trim().is_empty() {
                return Err(ExplorerError::Config("GitHub token is empty".into()));
            }
        }
        for base in [&self.github.api_base, &self.assistant.api_base] {
            let url = Url::parse(base)
                .map_err(|e| ExplorerError::Config(format!("Invalid API base {}: {}", base, e)))?;
            if url.cannot_be_a_base() {
                return Err(ExplorerError::Config(format!("Invalid API base {}", base)));
            }
        }
        if self.github.primary_branch.trim().is_empty()
            || self.github.fallback_branch.trim().is_empty()
        {
            return Err(ExplorerError::Config("Branch names must not be empty".into()));
        }
        if self.github.primary_branch == self.github.fallback_branch {
            return Err(ExplorerError::Config(
                "Primary and fallback branches must differ".into(),
            ));
        }
        if self.assistant.model.trim().is_empty() {
            return Err(ExplorerError::Config("Assistant model is empty".into()));
        }
        Ok(())
    }

    /// Path of the credential file, explicit or under the config directory
    pub fn credentials_path(&self) -> Result<PathBuf> {
        match &self.credentials_path {
            Some(path) => Ok(path.clone()),
            None => FileCredentialStore::default_path(),
        }
    }
}

/// Reads an environment variable, treating empty values as unset
pub fn get_env_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
