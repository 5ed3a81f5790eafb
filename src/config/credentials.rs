use super::APP_DIR;
use crate::error::{ExplorerError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::RwLock;

/// Fixed key the assistant API key is stored under
pub const API_KEY_FIELD: &str = "openai_api_key";

/// Client-local storage for the single assistant credential
pub trait CredentialStore: Send + Sync {
    /// Reads the stored key; blank values read as absent
    fn load(&self) -> Result<Option<String>>;

    /// Stores the key, replacing any previous one
    fn save(&self, key: &str) -> Result<()>;

    /// Removes the stored key
    fn clear(&self) -> Result<()>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredCredentials {
    #[serde(rename = "openai_api_key", default, skip_serializing_if = "Option::is_none")]
    api_key: Option<String>,
}

fn non_blank(key: Option<String>) -> Option<String> {
    key.filter(|k| !k.trim().is_empty())
}

/// Keeps the credential in a TOML file under the user's config directory
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    /// Creates a store backed by `path`
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// `<config_dir>/repolens/credentials.toml`
    pub fn default_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| ExplorerError::Config("Could not determine config directory".into()))?;
        Ok(config_dir.join(APP_DIR).join("credentials.toml"))
    }

    /// Path of the backing file
    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn write(&self, stored: &StoredCredentials) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                ExplorerError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }
        let content = toml::to_string(stored)?;
        fs::write(&self.path, content)
            .map_err(|e| ExplorerError::Config(format!("Failed to write credentials: {}", e)))
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .map_err(|e| ExplorerError::Config(format!("Failed to read credentials: {}", e)))?;
        let stored: StoredCredentials = toml::from_str(&content)?;
        Ok(non_blank(stored.api_key))
    }

    fn save(&self, key: &str) -> Result<()> {
        self.write(&StoredCredentials {
            api_key: Some(key.to_string()),
        })
    }

    fn clear(&self) -> Result<()> {
        if self.path.exists() {
            self.write(&StoredCredentials::default())?;
        }
        Ok(())
    }
}

/// In-memory store, for tests and ephemeral sessions
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    key: RwLock<Option<String>>,
}

impl MemoryCredentialStore {
    /// Creates a store already holding `key`
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: RwLock::new(Some(key.into())),
        }
    }
}

fn poisoned<T>(_: T) -> ExplorerError {
    ExplorerError::Config("Credential store lock poisoned".into())
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<String>> {
        Ok(non_blank(self.key.read().map_err(poisoned)?.clone()))
    }

    fn save(&self, key: &str) -> Result<()> {
        *self.key.write().map_err(poisoned)? = Some(key.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.key.write().map_err(poisoned)? = None;
        Ok(())
    }
}
