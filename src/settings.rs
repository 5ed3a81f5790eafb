//! Saving and clearing the assistant API key.

use crate::assistant::Assistant;
use crate::config::CredentialStore;
use crate::error::{ExplorerError, Result};
use log::info;

/// Verifies `key` with the provider and stores it when accepted
pub async fn save_api_key(
    assistant: &dyn Assistant,
    store: &dyn CredentialStore,
    key: &str,
) -> Result<()> {
    let key = key.trim();
    if key.is_empty() {
        return Err(ExplorerError::Config("Please enter an API key".into()));
    }
    if !assistant.verify_credential(key).await {
        return Err(ExplorerError::InvalidCredential);
    }
    store.save(key)?;
    info!("API key saved");
    Ok(())
}

/// Removes the stored API key
pub fn clear_api_key(store: &dyn CredentialStore) -> Result<()> {
    store.clear()?;
    info!("API key removed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MemoryCredentialStore;
    use crate::models::Message;
    use async_trait::async_trait;

    struct KeyChecker {
        accepted: &'static str,
    }

    #[async_trait]
    impl Assistant for KeyChecker {
        async fn ask(&self, _: &[Message], _: Option<&str>, _: Option<&str>) -> Result<String> {
            Ok(String::new())
        }

        async fn verify_credential(&self, key: &str) -> bool {
            key == self.accepted
        }
    }

    #[tokio::test]
    async fn test_saves_verified_key_trimmed() -> Result<()> {
        let store = MemoryCredentialStore::default();
        let checker = KeyChecker { accepted: "sk-good" };

        save_api_key(&checker, &store, "  sk-good \n").await?;
        assert_eq!(store.load()?, Some("sk-good".to_string()));

        clear_api_key(&store)?;
        assert_eq!(store.load()?, None);
        Ok(())
    }

    #[tokio::test]
    async fn test_rejects_blank_and_invalid_keys() -> Result<()> {
        let store = MemoryCredentialStore::with_key("sk-old");
        let checker = KeyChecker { accepted: "sk-good" };

        assert!(matches!(
            save_api_key(&checker, &store, "   ").await,
            Err(ExplorerError::Config(_))
        ));
        assert!(matches!(
            save_api_key(&checker, &store, "sk-bad").await,
            Err(ExplorerError::InvalidCredential)
        ));
        assert_eq!(store.load()?, Some("sk-old".to_string()));
        Ok(())
    }
}
