#![allow(dead_code)]

use mockito::{Server, ServerGuard};
use repolens::config::{AssistantConfig, GitHubConfig};
use repolens::{GitHubClient, MemoryCredentialStore, OpenAiAssistant};
use std::sync::Arc;

pub mod test_helpers {
    use super::*;

    pub async fn setup_test_server() -> ServerGuard {
        Server::new_async().await
    }

    pub fn github_client(server: &ServerGuard) -> GitHubClient {
        GitHubClient::new(GitHubConfig {
            api_base: server.url(),
            ..GitHubConfig::default()
        })
        .expect("client builds")
    }

    pub fn assistant(server: &ServerGuard, key: Option<&str>) -> OpenAiAssistant {
        let store = match key {
            Some(key) => MemoryCredentialStore::with_key(key),
            None => MemoryCredentialStore::default(),
        };
        OpenAiAssistant::new(
            AssistantConfig {
                api_base: format!("{}/v1", server.url()),
                model: "test-model".to_string(),
                ..AssistantConfig::default()
            },
            Arc::new(store),
        )
        .expect("assistant builds")
    }

    /// Base64 the way the contents API returns it, wrapped at 60 columns
    pub fn github_base64(text: &str) -> String {
        use base64::Engine as _;
        let encoded = base64::engine::general_purpose::STANDARD.encode(text);
        encoded
            .as_bytes()
            .chunks(60)
            .map(|chunk| String::from_utf8_lossy(chunk).into_owned())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn setup_test_logger() {
        let _ = env_logger::builder()
            .filter_level(log::LevelFilter::Debug)
            .is_test(true)
            .try_init();
    }
}
