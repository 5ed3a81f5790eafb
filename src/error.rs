use std::io;
use thiserror::Error;

/// Custom result type alias for the crate
pub type Result<T> = std::result::Result<T, ExplorerError>;

/// Errors that can occur while loading repositories or talking to the assistant
#[derive(Debug, Error)]
pub enum ExplorerError {
    /// The submitted string is not a GitHub repository URL
    #[error("Invalid GitHub repository URL: {0}")]
    InvalidUrl(String),

    /// The repository tree could not be found on any default branch
    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    /// A single file could not be found in the repository
    #[error("File not found: {0}")]
    FileNotFound(String),

    /// Network connectivity or unexpected HTTP status errors
    #[error("Network error: {0}")]
    Network(String),

    /// The chat-completion provider failed or returned a non-success response
    #[error("Assistant error: {0}")]
    Assistant(String),

    /// The provider rejected the request for quota or rate-limit reasons
    #[error("Assistant quota exceeded: {0}")]
    QuotaExceeded(String),

    /// No assistant credential is configured; rendered as guidance, not a failure
    #[error("No API key configured")]
    NoCredential,

    /// The provider refused the supplied credential
    #[error("Invalid API key")]
    InvalidCredential,

    /// Configuration errors
    #[error("Config error: {0}")]
    Config(String),

    /// HTTP request/response errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON parsing/serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Base64 payload decoding errors
    #[error("Decode error: {0}")]
    Decode(#[from] base64::DecodeError),

    /// TOML deserialization errors
    #[error("TOML error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization errors
    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// I/O errors
    #[error("IO error: {0}")]
    IO(#[from] io::Error),
}

impl ExplorerError {
    /// Checks if this error came from the assistant provider, quota included
    pub fn is_assistant_error(&self) -> bool {
        matches!(self, Self::Assistant(_) | Self::QuotaExceeded(_))
    }

    /// Checks if this error is the quota / rate-limit sub-case
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, Self::QuotaExceeded(_))
    }
}
