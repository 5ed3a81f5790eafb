#![doc = include_str!("../README.md")]
#![warn(missing_docs)]
#![warn(clippy::all)]

//! ## Modules
//! - [`github`]: URL parsing and the GitHub REST client
//! - [`tree`]: building the file tree from a flat listing
//! - [`assistant`]: prompt construction and the chat-completion client
//! - [`session`]: the session state machine driven by user intents
//! - [`settings`]: verifying and storing the assistant API key
//!
//! ## Usage
//! ```rust,no_run
//! use repolens::{Config, GitHubClient, OpenAiAssistant, Session, FileCredentialStore};
//! use std::sync::Arc;
//!
//! async fn example() -> repolens::Result<()> {
//!     let config = Config::load()?;
//!     let credentials = Arc::new(FileCredentialStore::new(config.credentials_path()?));
//!     let session = Session::new(
//!         Arc::new(GitHubClient::new(config.github.clone())?),
//!         Arc::new(OpenAiAssistant::new(config.assistant.clone(), credentials)?),
//!     );
//!
//!     session.submit_repository("https://github.com/rust-lang/log").await;
//!     session.select_path("src/lib.rs").await;
//!     session.send_message("What does this file do?").await;
//!     Ok(())
//! }
//! ```

/// Assistant client and prompt construction
pub mod assistant;
/// Configuration and credential storage
pub mod config;
/// Error handling types and utilities
pub mod error;
/// GitHub URL parsing and REST client
pub mod github;
/// Logging configuration and utilities
pub mod logging;
/// Shared data types
pub mod models;
/// Session state and user intents
pub mod session;
/// API key management
pub mod settings;
/// File tree construction
pub mod tree;

pub use assistant::{Assistant, OpenAiAssistant, NO_CREDENTIAL_REPLY, NO_FILE_REPLY};
pub use config::{Config, CredentialStore, FileCredentialStore, MemoryCredentialStore};
pub use error::{ExplorerError, Result};
pub use github::{GitHubClient, RepositorySource};
pub use models::{EntryKind, Message, RepositoryRef, Role, TreeEntry, TreeNode};
pub use session::{Notice, NoticeLevel, Session, SessionState, APOLOGY_REPLY};
