//! Session state
//!
//! [`Session`] owns the single [`SessionState`] aggregate and is the only
//! thing that mutates it. Intents take `&self`: the state lock is held only
//! between network calls, so an intent issued while another is suspended sees
//! the busy flags exactly as a user interface would.

use crate::assistant::Assistant;
use crate::error::ExplorerError;
use crate::github::{self, RepositorySource};
use crate::models::{Message, RepositoryRef, TreeNode};
use log::{debug, info, warn};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Assistant message appended when a request fails
pub const APOLOGY_REPLY: &str =
    "Sorry, I encountered an error processing your question. Please try again.";

/// Severity of a transient notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// Something finished successfully
    Success,
    /// Something failed
    Error,
}

/// A message meant to be shown to the user exactly once
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity
    pub level: NoticeLevel,
    /// Text to show
    pub text: String,
}

impl Notice {
    /// Creates a success notice
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    /// Creates an error notice
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Everything the user interface renders
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// URL of the last submission
    pub url: Option<String>,
    /// Repository the session is bound to, once loaded
    pub repository: Option<RepositoryRef>,
    /// Root nodes of the loaded tree
    pub tree: Vec<TreeNode>,
    /// A repository load is outstanding
    pub loading: bool,
    /// Sticky error of the last repository load
    pub last_error: Option<String>,
    /// Path of the selected file
    pub selected_path: Option<String>,
    /// Content of the selected file, once fetched
    pub selected_content: Option<String>,
    /// Chat messages, oldest first
    pub transcript: Vec<Message>,
    /// An assistant request is outstanding
    pub assistant_busy: bool,
    notices: VecDeque<Notice>,
    generation: u64,
}

impl SessionState {
    fn reset_for(&mut self, url: &str) {
        self.generation += 1;
        self.url = Some(url.to_string());
        self.repository = None;
        self.tree.clear();
        self.loading = true;
        self.last_error = None;
        self.selected_path = None;
        self.selected_content = None;
        self.transcript.clear();
        self.assistant_busy = false;
    }
}

/// An interactive session over one repository at a time
pub struct Session {
    repositories: Arc<dyn RepositorySource>,
    assistant: Arc<dyn Assistant>,
    state: Mutex<SessionState>,
}

impl Session {
    /// Creates an empty session
    pub fn new(repositories: Arc<dyn RepositorySource>, assistant: Arc<dyn Assistant>) -> Self {
        Self {
            repositories,
            assistant,
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Copy of the current state for rendering
    pub async fn snapshot(&self) -> SessionState {
        self.state.lock().await.clone()
    }

    /// Drains pending notices; each one is returned once
    pub async fn take_notices(&self) -> Vec<Notice> {
        self.state.lock().await.notices.drain(..).collect()
    }

    /// Loads the repository at `url`, replacing whatever was loaded before
    ///
    /// Ignored while another load is outstanding.
    pub async fn submit_repository(&self, url: &str) {
        {
            let mut state = self.state.lock().await;
            if state.loading {
                warn!("Ignoring {}: a repository is already loading", url);
                return;
            }
            state.reset_for(url);
        }

        let result = match github::parse_url(url) {
            Ok(repository) => github::load_tree(self.repositories.as_ref(), &repository)
                .await
                .map(|tree| (repository, tree)),
            Err(e) => Err(e),
        };

        let mut state = self.state.lock().await;
        state.loading = false;
        match result {
            Ok((repository, tree)) => {
                info!("Loaded repository {}", repository);
                state.notices.push_back(Notice::success(format!(
                    "Successfully loaded repository: {}",
                    repository
                )));
                state.repository = Some(repository);
                state.tree = tree;
                state.last_error = None;
            }
            Err(e) => {
                warn!("Failed to load repository {}: {}", url, e);
                state.last_error = Some(e.to_string());
                state.notices.push_back(Notice::error(
                    "Failed to load repository. Please check the URL and try again.",
                ));
            }
        }
    }

    /// Selects a file and fetches its content; directories are ignored
    ///
    /// Overlapping selections are not cancelled: whichever fetch completes
    /// last sets `selected_content`.
    pub async fn select_file(&self, node: &TreeNode) {
        if node.is_directory() {
            return;
        }

        let (repository, generation) = {
            let mut state = self.state.lock().await;
            let Some(repository) = state.repository.clone() else {
                state
                    .notices
                    .push_back(Notice::error("Load a repository before selecting a file."));
                return;
            };
            state.selected_path = Some(node.path.clone());
            (repository, state.generation)
        };

        let result = self
            .repositories
            .get_file_content(&repository, &node.path)
            .await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!("Dropping content of {} fetched for a previous repository", node.path);
            return;
        }
        match result {
            Ok(content) => state.selected_content = Some(content),
            Err(e) => {
                warn!("Error fetching file content for {}: {}", node.path, e);
                state.selected_content = None;
                state
                    .notices
                    .push_back(Notice::error(format!("Failed to load file: {}", node.path)));
            }
        }
    }

    /// Selects a node by path in the loaded tree
    ///
    /// Returns `false` when no node has that path.
    pub async fn select_path(&self, path: &str) -> bool {
        let node = {
            let state = self.state.lock().await;
            crate::tree::find(&state.tree, path).cloned()
        };
        match node {
            Some(node) => {
                self.select_file(&node).await;
                true
            }
            None => false,
        }
    }

    /// Sends a chat message about the selected file
    ///
    /// A no-op while the assistant is busy or when `text` is blank. Otherwise
    /// exactly one user and one assistant message are appended.
    pub async fn send_message(&self, text: &str) {
        let (history, content, path, generation) = {
            let mut state = self.state.lock().await;
            if state.assistant_busy {
                debug!("Assistant busy, ignoring message");
                return;
            }
            if text.trim().is_empty() {
                return;
            }
            state.transcript.push(Message::user(text));
            state.assistant_busy = true;
            (
                state.transcript.clone(),
                state.selected_content.clone(),
                state.selected_path.clone(),
                state.generation,
            )
        };

        let result = self
            .assistant
            .ask(&history, content.as_deref(), path.as_deref())
            .await;

        let mut state = self.state.lock().await;
        if state.generation != generation {
            debug!("Dropping assistant reply for a previous repository");
            return;
        }
        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                state.notices.push_back(Notice::error(failure_notice(&e)));
                APOLOGY_REPLY.to_string()
            }
        };
        state.transcript.push(Message::assistant(reply));
        state.assistant_busy = false;
    }
}

fn failure_notice(error: &ExplorerError) -> String {
    if error.is_quota_exceeded() {
        "The assistant's quota or rate limit was exceeded. Check your plan or try again later."
            .to_string()
    } else {
        "Failed to process your question".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::github::MockRepositorySource;
    use crate::models::{Role, TreeEntry};
    use async_trait::async_trait;
    use pretty_assertions::assert_eq;

    /// Replies with a fixed text, or fails with a quota error when `None`
    struct FixedAssistant(Option<String>);

    #[async_trait]
    impl Assistant for FixedAssistant {
        async fn ask(&self, _: &[Message], _: Option<&str>, _: Option<&str>) -> Result<String> {
            self.0
                .clone()
                .ok_or_else(|| ExplorerError::QuotaExceeded("insufficient_quota".into()))
        }

        async fn verify_credential(&self, _: &str) -> bool {
            true
        }
    }

    fn listing() -> Vec<TreeEntry> {
        vec![
            TreeEntry::file("a.txt"),
            TreeEntry::directory("dir"),
            TreeEntry::file("dir/b.txt"),
        ]
    }

    fn session_with(source: MockRepositorySource, reply: Option<String>) -> Session {
        Session::new(Arc::new(source), Arc::new(FixedAssistant(reply)))
    }

    #[tokio::test]
    async fn test_submit_loads_tree() {
        let mut source = MockRepositorySource::new();
        source
            .expect_list_files()
            .withf(|repository| repository.owner == "acme" && repository.repo == "widgets")
            .times(1)
            .returning(|_| Ok(listing()));
        let session = session_with(source, Some("ok".into()));

        session.submit_repository("https://github.com/acme/widgets").await;

        let state = session.snapshot().await;
        assert!(!state.loading);
        assert_eq!(state.last_error, None);
        assert_eq!(state.repository, Some(RepositoryRef::new("acme", "widgets")));
        let roots: Vec<&str> = state.tree.iter().map(|n| n.path.as_str()).collect();
        assert_eq!(roots, vec!["a.txt", "dir"]);
        assert_eq!(state.tree[1].children()[0].path, "dir/b.txt");

        let notices = session.take_notices().await;
        assert_eq!(notices, vec![Notice::success("Successfully loaded repository: acme/widgets")]);
        assert!(session.take_notices().await.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_url_is_sticky_error() {
        let mut source = MockRepositorySource::new();
        source.expect_list_files().never();
        let session = session_with(source, Some("ok".into()));

        session.submit_repository("https://example.com/acme/widgets").await;

        let state = session.snapshot().await;
        assert!(!state.loading);
        assert!(state.tree.is_empty());
        assert!(state.repository.is_none());
        assert!(state.last_error.unwrap().starts_with("Invalid GitHub repository URL"));
    }

    #[tokio::test]
    async fn test_submit_resets_previous_session() {
        let mut source = MockRepositorySource::new();
        let mut calls = 0;
        source.expect_list_files().times(2).returning(move |repository| {
            calls += 1;
            if calls == 1 {
                Ok(listing())
            } else {
                Err(ExplorerError::RepositoryNotFound(repository.to_string()))
            }
        });
        source
            .expect_get_file_content()
            .returning(|_, _| Ok("hello".to_string()));
        let session = session_with(source, Some("reply".into()));

        session.submit_repository("https://github.com/acme/widgets").await;
        assert!(session.select_path("a.txt").await);
        session.send_message("what is this?").await;
        assert_eq!(session.snapshot().await.transcript.len(), 2);

        session.submit_repository("https://github.com/acme/gone").await;
        let state = session.snapshot().await;
        assert!(state.tree.is_empty());
        assert!(state.transcript.is_empty());
        assert_eq!(state.selected_path, None);
        assert_eq!(state.selected_content, None);
        assert_eq!(state.last_error.as_deref(), Some("Repository not found: acme/gone"));
    }

    #[tokio::test]
    async fn test_select_directory_is_noop() {
        let mut source = MockRepositorySource::new();
        source.expect_list_files().returning(|_| Ok(listing()));
        source.expect_get_file_content().never();
        let session = session_with(source, Some("ok".into()));

        session.submit_repository("https://github.com/acme/widgets").await;
        assert!(session.select_path("dir").await);
        assert!(!session.select_path("nope").await);

        let state = session.snapshot().await;
        assert_eq!(state.selected_path, None);
    }

    #[tokio::test]
    async fn test_file_error_is_transient() {
        let mut source = MockRepositorySource::new();
        source.expect_list_files().returning(|_| Ok(listing()));
        source
            .expect_get_file_content()
            .times(1)
            .returning(|_, path| Err(ExplorerError::FileNotFound(path.to_string())));
        let session = session_with(source, Some("ok".into()));
        session.submit_repository("https://github.com/acme/widgets").await;
        session.take_notices().await;

        session.select_path("dir/b.txt").await;

        let state = session.snapshot().await;
        assert_eq!(state.selected_path.as_deref(), Some("dir/b.txt"));
        assert_eq!(state.selected_content, None);
        assert_eq!(state.last_error, None);
        assert_eq!(
            session.take_notices().await,
            vec![Notice::error("Failed to load file: dir/b.txt")]
        );
    }

    #[tokio::test]
    async fn test_select_without_repository() {
        let mut source = MockRepositorySource::new();
        source.expect_get_file_content().never();
        let session = session_with(source, Some("ok".into()));

        session.select_file(&TreeNode::from_entry(&TreeEntry::file("a.txt"))).await;

        assert_eq!(session.snapshot().await.selected_path, None);
        assert_eq!(session.take_notices().await.len(), 1);
    }

    #[tokio::test]
    async fn test_blank_message_is_ignored() {
        let session = session_with(MockRepositorySource::new(), Some("ok".into()));

        session.send_message("   \n").await;

        let state = session.snapshot().await;
        assert!(state.transcript.is_empty());
        assert!(!state.assistant_busy);
    }

    #[tokio::test]
    async fn test_failed_ask_appends_apology() {
        let session = session_with(MockRepositorySource::new(), None);

        session.send_message("explain").await;

        let state = session.snapshot().await;
        assert!(!state.assistant_busy);
        let roles: Vec<Role> = state.transcript.iter().map(|m| m.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant]);
        assert_eq!(state.transcript[1].content, APOLOGY_REPLY);

        let notices = session.take_notices().await;
        assert_eq!(notices.len(), 1);
        assert!(notices[0].text.contains("quota"));
    }
}
