use crate::models::{Message, Role};
use serde::{Deserialize, Serialize};

/// Number of most recent transcript messages sent with each request
pub const HISTORY_WINDOW: usize = 10;

/// Role of a message in an outbound prompt
///
/// `System` only ever exists here, never in a transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PromptRole {
    /// Context header built from the current file
    System,
    /// A user transcript message
    User,
    /// An assistant transcript message
    Assistant,
}

impl From<Role> for PromptRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Self::User,
            Role::Assistant => Self::Assistant,
        }
    }
}

/// One message of a chat-completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMessage {
    /// Author role on the wire
    pub role: PromptRole,
    /// Message text
    pub content: String,
}

/// Lower-cased extension of the last path segment, empty when there is none
pub fn file_extension(path: Option<&str>) -> String {
    path.and_then(|p| p.rsplit('/').next())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(stem, ext)| if stem.is_empty() { "" } else { ext })
        .unwrap_or_default()
        .to_lowercase()
}

/// Context header naming the file's extension and embedding its content verbatim
pub fn context_header(content: &str, path: Option<&str>) -> String {
    let extension = file_extension(path);
    let described = if extension.is_empty() {
        "plain text".to_string()
    } else {
        format!(".{}", extension)
    };
    let location = path.map(|p| format!(" at `{}`", p)).unwrap_or_default();

    format!(
        "You are an expert software engineer helping a developer understand source code \
         from a GitHub repository. The developer is viewing a {described} file{location}. \
         Answer questions about it accurately and concisely.\n\n\
         File content:\n```{extension}\n{content}\n```"
    )
}

/// Builds the outbound prompt: one system message, then the last
/// [`HISTORY_WINDOW`] transcript messages, oldest first
pub fn build_prompt(history: &[Message], content: &str, path: Option<&str>) -> Vec<PromptMessage> {
    let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
    let mut messages = Vec::with_capacity(recent.len() + 1);
    messages.push(PromptMessage {
        role: PromptRole::System,
        content: context_header(content, path),
    });
    messages.extend(recent.iter().map(|message| PromptMessage {
        role: message.role.into(),
        content: message.content.clone(),
    }));
    messages
}
