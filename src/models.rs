//! Data types shared by the repository client, the assistant and the session.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies the remote repository every fetch of a session targets
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryRef {
    /// Owner (user or organization) of the repository
    pub owner: String,
    /// Name of the repository
    pub repo: String,
}

impl RepositoryRef {
    /// Creates a new repository reference
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
        }
    }
}

impl fmt::Display for RepositoryRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// Kind of a repository entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// A regular file (`blob` in the GitHub listing)
    File,
    /// A directory (`tree` in the GitHub listing)
    Directory,
}

impl EntryKind {
    /// Returns `true` for directories
    pub fn is_directory(self) -> bool {
        matches!(self, Self::Directory)
    }
}

/// A single file or directory record as reported by the remote listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    /// Slash-separated, repository-root-relative path
    pub path: String,
    /// File or directory
    pub kind: EntryKind,
}

impl TreeEntry {
    /// Creates a file entry
    pub fn file(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::File,
        }
    }

    /// Creates a directory entry
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: EntryKind::Directory,
        }
    }
}

/// An entry once placed into the hierarchical in-memory tree
///
/// `children` is `Some` exactly when `kind` is [`EntryKind::Directory`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Path of the entry this node was built from
    pub path: String,
    /// File or directory
    pub kind: EntryKind,
    /// Child nodes, present only for directories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<TreeNode>>,
}

impl TreeNode {
    /// Creates a childless node for an entry
    pub fn from_entry(entry: &TreeEntry) -> Self {
        Self {
            path: entry.path.clone(),
            kind: entry.kind,
            children: entry.kind.is_directory().then(Vec::new),
        }
    }

    /// Returns `true` for directories
    pub fn is_directory(&self) -> bool {
        self.kind.is_directory()
    }

    /// Last path segment, used as the display name
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Child nodes; empty for files
    pub fn children(&self) -> &[TreeNode] {
        self.children.as_deref().unwrap_or_default()
    }

    /// Finds a node by path in this subtree, depth first
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        if self.path == path {
            return Some(self);
        }
        self.children().iter().find_map(|child| child.find(path))
    }
}

/// Author of a transcript message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person using the session
    User,
    /// The AI assistant
    Assistant,
}

/// One immutable message of the chat transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: String,
    /// Author of the message
    pub role: Role,
    /// Message text
    pub content: String,
}

impl Message {
    /// Creates a message with a fresh unique id
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
        }
    }

    /// Creates a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Creates an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}
