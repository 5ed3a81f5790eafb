//! GitHub repository client: recursive tree listings and single-file contents.

pub mod url;

use crate::config::GitHubConfig;
use crate::error::{ExplorerError, Result};
use crate::models::{EntryKind, RepositoryRef, TreeEntry, TreeNode};
use crate::tree;
use async_trait::async_trait;
use base64::Engine as _;
use log::{debug, info, warn};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use ::url::Url;

pub use self::url::parse as parse_url;

const USER_AGENT: &str = concat!("repolens/", env!("CARGO_PKG_VERSION"));

/// Source of repository listings and file contents
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Lists every entry of the repository's default branch, `.git` internals excluded
    async fn list_files(&self, repository: &RepositoryRef) -> Result<Vec<TreeEntry>>;

    /// Fetches and decodes the content of one file
    async fn get_file_content(&self, repository: &RepositoryRef, path: &str) -> Result<String>;
}

/// Lists the repository and builds its tree
pub async fn load_tree(
    source: &dyn RepositorySource,
    repository: &RepositoryRef,
) -> Result<Vec<TreeNode>> {
    let entries = source.list_files(repository).await?;
    let roots = tree::build(&entries);
    info!(
        "Built tree for {} with {} entries ({} roots)",
        repository,
        entries.len(),
        roots.len()
    );
    Ok(roots)
}

/// Response of `GET /repos/{owner}/{repo}/git/trees/{branch}?recursive=1`
#[derive(Debug, Deserialize)]
struct TreeResponse {
    tree: Vec<RawTreeItem>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct RawTreeItem {
    path: String,
    #[serde(rename = "type")]
    item_type: String,
}

impl RawTreeItem {
    fn into_entry(self) -> Option<TreeEntry> {
        let kind = match self.item_type.as_str() {
            "blob" => EntryKind::File,
            "tree" => EntryKind::Directory,
            other => {
                debug!("Skipping {} entry {}", other, self.path);
                return None;
            }
        };
        Some(TreeEntry {
            path: self.path,
            kind,
        })
    }
}

/// Response of `GET /repos/{owner}/{repo}/contents/{path}` for a file
#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: Option<String>,
}

/// Decodes a contents-API payload into text
///
/// GitHub wraps base64 payloads at 60 columns, so whitespace is stripped
/// before decoding. Bytes that are not valid UTF-8 are replaced.
pub fn decode_content(content: &str, encoding: Option<&str>) -> Result<String> {
    match encoding {
        Some("base64") => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = base64::engine::general_purpose::STANDARD.decode(compact)?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Ok(content.to_string()),
    }
}

/// GitHub REST client
#[derive(Clone)]
pub struct GitHubClient {
    client: Client,
    config: GitHubConfig,
}

impl GitHubClient {
    /// Creates a new client from the GitHub section of the configuration
    pub fn new(config: GitHubConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_static(USER_AGENT));
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/vnd.github+json"),
        );
        if let Some(token) = config.token.as_deref().filter(|t| !t.trim().is_empty()) {
            let mut value = header::HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|e| ExplorerError::Config(format!("Invalid GitHub token: {}", e)))?;
            value.set_sensitive(true);
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .default_headers(headers)
            .build()
            .map_err(|e| ExplorerError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.config.api_base)?;
        url.path_segments_mut()
            .map_err(|_| {
                ExplorerError::Config(format!("Invalid GitHub API base: {}", self.config.api_base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn tree_url(&self, repository: &RepositoryRef, branch: &str) -> Result<Url> {
        let mut url = self.endpoint(&[
            "repos",
            &repository.owner,
            &repository.repo,
            "git",
            "trees",
            branch,
        ])?;
        url.query_pairs_mut().append_pair("recursive", "1");
        Ok(url)
    }

    fn contents_url(&self, repository: &RepositoryRef, path: &str) -> Result<Url> {
        let mut segments = vec![
            "repos",
            repository.owner.as_str(),
            repository.repo.as_str(),
            "contents",
        ];
        segments.extend(path.split('/').filter(|segment| !segment.is_empty()));
        self.endpoint(&segments)
    }

    async fn fetch_tree(
        &self,
        repository: &RepositoryRef,
        branch: &str,
    ) -> Result<reqwest::Response> {
        let url = self.tree_url(repository, branch)?;
        debug!("Requesting tree listing {}", url);
        self.client
            .get(url)
            .send()
            .await
            .map_err(|e| ExplorerError::Network(e.to_string()))
    }
}

#[async_trait]
impl RepositorySource for GitHubClient {
    async fn list_files(&self, repository: &RepositoryRef) -> Result<Vec<TreeEntry>> {
        let mut response = self.fetch_tree(repository, &self.config.primary_branch).await?;
        if !response.status().is_success() {
            warn!(
                "No tree for {} on {} (HTTP {}), trying {}",
                repository,
                self.config.primary_branch,
                response.status(),
                self.config.fallback_branch
            );
            response = self.fetch_tree(repository, &self.config.fallback_branch).await?;
        }

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ExplorerError::RepositoryNotFound(repository.to_string()));
        }
        if !status.is_success() {
            return Err(ExplorerError::Network(format!(
                "GitHub API request for {} failed: HTTP {}",
                repository, status
            )));
        }

        let listing: TreeResponse = response
            .json()
            .await
            .map_err(|e| ExplorerError::Network(format!("Unexpected tree listing: {}", e)))?;
        if listing.truncated {
            warn!("Tree listing for {} was truncated by GitHub", repository);
        }

        let entries: Vec<TreeEntry> = listing
            .tree
            .into_iter()
            .filter(|item| !tree::is_internal_metadata(&item.path))
            .filter_map(RawTreeItem::into_entry)
            .collect();
        info!("Listed {} entries for {}", entries.len(), repository);
        Ok(entries)
    }

    async fn get_file_content(&self, repository: &RepositoryRef, path: &str) -> Result<String> {
        let url = self.contents_url(repository, path)?;
        debug!("Requesting file content {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ExplorerError::Network(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ExplorerError::FileNotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(ExplorerError::Network(format!(
                "Failed to fetch file content for {}: HTTP {}",
                path, status
            )));
        }

        let payload: ContentResponse = response.json().await.map_err(|e| {
            ExplorerError::Network(format!("Unexpected content response for {}: {}", path, e))
        })?;
        decode_content(&payload.content, payload.encoding.as_deref()).map_err(|e| {
            ExplorerError::Network(format!("Undecodable content for {}: {}", path, e))
        })
    }
}
