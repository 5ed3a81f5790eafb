use crate::error::{ExplorerError, Result};
use crate::models::RepositoryRef;
use once_cell::sync::Lazy;
use regex::Regex;

static GITHUB_REPO_URL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?:^|[/.@])github\.com/([^/?#\s]+)/([^/?#\s]+)")
        .expect("GitHub URL pattern is valid")
});

/// Extracts the owner and repository name from a GitHub repository URL
///
/// Accepts anything of the shape `.../github.com/<owner>/<repo>[...]`,
/// with or without a scheme. A trailing `.git` on the repository is dropped.
pub fn parse(url: &str) -> Result<RepositoryRef> {
    let input = url.trim();
    let captures = GITHUB_REPO_URL
        .captures(input)
        .ok_or_else(|| ExplorerError::InvalidUrl(input.to_string()))?;

    let owner = &captures[1];
    let repo = captures[2].strip_suffix(".git").unwrap_or(&captures[2]);
    if owner.is_empty() || repo.is_empty() {
        return Err(ExplorerError::InvalidUrl(input.to_string()));
    }

    Ok(RepositoryRef::new(owner, repo))
}
