//! Checkout detection for `fleet-detector`.
//!
//! `detect_repo(path)` opens a working copy with libgit2 and returns which
//! remote repository it tracks. Nothing is executed, so detection is cheap
//! enough to run on every workspace entry before any `git` call is made.
//! Linked worktrees and `gitdir:` files resolve to the shared repository
//! config, so a worktree reports the same remote as its main checkout.
//!
//! Remote sources are checked in priority order: `origin` first, then
//! `upstream`, then the first remote declared in the config.

use std::path::{Path, PathBuf};

use fleet_core::types::{Owner, RepoHandle, RepoName};
use git2::Repository;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Confidence level of a detected remote identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confidence {
    /// Owner and name parsed from a remote URL.
    High,
    /// No usable remote; the name comes from the directory.
    Medium,
}

/// What a checkout on disk tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedRepo {
    pub path: PathBuf,
    /// Remote owner, if a remote URL could be parsed.
    pub owner: Option<Owner>,
    pub name: RepoName,
    /// URL of the preferred remote, parseable or not.
    pub remote_url: Option<String>,
    pub confidence: Confidence,
}

impl DetectedRepo {
    /// Turn the detection into a handle, falling back to `default_owner`
    /// when the remote owner is unknown.
    pub fn into_handle(self, default_owner: &Owner) -> RepoHandle {
        RepoHandle {
            owner: self.owner.unwrap_or_else(|| default_owner.clone()),
            name: self.name,
            path: self.path,
        }
    }
}

/// Errors from checkout detection.
#[derive(Debug, Error)]
pub enum DetectError {
    #[error("git error at {path}: {source}")]
    Git {
        path: PathBuf,
        #[source]
        source: git2::Error,
    },

    #[error("'{path}' is not a git checkout (no .git entry found)")]
    NotACheckout { path: PathBuf },
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Detect the remote identity of the checkout at `path`.
///
/// Returns `DetectError::NotACheckout` if `path` has no `.git` entry.
pub fn detect_repo(path: &Path) -> Result<DetectedRepo, DetectError> {
    if !path.join(".git").exists() {
        return Err(DetectError::NotACheckout {
            path: path.to_path_buf(),
        });
    }
    let git_err = |source| DetectError::Git {
        path: path.to_path_buf(),
        source,
    };
    let repo = Repository::open(path).map_err(git_err)?;
    let url = preferred_remote_url(&repo).map_err(git_err)?;

    if let Some((owner, name)) = url.as_deref().and_then(parse_remote_url) {
        return Ok(DetectedRepo {
            path: path.to_path_buf(),
            owner: Some(Owner::from(owner)),
            name: RepoName::from(name),
            remote_url: url,
            confidence: Confidence::High,
        });
    }

    let dir_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(DetectedRepo {
        path: path.to_path_buf(),
        owner: None,
        name: RepoName::from(dir_name),
        remote_url: url,
        confidence: Confidence::Medium,
    })
}

/// Split a GitHub remote URL into `(owner, name)`.
///
/// Accepts `https://host/owner/name(.git)`, `ssh://git@host/owner/name.git`
/// and scp-style `git@host:owner/name.git`.
pub fn parse_remote_url(url: &str) -> Option<(String, String)> {
    let url = url.trim();
    let path = if let Some(rest) = url.split_once("://").map(|(_, rest)| rest) {
        // Drop the authority (user@host:port).
        rest.split_once('/').map(|(_, path)| path)?
    } else if let Some((_, path)) = url.split_once(':') {
        path
    } else {
        return None;
    };

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.rsplitn(2, '/');
    let name = parts.next()?;
    let owner = parts.next()?.rsplit('/').next()?;
    if owner.is_empty() || name.is_empty() {
        return None;
    }
    Some((owner.to_string(), name.to_string()))
}

// ---------------------------------------------------------------------------
// Remote lookup
// ---------------------------------------------------------------------------

fn preferred_remote_url(repo: &Repository) -> Result<Option<String>, git2::Error> {
    let remotes = repo.remotes()?;
    let names: Vec<&str> = remotes.iter().flatten().collect();
    let preferred = ["origin", "upstream"]
        .into_iter()
        .find(|want| names.contains(want))
        .or_else(|| names.first().copied());
    let Some(name) = preferred else {
        return Ok(None);
    };
    let remote = repo.find_remote(name)?;
    Ok(remote.url().map(str::to_string))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_https_url() {
        assert_eq!(
            parse_remote_url("https://github.com/OBDb/Toyota-Camry.git"),
            Some(("OBDb".into(), "Toyota-Camry".into()))
        );
    }

    #[test]
    fn parses_scp_url() {
        assert_eq!(
            parse_remote_url("git@github.com:OBDb/Ford-F-150.git"),
            Some(("OBDb".into(), "Ford-F-150".into()))
        );
    }

    #[test]
    fn rejects_bare_word() {
        assert_eq!(parse_remote_url("origin"), None);
    }
}
