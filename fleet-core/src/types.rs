//! Domain types shared by every fleet crate.
//!
//! Nothing here is persisted: repository handles and sync states are
//! re-derived from git and GitHub on every run.

use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// Name of a repository (the last path segment of `owner/name`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RepoName(pub String);

impl fmt::Display for RepoName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for RepoName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RepoName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// A GitHub organization or user that owns repositories.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Owner(pub String);

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Owner {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Owner {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Name of the branch that carries an in-flight bulk change.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeBranch(pub String);

impl Default for ChangeBranch {
    fn default() -> Self {
        Self("wip".to_string())
    }
}

impl fmt::Display for ChangeBranch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for ChangeBranch {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl ChangeBranch {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// ---------------------------------------------------------------------------
// Repository handle
// ---------------------------------------------------------------------------

/// A local working copy together with the remote it tracks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoHandle {
    pub owner: Owner,
    pub name: RepoName,
    /// Absolute or workspace-relative path of the checkout.
    pub path: PathBuf,
}

impl RepoHandle {
    pub fn new(owner: impl Into<Owner>, name: impl Into<RepoName>, path: impl Into<PathBuf>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            path: path.into(),
        }
    }

    /// `owner/name`, as accepted by `gh --repo`.
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for RepoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// Sync state
// ---------------------------------------------------------------------------

/// Synchronization state of one repository at observation time.
///
/// Precedence when several conditions hold:
/// 1. `DirtyUncommitted`
/// 2. `PendingLocalBranch`
/// 3. `PendingRemoteBranch` (remote branch, no open PR)
/// 4. `OpenPullRequest`
/// 5. `Clean`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncState {
    Clean,
    DirtyUncommitted,
    PendingLocalBranch,
    PendingRemoteBranch,
    OpenPullRequest { pr: PullRequestRef },
}

impl SyncState {
    /// Stable machine-readable key.
    pub fn key(&self) -> &'static str {
        match self {
            SyncState::Clean => "clean",
            SyncState::DirtyUncommitted => "dirty_uncommitted",
            SyncState::PendingLocalBranch => "pending_local_branch",
            SyncState::PendingRemoteBranch => "pending_remote_branch",
            SyncState::OpenPullRequest { .. } => "open_pull_request",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// An open pull request on the hosting platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    pub url: String,
}

/// Where a pull request is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestState {
    Open,
    Merged,
    /// Closed without being merged.
    Closed,
}

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// How auto-merge lands a pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum MergeMethod {
    #[default]
    Squash,
    Merge,
    Rebase,
}

impl MergeMethod {
    /// The `gh pr merge` flag selecting this method.
    pub fn gh_flag(&self) -> &'static str {
        match self {
            MergeMethod::Squash => "--squash",
            MergeMethod::Merge => "--merge",
            MergeMethod::Rebase => "--rebase",
        }
    }
}

/// Visibility of a newly created repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
    Internal,
}

impl Visibility {
    pub fn gh_flag(&self) -> &'static str {
        match self {
            Visibility::Public => "--public",
            Visibility::Private => "--private",
            Visibility::Internal => "--internal",
        }
    }
}

/// Failure taxonomy for per-repository reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// `gh` or `git` exited nonzero (or could not be spawned).
    ExternalCallFailure,
    /// An expected branch or PR was absent, or an unexpected one was present.
    ConflictingState,
    /// An expected template file or directory was absent.
    ConfigurationMissing,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ExternalCallFailure => write!(f, "external call failed"),
            ErrorKind::ConflictingState => write!(f, "conflicting state"),
            ErrorKind::ConfigurationMissing => write!(f, "configuration missing"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
