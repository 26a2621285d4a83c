//! Fleet core library: domain types, configuration, repository-set provider.
//!
//! - [`types`]: newtypes, [`SyncState`], failure taxonomy
//! - [`error`]: [`ConfigError`], [`WorkspaceError`]
//! - [`config`]: `fleet.yaml` load / save / resolve
//! - [`workspace`]: [`RepoFilter`] membership predicate and workspace scan

pub mod config;
pub mod error;
pub mod types;
pub mod workspace;

pub use config::FleetConfig;
pub use error::{ConfigError, WorkspaceError};
pub use types::{
    ChangeBranch, ErrorKind, MergeMethod, Owner, PullRequestRef, RepoHandle, RepoName,
    SyncState, Visibility,
};
pub use workspace::{RepoCandidate, RepoFilter};
