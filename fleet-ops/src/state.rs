//! Sync State classification.
//!
//! Only read queries are issued here: `git status`, `git show-ref`,
//! `git ls-remote` and (when the remote branch exists) a pull-request lookup.

use fleet_core::types::{ChangeBranch, RepoHandle, SyncState};

use crate::error::OpsError;
use crate::gh::HostingApi;
use crate::git::VersionControl;
use crate::report::{RepoReport, StatusOutcome};

/// Observe the [`SyncState`] of one repository.
///
/// Precedence: dirty working tree, then local change branch, then remote
/// change branch (open PR or not), then clean.
pub fn classify<V, H>(
    vcs: &V,
    host: &H,
    repo: &RepoHandle,
    branch: &ChangeBranch,
) -> Result<SyncState, OpsError>
where
    V: VersionControl + ?Sized,
    H: HostingApi + ?Sized,
{
    let path = repo.path();
    if vcs.is_dirty(path)? {
        return Ok(SyncState::DirtyUncommitted);
    }
    if vcs.local_branch_exists(path, branch.as_str())? {
        return Ok(SyncState::PendingLocalBranch);
    }
    if vcs.remote_branch_exists(path, branch.as_str())? {
        return Ok(match host.find_open_pr(&repo.slug(), branch.as_str())? {
            Some(pr) => SyncState::OpenPullRequest { pr },
            None => SyncState::PendingRemoteBranch,
        });
    }
    Ok(SyncState::Clean)
}

/// Classify every repository without mutating anything.
pub fn status<V, H>(
    vcs: &V,
    host: &H,
    repos: &[RepoHandle],
    branch: &ChangeBranch,
) -> Vec<RepoReport<StatusOutcome>>
where
    V: VersionControl + ?Sized,
    H: HostingApi + ?Sized,
{
    repos
        .iter()
        .map(|repo| {
            let outcome = match classify(vcs, host, repo, branch) {
                Ok(state) => StatusOutcome::Observed { state },
                Err(err) => {
                    tracing::warn!(repo = %repo, error = %err, "could not classify");
                    StatusOutcome::Error {
                        kind: err.kind(),
                        reason: err.to_string(),
                    }
                }
            };
            RepoReport::new(repo.slug(), outcome)
        })
        .collect()
}
