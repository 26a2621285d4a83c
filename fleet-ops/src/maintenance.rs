//! Fleet-wide housekeeping: cleaning up merged change branches, closing
//! abandoned ones, and dispatching workflows.

use std::time::Duration;

use fleet_core::types::{ChangeBranch, RepoHandle};

use crate::error::OpsError;
use crate::gh::HostingApi;
use crate::git::VersionControl;
use crate::report::{RepoReport, TaskOutcome};

fn each<F>(repos: &[RepoHandle], mut task: F) -> Vec<RepoReport<TaskOutcome>>
where
    F: FnMut(&RepoHandle) -> Result<TaskOutcome, OpsError>,
{
    repos
        .iter()
        .map(|repo| {
            let outcome = task(repo).unwrap_or_else(|err| {
                tracing::warn!(repo = %repo, error = %err, "task failed");
                err.into()
            });
            RepoReport::new(repo.slug(), outcome)
        })
        .collect()
}

/// Return checkouts whose change branch has been merged (and deleted on the
/// remote) to an up-to-date base branch, deleting the local change branch.
pub fn cleanup<V: VersionControl + ?Sized>(
    vcs: &V,
    repos: &[RepoHandle],
    branch: &ChangeBranch,
    base: &str,
    dry_run: bool,
) -> Vec<RepoReport<TaskOutcome>> {
    let branch = branch.as_str();
    each(repos, |repo| {
        let path = repo.path();
        if !vcs.local_branch_exists(path, branch)? {
            return Ok(TaskOutcome::skipped(format!("no local '{branch}' branch")));
        }
        if vcs.remote_branch_exists(path, branch)? {
            return Ok(TaskOutcome::skipped(format!("'{branch}' still exists on origin")));
        }
        if vcs.is_dirty(path)? {
            return Err(OpsError::Conflict(
                "uncommitted changes present; refusing to switch branches".into(),
            ));
        }
        if dry_run {
            return Ok(TaskOutcome::would_run(format!(
                "rebase {base} onto origin/{base} and delete '{branch}'"
            )));
        }
        vcs.fetch_prune(path)?;
        vcs.checkout(path, base)?;
        vcs.rebase_onto_remote(path, base)?;
        vcs.delete_local_branch(path, branch)?;
        Ok(TaskOutcome::done(format!("deleted local '{branch}'")))
    })
}

/// Abandon outstanding change branches: close the open pull request (which
/// deletes the branch), or delete the remote branch when none is open.
pub fn close<V, H>(
    vcs: &V,
    host: &H,
    repos: &[RepoHandle],
    branch: &ChangeBranch,
    dry_run: bool,
) -> Vec<RepoReport<TaskOutcome>>
where
    V: VersionControl + ?Sized,
    H: HostingApi + ?Sized,
{
    let branch = branch.as_str();
    each(repos, |repo| {
        if !vcs.remote_branch_exists(repo.path(), branch)? {
            return Ok(TaskOutcome::skipped(format!("no remote '{branch}' branch")));
        }
        let slug = repo.slug();
        match host.find_open_pr(&slug, branch)? {
            Some(pr) if dry_run => Ok(TaskOutcome::would_run(format!("close {}", pr.url))),
            Some(pr) => {
                host.close_pr(&slug, &pr)?;
                Ok(TaskOutcome::done(format!("closed {}", pr.url)))
            }
            None if dry_run => Ok(TaskOutcome::would_run(format!(
                "delete remote branch '{branch}'"
            ))),
            None => {
                vcs.delete_remote_branch(repo.path(), branch)?;
                Ok(TaskOutcome::done(format!("deleted remote branch '{branch}'")))
            }
        }
    })
}

/// Dispatch `workflow` on every repository, sleeping `delay` between
/// consecutive dispatches.
pub fn trigger<H: HostingApi + ?Sized>(
    host: &H,
    repos: &[RepoHandle],
    workflow: &str,
    git_ref: &str,
    delay: Duration,
    dry_run: bool,
) -> Vec<RepoReport<TaskOutcome>> {
    let mut first = true;
    each(repos, |repo| {
        if dry_run {
            return Ok(TaskOutcome::would_run(format!("dispatch {workflow}")));
        }
        if !first && !delay.is_zero() {
            std::thread::sleep(delay);
        }
        first = false;
        host.dispatch_workflow(&repo.slug(), workflow, git_ref)?;
        Ok(TaskOutcome::done(format!("dispatched {workflow} on {git_ref}")))
    })
}
