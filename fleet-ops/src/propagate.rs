//! Fleet Change Propagator.
//!
//! Turns local edits in many checkouts into one change branch, one commit
//! and one auto-merging pull request per repository. Runs are idempotent:
//! the state left behind by a run (local branch, remote branch, open PR)
//! is classified as "in progress" by the next one, which then does nothing.
//!
//! | observed state          | action                                      |
//! |-------------------------|---------------------------------------------|
//! | `DirtyUncommitted`      | branch, commit, push, open PR, auto-merge   |
//! | `PendingLocalBranch`    | none (`already_in_progress`)                |
//! | `PendingRemoteBranch`   | check out remote branch, open PR, auto-merge|
//! | `OpenPullRequest`       | none (`already_in_progress`)                |
//! | `Clean`                 | none (`no_changes`)                         |
//!
//! With [`WatchSettings`], every pull request opened by the run is then
//! polled until it merges or closes, and the checkout is cleaned up.

use std::time::Duration;

use serde::Serialize;

use fleet_core::types::{
    ChangeBranch, ErrorKind, MergeMethod, PullRequestRef, PullRequestState, RepoHandle, SyncState,
};
use fleet_renderer::{PullRequestContext, Renderer};

use crate::error::OpsError;
use crate::gh::{HostingApi, NewPullRequest};
use crate::git::VersionControl;
use crate::maintenance::cleanup;
use crate::report::{Outcome, RepoReport, TaskOutcome};
use crate::state::classify;

// ---------------------------------------------------------------------------
// Outcome
// ---------------------------------------------------------------------------

/// What happened to one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PropagateOutcome {
    CreatedAndMerging { pr: PullRequestRef },
    ResumedAndMerging { pr: PullRequestRef },
    AlreadyInProgress,
    NoChanges,
    /// Dry run: local changes would be committed and proposed.
    WouldCreate,
    /// Dry run: the pushed branch would get its pull request.
    WouldResume,
    /// Watched until merged; `cleanup` is what happened to the checkout.
    Merged { pr: PullRequestRef, cleanup: TaskOutcome },
    /// Watched until closed without being merged.
    ClosedUnmerged { pr: PullRequestRef, cleanup: TaskOutcome },
    /// Still open when the watch ran out of attempts.
    StillOpen { pr: PullRequestRef },
    Error { kind: ErrorKind, reason: String },
}

impl PropagateOutcome {
    fn error(err: &OpsError) -> Self {
        PropagateOutcome::Error {
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

impl Outcome for PropagateOutcome {
    fn label(&self) -> &'static str {
        match self {
            PropagateOutcome::CreatedAndMerging { .. } => "created_and_merging",
            PropagateOutcome::ResumedAndMerging { .. } => "resumed_and_merging",
            PropagateOutcome::AlreadyInProgress => "already_in_progress",
            PropagateOutcome::NoChanges => "no_changes",
            PropagateOutcome::WouldCreate => "would_create",
            PropagateOutcome::WouldResume => "would_resume",
            PropagateOutcome::Merged { .. } => "merged",
            PropagateOutcome::ClosedUnmerged { .. } => "closed_unmerged",
            PropagateOutcome::StillOpen { .. } => "still_open",
            PropagateOutcome::Error { .. } => "error",
        }
    }

    fn detail(&self) -> String {
        match self {
            PropagateOutcome::CreatedAndMerging { pr }
            | PropagateOutcome::ResumedAndMerging { pr }
            | PropagateOutcome::StillOpen { pr } => pr.url.clone(),
            PropagateOutcome::Merged { pr, cleanup }
            | PropagateOutcome::ClosedUnmerged { pr, cleanup } => {
                format!("{} (cleanup: {})", pr.url, cleanup.detail())
            }
            PropagateOutcome::Error { kind, reason } => format!("{kind}: {reason}"),
            _ => String::new(),
        }
    }

    fn is_error(&self) -> bool {
        matches!(
            self,
            PropagateOutcome::Error { .. }
                | PropagateOutcome::ClosedUnmerged { .. }
                | PropagateOutcome::StillOpen { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Propagator
// ---------------------------------------------------------------------------

/// How long to wait for opened pull requests to land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchSettings {
    /// State checks per pull request before giving up.
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for WatchSettings {
    fn default() -> Self {
        WatchSettings {
            attempts: 30,
            interval: Duration::from_secs(20),
        }
    }
}

/// Settings for one propagation run.
#[derive(Debug, Clone)]
pub struct PropagateSettings {
    /// Commit message.
    pub message: String,
    /// Pull request title; the commit message when `None`.
    pub title: Option<String>,
    /// Pull request body; rendered from the template when `None`.
    pub body: Option<String>,
    pub branch: ChangeBranch,
    pub base: String,
    pub merge_method: MergeMethod,
    pub dry_run: bool,
    pub watch: Option<WatchSettings>,
}

pub struct Propagator<'a, V: ?Sized, H: ?Sized> {
    vcs: &'a V,
    host: &'a H,
    renderer: &'a Renderer,
    settings: PropagateSettings,
}

impl<'a, V, H> Propagator<'a, V, H>
where
    V: VersionControl + ?Sized,
    H: HostingApi + ?Sized,
{
    pub fn new(vcs: &'a V, host: &'a H, renderer: &'a Renderer, settings: PropagateSettings) -> Self {
        Propagator {
            vcs,
            host,
            renderer,
            settings,
        }
    }

    /// Process every repository in order. A failure in one never stops the
    /// others.
    ///
    /// With watching enabled, pull requests are polled only after every
    /// repository has been proposed, so they merge concurrently.
    pub fn run(&self, repos: &[RepoHandle]) -> Vec<RepoReport<PropagateOutcome>> {
        let outcomes: Vec<PropagateOutcome> = repos
            .iter()
            .map(|repo| {
                let outcome = self.propagate_one(repo);
                log_outcome(repo, &outcome, "propagated");
                outcome
            })
            .collect();

        repos
            .iter()
            .zip(outcomes)
            .map(|(repo, outcome)| {
                let outcome = match (self.settings.watch, outcome) {
                    (
                        Some(watch),
                        PropagateOutcome::CreatedAndMerging { pr }
                        | PropagateOutcome::ResumedAndMerging { pr },
                    ) => {
                        let watched = self.await_landing(repo, pr, watch);
                        log_outcome(repo, &watched, "watched");
                        watched
                    }
                    (_, outcome) => outcome,
                };
                RepoReport::new(repo.slug(), outcome)
            })
            .collect()
    }

    pub fn propagate_one(&self, repo: &RepoHandle) -> PropagateOutcome {
        let state = match classify(self.vcs, self.host, repo, &self.settings.branch) {
            Ok(state) => state,
            Err(err) => return PropagateOutcome::error(&err),
        };
        tracing::debug!(repo = %repo, state = %state, "classified");

        let result = match state {
            SyncState::Clean => Ok(PropagateOutcome::NoChanges),
            SyncState::PendingLocalBranch | SyncState::OpenPullRequest { .. } => {
                Ok(PropagateOutcome::AlreadyInProgress)
            }
            SyncState::DirtyUncommitted => self.create(repo),
            SyncState::PendingRemoteBranch => self.resume(repo),
        };
        result.unwrap_or_else(|err| PropagateOutcome::error(&err))
    }

    fn create(&self, repo: &RepoHandle) -> Result<PropagateOutcome, OpsError> {
        let path = repo.path();
        let branch = self.settings.branch.as_str();

        if self.vcs.local_branch_exists(path, branch)? {
            return Err(OpsError::Conflict(format!(
                "uncommitted changes present but branch '{branch}' already exists locally"
            )));
        }
        if self.vcs.remote_branch_exists(path, branch)? {
            return Err(OpsError::Conflict(format!(
                "uncommitted changes present but branch '{branch}' already exists on origin"
            )));
        }
        if self.settings.dry_run {
            return Ok(PropagateOutcome::WouldCreate);
        }

        self.vcs.create_branch(path, branch)?;
        self.vcs.stage_all(path)?;
        self.vcs.commit(path, &self.settings.message)?;
        self.vcs.push_upstream(path, branch)?;
        let pr = self.open_and_merge(repo, false)?;
        Ok(PropagateOutcome::CreatedAndMerging { pr })
    }

    fn resume(&self, repo: &RepoHandle) -> Result<PropagateOutcome, OpsError> {
        if self.settings.dry_run {
            return Ok(PropagateOutcome::WouldResume);
        }
        self.vcs
            .checkout_tracking(repo.path(), self.settings.branch.as_str())?;
        let pr = self.open_and_merge(repo, true)?;
        Ok(PropagateOutcome::ResumedAndMerging { pr })
    }

    /// Open the pull request unless one is already open, then enable
    /// auto-merge on it.
    fn open_and_merge(&self, repo: &RepoHandle, resumed: bool) -> Result<PullRequestRef, OpsError> {
        let slug = repo.slug();
        let head = self.settings.branch.as_str();

        let pr = match self.host.find_open_pr(&slug, head)? {
            Some(existing) => existing,
            None => {
                let mut ctx =
                    PullRequestContext::new(repo, &self.settings.message, head, &self.settings.base);
                if resumed {
                    ctx = ctx.resumed();
                }
                let body = match &self.settings.body {
                    Some(body) => body.clone(),
                    None => self.renderer.pull_request_body(&ctx)?,
                };
                let title = self.settings.title.as_deref().unwrap_or(&self.settings.message);
                self.host.create_pr(
                    &slug,
                    &NewPullRequest {
                        title,
                        body: &body,
                        head,
                        base: &self.settings.base,
                    },
                )?
            }
        };

        self.host
            .enable_auto_merge(&slug, &pr, self.settings.merge_method)
            .map_err(|err| OpsError::AutoMergeFailed {
                url: pr.url.clone(),
                source: Box::new(err),
            })?;
        Ok(pr)
    }

    /// Poll `pr` until it merges or closes, then return the checkout to the
    /// base branch. A failed poll counts as an attempt.
    fn await_landing(
        &self,
        repo: &RepoHandle,
        pr: PullRequestRef,
        watch: WatchSettings,
    ) -> PropagateOutcome {
        let slug = repo.slug();
        let mut last_error = None;
        for attempt in 1..=watch.attempts {
            match self.host.pull_request_state(&slug, &pr) {
                Ok(PullRequestState::Merged) => {
                    let cleanup = self.cleanup_checkout(repo);
                    return PropagateOutcome::Merged { pr, cleanup };
                }
                Ok(PullRequestState::Closed) => {
                    let cleanup = self.cleanup_checkout(repo);
                    return PropagateOutcome::ClosedUnmerged { pr, cleanup };
                }
                Ok(PullRequestState::Open) => {
                    last_error = None;
                    tracing::debug!(repo = %repo, attempt, "pull request still open");
                }
                Err(err) => {
                    tracing::warn!(repo = %repo, attempt, error = %err, "pull request state unavailable");
                    last_error = Some(err);
                }
            }
            if attempt < watch.attempts {
                std::thread::sleep(watch.interval);
            }
        }
        match last_error {
            Some(err) => PropagateOutcome::error(&err),
            None => PropagateOutcome::StillOpen { pr },
        }
    }

    fn cleanup_checkout(&self, repo: &RepoHandle) -> TaskOutcome {
        cleanup(
            self.vcs,
            std::slice::from_ref(repo),
            &self.settings.branch,
            &self.settings.base,
            false,
        )
        .into_iter()
        .next()
        .map(|report| report.outcome)
        .unwrap_or_else(|| TaskOutcome::skipped("nothing to clean up"))
    }
}

fn log_outcome(repo: &RepoHandle, outcome: &PropagateOutcome, what: &str) {
    match outcome {
        PropagateOutcome::Error { kind, reason } => {
            tracing::warn!(repo = %repo, %kind, reason = %reason, "{what}: failed")
        }
        other => tracing::info!(repo = %repo, outcome = other.label(), "{what}"),
    }
}
