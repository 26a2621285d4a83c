//! Per-repository report rows shared by every fleet operation.

use serde::Serialize;

use fleet_core::types::{ErrorKind, SyncState};

use crate::error::OpsError;

/// Anything that can be reported for one repository.
pub trait Outcome {
    /// Short machine-readable label (`created_and_merging`, `skipped`, ...).
    fn label(&self) -> &'static str;
    /// Human-readable detail, possibly empty.
    fn detail(&self) -> String;
    fn is_error(&self) -> bool;
}

/// One row: which repository, and what happened to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepoReport<O> {
    pub repo: String,
    #[serde(flatten)]
    pub outcome: O,
}

impl<O> RepoReport<O> {
    pub fn new(repo: impl Into<String>, outcome: O) -> Self {
        RepoReport {
            repo: repo.into(),
            outcome,
        }
    }
}

/// `true` when any row reports an error.
pub fn any_errors<O: Outcome>(reports: &[RepoReport<O>]) -> bool {
    reports.iter().any(|r| r.outcome.is_error())
}

// ---------------------------------------------------------------------------
// TaskOutcome
// ---------------------------------------------------------------------------

/// Outcome of the simpler maintenance tasks (clone, configure, cleanup,
/// close, trigger).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TaskOutcome {
    Done { detail: String },
    Skipped { reason: String },
    WouldRun { detail: String },
    Error { kind: ErrorKind, reason: String },
}

impl TaskOutcome {
    pub fn done(detail: impl Into<String>) -> Self {
        TaskOutcome::Done {
            detail: detail.into(),
        }
    }

    pub fn skipped(reason: impl Into<String>) -> Self {
        TaskOutcome::Skipped {
            reason: reason.into(),
        }
    }

    pub fn would_run(detail: impl Into<String>) -> Self {
        TaskOutcome::WouldRun {
            detail: detail.into(),
        }
    }
}

impl From<OpsError> for TaskOutcome {
    fn from(err: OpsError) -> Self {
        TaskOutcome::Error {
            kind: err.kind(),
            reason: err.to_string(),
        }
    }
}

impl Outcome for TaskOutcome {
    fn label(&self) -> &'static str {
        match self {
            TaskOutcome::Done { .. } => "done",
            TaskOutcome::Skipped { .. } => "skipped",
            TaskOutcome::WouldRun { .. } => "would_run",
            TaskOutcome::Error { .. } => "error",
        }
    }

    fn detail(&self) -> String {
        match self {
            TaskOutcome::Done { detail } | TaskOutcome::WouldRun { detail } => detail.clone(),
            TaskOutcome::Skipped { reason } => reason.clone(),
            TaskOutcome::Error { kind, reason } => format!("{kind}: {reason}"),
        }
    }

    fn is_error(&self) -> bool {
        matches!(self, TaskOutcome::Error { .. })
    }
}

// ---------------------------------------------------------------------------
// StatusOutcome
// ---------------------------------------------------------------------------

/// Observed sync state, or why it could not be observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatusOutcome {
    Observed { state: SyncState },
    Error { kind: ErrorKind, reason: String },
}

impl Outcome for StatusOutcome {
    fn label(&self) -> &'static str {
        match self {
            StatusOutcome::Observed { state } => state.key(),
            StatusOutcome::Error { .. } => "error",
        }
    }

    fn detail(&self) -> String {
        match self {
            StatusOutcome::Observed {
                state: SyncState::OpenPullRequest { pr },
            } => pr.url.clone(),
            StatusOutcome::Observed { .. } => String::new(),
            StatusOutcome::Error { kind, reason } => format!("{kind}: {reason}"),
        }
    }

    fn is_error(&self) -> bool {
        matches!(self, StatusOutcome::Error { .. })
    }
}
