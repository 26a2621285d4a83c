use std::path::PathBuf;

use thiserror::Error;

use fleet_core::types::ErrorKind;

/// Failure to run an external program.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// `status` is the exit code, `None` when killed by a signal.
    #[error("`{program} {args}` exited with {}: {stderr}", describe_status(.status))]
    Failed {
        program: String,
        args: String,
        status: Option<i32>,
        stderr: String,
    },
}

fn describe_status(status: &Option<i32>) -> String {
    match status {
        Some(code) => format!("status {code}"),
        None => "a signal".to_string(),
    }
}

/// Error surface for fleet operations.
#[derive(Debug, Error)]
pub enum OpsError {
    #[error(transparent)]
    Command(#[from] CommandError),

    #[error("render error: {0}")]
    Render(#[from] fleet_renderer::RenderError),

    #[error("detect error: {0}")]
    Detect(#[from] fleet_detector::DetectError),

    #[error("workspace error: {0}")]
    Workspace(#[from] fleet_core::WorkspaceError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected output from {program}: {detail}")]
    UnexpectedOutput { program: String, detail: String },

    #[error("pull request {url} is open but auto-merge could not be enabled: {source}")]
    AutoMergeFailed {
        url: String,
        #[source]
        source: Box<OpsError>,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Missing(String),

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl OpsError {
    /// Where this failure sits in the per-repository taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            OpsError::Conflict(_) => ErrorKind::ConflictingState,
            OpsError::Missing(_) | OpsError::Render(_) => ErrorKind::ConfigurationMissing,
            OpsError::Command(_)
            | OpsError::Detect(_)
            | OpsError::Workspace(_)
            | OpsError::Json(_)
            | OpsError::UnexpectedOutput { .. }
            | OpsError::AutoMergeFailed { .. }
            | OpsError::Io { .. } => ErrorKind::ExternalCallFailure,
        }
    }
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> OpsError {
    OpsError::Io {
        path: path.into(),
        source,
    }
}
