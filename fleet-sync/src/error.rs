//! Error types for fleet-sync.

use std::path::PathBuf;

use thiserror::Error;

use fleet_core::error::WorkspaceError;

/// All errors that can arise from template synchronization.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The template checkout itself is missing; nothing can be mirrored.
    #[error("template checkout not found: {path}")]
    TemplateNotFound { path: PathBuf },

    /// Enumerating the target repositories failed.
    #[error("workspace error: {0}")]
    Workspace(#[from] WorkspaceError),

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
