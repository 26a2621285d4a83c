//! Error types for fleet-renderer.

use std::path::PathBuf;

use thiserror::Error;

/// All errors that can arise from rendering and placeholder rewriting.
#[derive(Debug, Error)]
pub enum RenderError {
    /// Tera template engine error.
    #[error("template engine error: {0}")]
    Tera(#[from] tera::Error),

    /// JSON serialization error (building tera context).
    #[error("context serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem error while loading user templates or rewriting a file.
    #[error("template io error at {path}: {source}")]
    Io { path: PathBuf, source: std::io::Error },

    /// The file named by a rewrite does not exist.
    #[error("rewrite target missing: {path}")]
    RewriteTargetMissing { path: PathBuf },
}
