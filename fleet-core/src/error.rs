//! Error types for fleet-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can arise while loading or saving `fleet.yaml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Underlying I/O failure (permission denied, etc.).
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// YAML serialization error (write/save path).
    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// YAML parse error on load: includes file path and line context from serde_yaml.
    #[error("failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// The config file did not exist at the expected path.
    #[error("config not found at {path}")]
    ConfigNotFound { path: PathBuf },

    /// The config parsed but holds values that cannot be used.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors from enumerating the repository set.
///
/// These are the only errors treated as fatal to a whole run: nothing
/// downstream can proceed without the set of target repositories.
#[derive(Debug, Error)]
pub enum WorkspaceError {
    /// The workspace directory is missing.
    #[error("workspace not found at {path}")]
    WorkspaceNotFound { path: PathBuf },

    /// Listing the workspace directory failed.
    #[error("cannot enumerate workspace {path}: {source}")]
    Enumerate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A single repository was requested but is not present.
    #[error("repository '{name}' not found in {workspace}")]
    RepoNotFound { name: String, workspace: PathBuf },
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
