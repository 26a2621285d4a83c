//! Repository-set provider.
//!
//! Which repositories belong to the fleet is decided by a declarative
//! [`RepoFilter`] (a membership predicate on names). Enumeration of the
//! workspace directory is a separate step ([`scan_at`]) that only lists
//! candidate checkouts; callers may equally feed an explicit list of names
//! through the same filter (see [`RepoFilter::select`]).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::WorkspaceError;
use crate::types::RepoName;

/// Declarative membership predicate for the fleet.
///
/// Names starting with `.` (the template checkout, tooling repos) are never
/// members.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoFilter {
    /// When non-empty, only names starting with one of these prefixes match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub include_prefixes: Vec<String>,
    /// Names starting with any of these prefixes never match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude_prefixes: Vec<String>,
    /// Exact names that never match.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub exclude: Vec<RepoName>,
    /// Restrict the set to a single repository.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub only: Option<RepoName>,
}

impl RepoFilter {
    /// Is `name` a member of the fleet?
    pub fn contains(&self, name: &str) -> bool {
        if name.starts_with('.') {
            return false;
        }
        if let Some(only) = &self.only {
            return only.0 == name;
        }
        if self.exclude.iter().any(|n| n.0 == name) {
            return false;
        }
        if self.exclude_prefixes.iter().any(|p| name.starts_with(p.as_str())) {
            return false;
        }
        self.include_prefixes.is_empty()
            || self.include_prefixes.iter().any(|p| name.starts_with(p.as_str()))
    }

    /// Filter an explicit list of names, sorted and deduplicated.
    pub fn select<I, S>(&self, names: I) -> Vec<RepoName>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut selected: Vec<RepoName> = names
            .into_iter()
            .filter(|n| self.contains(n.as_ref()))
            .map(|n| RepoName::from(n.as_ref()))
            .collect();
        selected.sort();
        selected.dedup();
        selected
    }

    /// Merge command-line overrides on top of the configured filter.
    pub fn with_overrides(
        mut self,
        exclude_prefixes: &[String],
        only: Option<&str>,
    ) -> Self {
        self.exclude_prefixes.extend(exclude_prefixes.iter().cloned());
        if let Some(only) = only {
            self.only = Some(RepoName::from(only));
        }
        self
    }
}

/// A checkout found in the workspace that passed the filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoCandidate {
    pub name: RepoName,
    pub path: PathBuf,
}

/// List the git checkouts directly under `workspace` that the filter accepts.
///
/// Results are sorted by name so runs are deterministic. A directory counts
/// as a checkout when it contains a `.git` entry (directory or worktree file).
pub fn scan_at(workspace: &Path, filter: &RepoFilter) -> Result<Vec<RepoCandidate>, WorkspaceError> {
    if !workspace.is_dir() {
        return Err(WorkspaceError::WorkspaceNotFound {
            path: workspace.to_path_buf(),
        });
    }

    if let Some(only) = &filter.only {
        let path = workspace.join(&only.0);
        if !path.join(".git").exists() {
            return Err(WorkspaceError::RepoNotFound {
                name: only.0.clone(),
                workspace: workspace.to_path_buf(),
            });
        }
    }

    let entries = std::fs::read_dir(workspace).map_err(|e| WorkspaceError::Enumerate {
        path: workspace.to_path_buf(),
        source: e,
    })?;

    let mut found = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| WorkspaceError::Enumerate {
            path: workspace.to_path_buf(),
            source: e,
        })?;
        if !entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if !filter.contains(&name) {
            continue;
        }
        let path = entry.path();
        if !path.join(".git").exists() {
            continue;
        }
        found.push(RepoCandidate {
            name: RepoName::from(name),
            path,
        });
    }
    found.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hidden_names_are_never_members() {
        let filter = RepoFilter::default();
        assert!(!filter.contains(".vehicle-template"));
        assert!(filter.contains("Toyota-Camry"));
    }

    #[test]
    fn only_overrides_prefix_rules() {
        let filter = RepoFilter {
            exclude_prefixes: vec!["Toyota".into()],
            only: Some(RepoName::from("Toyota-Camry")),
            ..RepoFilter::default()
        };
        assert!(filter.contains("Toyota-Camry"));
        assert!(!filter.contains("Ford-F-150"));
    }

    #[test]
    fn select_sorts_and_dedups() {
        let filter = RepoFilter {
            include_prefixes: vec!["Ford".into(), "Kia".into()],
            ..RepoFilter::default()
        };
        let picked = filter.select(["Kia-Niro", "Ford-Bronco", "Kia-Niro", "Audi-A4"]);
        assert_eq!(
            picked,
            vec![RepoName::from("Ford-Bronco"), RepoName::from("Kia-Niro")]
        );
    }
}
