//! Template sync pipeline: every configured path into every target.

use std::path::{Path, PathBuf};

use fleet_core::types::{ErrorKind, RepoName};
use fleet_core::workspace::RepoCandidate;

use crate::error::SyncError;
use crate::mirror::{mirror_path, nested_within, MirrorOptions, MirrorOutcome};
use crate::writer::WriteResult;

/// What to mirror and how.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Checkout of the template repository.
    pub template_path: PathBuf,
    /// Name of the template repository; a target with this name is skipped.
    pub template_name: RepoName,
    /// Paths relative to the repository root (`.` allowed).
    pub include: Vec<PathBuf>,
    pub options: MirrorOptions,
}

/// A non-fatal problem encountered while syncing one target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncWarning {
    pub kind: ErrorKind,
    pub path: PathBuf,
    pub message: String,
}

/// Outcome of syncing a single target repository.
#[derive(Debug)]
pub struct TargetReport {
    pub name: RepoName,
    pub writes: Vec<WriteResult>,
    pub warnings: Vec<SyncWarning>,
    /// Set when the target could not be synced at all.
    pub error: Option<(ErrorKind, String)>,
}

impl TargetReport {
    pub fn changed(&self) -> usize {
        self.writes.iter().filter(|w| w.is_change()).count()
    }
}

fn same_checkout(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}

/// Mirror every included path into one target.
pub fn sync_target(request: &SyncRequest, target: &RepoCandidate) -> TargetReport {
    let mut report = TargetReport {
        name: target.name.clone(),
        writes: Vec::new(),
        warnings: Vec::new(),
        error: None,
    };

    for rel in &request.include {
        let excluded = nested_within(rel, &request.include);
        match mirror_path(
            &request.template_path,
            &target.path,
            rel,
            &excluded,
            request.options,
        ) {
            Ok(MirrorOutcome::Mirrored(writes)) => report.writes.extend(writes),
            Ok(MirrorOutcome::SourceMissing { path }) => report.warnings.push(SyncWarning {
                kind: ErrorKind::ConfigurationMissing,
                message: format!("{} not found in template, skipped", path.display()),
                path,
            }),
            Err(e) => {
                tracing::error!("sync failed for {}: {e}", target.name);
                report.error = Some((ErrorKind::ExternalCallFailure, e.to_string()));
                break;
            }
        }
    }
    report
}

/// Mirror the template into every target except the template itself.
///
/// Only a missing template checkout is fatal; per-target failures are
/// recorded in the corresponding [`TargetReport`].
pub fn sync_template(
    request: &SyncRequest,
    targets: &[RepoCandidate],
) -> Result<Vec<TargetReport>, SyncError> {
    if !request.template_path.is_dir() {
        return Err(SyncError::TemplateNotFound {
            path: request.template_path.clone(),
        });
    }

    let mut reports = Vec::new();
    for target in targets {
        if target.name == request.template_name
            || same_checkout(&target.path, &request.template_path)
        {
            tracing::debug!("skipping template checkout {}", target.name);
            continue;
        }
        reports.push(sync_target(request, target));
    }
    Ok(reports)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    fn candidate(root: &Path, name: &str) -> RepoCandidate {
        let path = root.join(name);
        fs::create_dir_all(path.join(".git")).expect("mkdir");
        RepoCandidate {
            name: RepoName::from(name),
            path,
        }
    }

    fn request(root: &Path, include: &[&str]) -> SyncRequest {
        SyncRequest {
            template_path: root.join(".vehicle-template"),
            template_name: RepoName::from(".vehicle-template"),
            include: include.iter().map(PathBuf::from).collect(),
            options: MirrorOptions::default(),
        }
    }

    #[test]
    fn missing_template_is_fatal() {
        let ws = TempDir::new().expect("ws");
        let err = sync_template(&request(ws.path(), &["schemas"]), &[]).unwrap_err();
        assert!(matches!(err, SyncError::TemplateNotFound { .. }));
    }

    #[test]
    fn template_checkout_is_never_a_target() {
        let ws = TempDir::new().expect("ws");
        let template = candidate(ws.path(), ".vehicle-template");
        fs::create_dir_all(template.path.join("schemas")).expect("mkdir");
        let reports =
            sync_template(&request(ws.path(), &["schemas"]), &[template]).expect("sync");
        assert!(reports.is_empty());
    }

    #[test]
    fn missing_path_becomes_warning() {
        let ws = TempDir::new().expect("ws");
        fs::create_dir_all(ws.path().join(".vehicle-template")).expect("mkdir");
        let target = candidate(ws.path(), "Kia-Niro");
        let reports =
            sync_template(&request(ws.path(), &["tests"]), &[target]).expect("sync");
        assert_eq!(reports.len(), 1);
        assert!(reports[0].error.is_none());
        assert_eq!(reports[0].warnings.len(), 1);
        assert_eq!(reports[0].warnings[0].kind, ErrorKind::ConfigurationMissing);
    }
}
