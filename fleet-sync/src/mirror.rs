//! Mirror one configured template path into one target checkout.
//!
//! Directories get delete-then-copy semantics: files the template does not
//! carry are removed, files it does carry are copied through the hash-gated
//! writer. `.git` is never read or written on either side, and any other
//! configured path nested inside the one being mirrored is left alone so
//! that mirroring `.` does not flatten `.github/workflows`.

use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

use crate::error::{io_err, SyncError};
use crate::writer::{copy_file, remove_file, WriteResult};

/// Options shared by every path mirrored in a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MirrorOptions {
    pub dry_run: bool,
    /// Never overwrite or delete files that already exist in the target.
    pub preserve_existing: bool,
}

/// Result of mirroring a single configured path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MirrorOutcome {
    Mirrored(Vec<WriteResult>),
    /// The template does not contain the path.
    SourceMissing { path: PathBuf },
}

/// Drop `.` components so `"."` and `""` both mean the repository root.
pub fn normalize(rel: &Path) -> PathBuf {
    rel.components()
        .filter(|c| !matches!(c, Component::CurDir))
        .collect()
}

/// The configured paths strictly nested inside `rel`.
pub fn nested_within(rel: &Path, configured: &[PathBuf]) -> Vec<PathBuf> {
    let rel = normalize(rel);
    configured
        .iter()
        .map(|p| normalize(p))
        .filter(|p| p != &rel && p.starts_with(&rel))
        .collect()
}

fn is_git_path(rel: &Path) -> bool {
    rel.components()
        .any(|c| matches!(c, Component::Normal(s) if s == ".git"))
}

fn is_temp_artifact(rel: &Path) -> bool {
    rel.to_string_lossy().ends_with(".fleet.tmp")
}

/// Collect files under `root/rel` as paths relative to `root`, skipping
/// `.git` and anything under `excluded`.
fn collect_files(
    root: &Path,
    rel: &Path,
    excluded: &[PathBuf],
    out: &mut BTreeSet<PathBuf>,
) -> Result<(), SyncError> {
    let dir = root.join(rel);
    let entries = std::fs::read_dir(&dir).map_err(|e| io_err(&dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(&dir, e))?;
        let child = rel.join(entry.file_name());
        if is_git_path(&child) || excluded.iter().any(|x| child.starts_with(x)) {
            continue;
        }
        let file_type = entry.file_type().map_err(|e| io_err(entry.path(), e))?;
        if file_type.is_dir() {
            collect_files(root, &child, excluded, out)?;
        } else if !is_temp_artifact(&child) {
            out.insert(child);
        }
    }
    Ok(())
}

/// Remove directories left empty after deletions, deepest first.
fn prune_empty_dirs(root: &Path, rel: &Path, excluded: &[PathBuf]) -> Result<bool, SyncError> {
    let dir = root.join(rel);
    let mut empty = true;
    let entries = std::fs::read_dir(&dir).map_err(|e| io_err(&dir, e))?;
    for entry in entries {
        let entry = entry.map_err(|e| io_err(&dir, e))?;
        let child = rel.join(entry.file_name());
        let file_type = entry.file_type().map_err(|e| io_err(entry.path(), e))?;
        if file_type.is_dir()
            && !is_git_path(&child)
            && !excluded.iter().any(|x| child.starts_with(x))
            && prune_empty_dirs(root, &child, excluded)?
        {
            let path = root.join(&child);
            std::fs::remove_dir(&path).map_err(|e| io_err(&path, e))?;
            tracing::debug!("removed empty directory: {}", path.display());
            continue;
        }
        empty = false;
    }
    Ok(empty)
}

/// A regular file in `target` sitting where `rel` needs a parent directory.
fn blocking_file(target: &Path, rel: &Path) -> Option<PathBuf> {
    rel.ancestors()
        .skip(1)
        .filter(|a| !a.as_os_str().is_empty())
        .map(|a| target.join(a))
        .find(|p| p.is_file())
}

/// Empty and remove a directory at `target/rel` so a template file can take
/// its place. Returns the removals of the files it held.
fn clear_directory(
    target: &Path,
    rel: &Path,
    excluded: &[PathBuf],
    dry_run: bool,
) -> Result<Vec<WriteResult>, SyncError> {
    let dir = target.join(rel);
    if !dir.is_dir() {
        return Ok(vec![]);
    }
    let mut inner = BTreeSet::new();
    collect_files(target, rel, excluded, &mut inner)?;
    let mut results = Vec::new();
    for file in &inner {
        results.push(remove_file(&target.join(file), dry_run)?);
    }
    if !dry_run {
        prune_empty_dirs(target, rel, excluded)?;
        std::fs::remove_dir(&dir).map_err(|e| io_err(&dir, e))?;
        tracing::debug!("removed directory replaced by a file: {}", dir.display());
    }
    Ok(results)
}

/// Mirror `template/rel` onto `target/rel`.
///
/// `excluded` are paths (relative to the repository root) owned by another
/// configured entry; see [`nested_within`].
pub fn mirror_path(
    template: &Path,
    target: &Path,
    rel: &Path,
    excluded: &[PathBuf],
    opts: MirrorOptions,
) -> Result<MirrorOutcome, SyncError> {
    let rel = normalize(rel);
    if is_git_path(&rel) {
        return Ok(MirrorOutcome::Mirrored(vec![]));
    }
    let src = template.join(&rel);

    if !src.exists() {
        tracing::warn!("template path missing, skipped: {}", src.display());
        return Ok(MirrorOutcome::SourceMissing { path: rel });
    }

    if src.is_file() {
        let dst = target.join(&rel);
        let mut results = Vec::new();
        let blocker = blocking_file(target, &rel);
        if opts.preserve_existing {
            if blocker.is_some() {
                return Ok(MirrorOutcome::Mirrored(vec![WriteResult::Preserved { path: dst }]));
            }
        } else {
            if let Some(blocker) = blocker {
                results.push(remove_file(&blocker, opts.dry_run)?);
            }
            results.extend(clear_directory(target, &rel, excluded, opts.dry_run)?);
        }
        results.push(copy_file(&src, &dst, opts.dry_run, opts.preserve_existing)?);
        return Ok(MirrorOutcome::Mirrored(results));
    }

    let mut wanted = BTreeSet::new();
    collect_files(template, &rel, excluded, &mut wanted)?;

    let dst_dir = target.join(&rel);
    let mut present = BTreeSet::new();
    if dst_dir.is_dir() {
        collect_files(target, &rel, excluded, &mut present)?;
    }

    let mut results = Vec::new();
    // Files already reported as removed, so dry runs list each one once.
    let mut removed: BTreeSet<PathBuf> = BTreeSet::new();
    if !opts.preserve_existing {
        for stale in present.difference(&wanted) {
            let path = target.join(stale);
            results.push(remove_file(&path, opts.dry_run)?);
            removed.insert(path);
        }
    }
    for file in &wanted {
        let dst = target.join(file);
        if let Some(blocker) = blocking_file(target, file) {
            // A file where the template has a directory.
            if opts.preserve_existing {
                results.push(WriteResult::Preserved { path: dst });
                continue;
            }
            if removed.insert(blocker.clone()) {
                results.push(remove_file(&blocker, opts.dry_run)?);
            }
        } else if !opts.preserve_existing && !opts.dry_run {
            // Stale contents are gone by now; only the directory remains.
            results.extend(clear_directory(target, file, excluded, false)?);
        }
        results.push(copy_file(
            &template.join(file),
            &dst,
            opts.dry_run,
            opts.preserve_existing,
        )?);
    }

    if !opts.dry_run && dst_dir.is_dir() {
        prune_empty_dirs(target, &rel, excluded)?;
    }

    Ok(MirrorOutcome::Mirrored(results))
}
