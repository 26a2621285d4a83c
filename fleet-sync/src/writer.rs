//! Hash-gated atomic file copy.
//!
//! ## `copy_file` protocol
//!
//! 1. SHA-256 hash the source bytes.
//! 2. Hash the destination bytes (if the destination exists).
//! 3. Identical digest and identical permissions → skip.
//! 4. Write to `<path>.fleet.tmp` and copy the source permissions onto it.
//! 5. Rename to final path (atomic on POSIX).
//!
//! There is no side-car hash store: the destination itself is the record of
//! what was last written, so edits made by hand are always detected.

use std::fs::Permissions;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::error::{io_err, SyncError};

// ---------------------------------------------------------------------------
// Write result
// ---------------------------------------------------------------------------

/// Outcome of an individual file operation in a target repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content or mode changed, or it did not exist).
    Written { path: PathBuf },
    /// File was skipped because it already matches the template.
    Unchanged { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
    /// File was absent from the template and has been deleted.
    Removed { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been deleted.
    WouldRemove { path: PathBuf },
    /// File already existed and existing files are preserved.
    Preserved { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::WouldWrite { path }
            | WriteResult::Removed { path }
            | WriteResult::WouldRemove { path }
            | WriteResult::Preserved { path } => path,
        }
    }

    /// Did (or would) this operation touch the filesystem?
    pub fn is_change(&self) -> bool {
        matches!(
            self,
            WriteResult::Written { .. }
                | WriteResult::WouldWrite { .. }
                | WriteResult::Removed { .. }
                | WriteResult::WouldRemove { .. }
        )
    }
}

// ---------------------------------------------------------------------------
// Hashing
// ---------------------------------------------------------------------------

pub(crate) fn digest_bytes(bytes: &[u8]) -> String {
    let mut h = Sha256::new();
    h.update(bytes);
    hex::encode(h.finalize())
}

/// SHA-256 of the file at `path`, or `None` when it does not exist.
pub fn file_digest(path: &Path) -> Result<Option<String>, SyncError> {
    if !path.is_file() {
        return Ok(None);
    }
    let bytes = std::fs::read(path).map_err(|e| io_err(path, e))?;
    Ok(Some(digest_bytes(&bytes)))
}

// ---------------------------------------------------------------------------
// copy_file
// ---------------------------------------------------------------------------

/// Copy `src` over `dst` unless they already agree on content and mode.
pub(crate) fn copy_file(
    src: &Path,
    dst: &Path,
    dry_run: bool,
    preserve_existing: bool,
) -> Result<WriteResult, SyncError> {
    let tmp = PathBuf::from(format!("{}.fleet.tmp", dst.display()));
    copy_file_with_tmp(src, dst, dry_run, preserve_existing, &tmp)
}

fn copy_file_with_tmp(
    src: &Path,
    dst: &Path,
    dry_run: bool,
    preserve_existing: bool,
    tmp: &Path,
) -> Result<WriteResult, SyncError> {
    if preserve_existing && dst.exists() {
        tracing::debug!("preserved: {}", dst.display());
        return Ok(WriteResult::Preserved {
            path: dst.to_path_buf(),
        });
    }

    let bytes = std::fs::read(src).map_err(|e| io_err(src, e))?;
    let src_perms = std::fs::metadata(src)
        .map_err(|e| io_err(src, e))?
        .permissions();
    let digest = digest_bytes(&bytes);

    if let Some(existing) = file_digest(dst)? {
        let dst_perms = std::fs::metadata(dst)
            .map_err(|e| io_err(dst, e))?
            .permissions();
        if existing == digest && same_mode(&src_perms, &dst_perms) {
            tracing::debug!("unchanged: {}", dst.display());
            return Ok(WriteResult::Unchanged {
                path: dst.to_path_buf(),
            });
        }
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", dst.display());
        return Ok(WriteResult::WouldWrite {
            path: dst.to_path_buf(),
        });
    }

    if let Some(parent) = dst.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, &bytes).map_err(|e| io_err(tmp, e))?;
    if let Err(e) = std::fs::set_permissions(tmp, src_perms) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(tmp, e));
    }

    if let Err(e) = std::fs::rename(tmp, dst) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(dst, e));
    }

    tracing::info!("wrote: {}", dst.display());
    Ok(WriteResult::Written {
        path: dst.to_path_buf(),
    })
}

/// Delete a destination file the template no longer carries.
pub(crate) fn remove_file(path: &Path, dry_run: bool) -> Result<WriteResult, SyncError> {
    if dry_run {
        tracing::info!("[dry-run] would remove: {}", path.display());
        return Ok(WriteResult::WouldRemove {
            path: path.to_path_buf(),
        });
    }
    std::fs::remove_file(path).map_err(|e| io_err(path, e))?;
    tracing::info!("removed: {}", path.display());
    Ok(WriteResult::Removed {
        path: path.to_path_buf(),
    })
}

#[cfg(unix)]
fn same_mode(a: &Permissions, b: &Permissions) -> bool {
    use std::os::unix::fs::PermissionsExt;
    a.mode() & 0o7777 == b.mode() & 0o7777
}

#[cfg(not(unix))]
fn same_mode(a: &Permissions, b: &Permissions) -> bool {
    a.readonly() == b.readonly()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn source(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn first_copy_returns_written() {
        let tmp = TempDir::new().unwrap();
        let src = source(&tmp, "a.json", "{}");
        let dst = tmp.path().join("out").join("a.json");
        let result = copy_file(&src, &dst, false, false).unwrap();
        assert!(matches!(result, WriteResult::Written { .. }));
        assert_eq!(fs::read_to_string(&dst).unwrap(), "{}");
    }

    #[test]
    fn identical_destination_returns_unchanged() {
        let tmp = TempDir::new().unwrap();
        let src = source(&tmp, "a.json", "{}");
        let dst = tmp.path().join("b.json");
        copy_file(&src, &dst, false, false).unwrap();
        let result = copy_file(&src, &dst, false, false).unwrap();
        assert!(matches!(result, WriteResult::Unchanged { .. }));
    }

    #[test]
    fn edited_destination_is_rewritten() {
        let tmp = TempDir::new().unwrap();
        let src = source(&tmp, "a.json", "v1");
        let dst = tmp.path().join("b.json");
        fs::write(&dst, "hand edit").unwrap();
        let result = copy_file(&src, &dst, false, false).unwrap();
        assert!(matches!(result, WriteResult::Written { .. }));
        assert_eq!(fs::read_to_string(&dst).unwrap(), "v1");
    }

    #[test]
    fn dry_run_does_not_write_file() {
        let tmp = TempDir::new().unwrap();
        let src = source(&tmp, "a.json", "{}");
        let dst = tmp.path().join("nope.json");
        let result = copy_file(&src, &dst, true, false).unwrap();
        assert!(matches!(result, WriteResult::WouldWrite { .. }));
        assert!(!dst.exists(), "dry-run must not create files");
    }

    #[test]
    fn preserve_existing_keeps_destination() {
        let tmp = TempDir::new().unwrap();
        let src = source(&tmp, "a.json", "template");
        let dst = tmp.path().join("b.json");
        fs::write(&dst, "local").unwrap();
        let result = copy_file(&src, &dst, false, true).unwrap();
        assert!(matches!(result, WriteResult::Preserved { .. }));
        assert_eq!(fs::read_to_string(&dst).unwrap(), "local");
    }

    #[test]
    fn tmp_file_removed_after_write() {
        let tmp = TempDir::new().unwrap();
        let src = source(&tmp, "a.json", "data");
        let dst = tmp.path().join("clean.json");
        copy_file(&src, &dst, false, false).unwrap();
        let tmp_path = PathBuf::from(format!("{}.fleet.tmp", dst.display()));
        assert!(!tmp_path.exists(), ".fleet.tmp must be cleaned up");
    }

    #[test]
    fn remove_respects_dry_run() {
        let tmp = TempDir::new().unwrap();
        let path = source(&tmp, "stale.yml", "x");
        assert!(matches!(
            remove_file(&path, true).unwrap(),
            WriteResult::WouldRemove { .. }
        ));
        assert!(path.exists());
        assert!(matches!(
            remove_file(&path, false).unwrap(),
            WriteResult::Removed { .. }
        ));
        assert!(!path.exists());
    }

    #[test]
    #[cfg(unix)]
    fn mode_change_alone_triggers_write() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let src = source(&tmp, "run.sh", "#!/bin/sh\n");
        fs::set_permissions(&src, fs::Permissions::from_mode(0o755)).unwrap();
        let dst = tmp.path().join("copy.sh");
        fs::write(&dst, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&dst, fs::Permissions::from_mode(0o644)).unwrap();

        let result = copy_file(&src, &dst, false, false).unwrap();
        assert!(matches!(result, WriteResult::Written { .. }));
        let mode = fs::metadata(&dst).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o755);
    }

    #[test]
    #[cfg(unix)]
    fn rename_failure_leaves_original_and_cleans_tmp() {
        use std::os::unix::fs::PermissionsExt;

        let root = TempDir::new().unwrap();
        let src = source(&root, "src.json", "new content");
        let readonly_dir = root.path().join("readonly");
        fs::create_dir_all(&readonly_dir).unwrap();
        let dst = readonly_dir.join("file.json");
        fs::write(&dst, "original").unwrap();

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o555);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        let tmp_dir = TempDir::new().unwrap();
        let tmp_path = tmp_dir.path().join("file.json.fleet.tmp");

        let result = copy_file_with_tmp(&src, &dst, false, false, &tmp_path);

        let mut perms = fs::metadata(&readonly_dir).unwrap().permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&readonly_dir, perms).unwrap();

        // Running as root bypasses directory permissions.
        if result.is_ok() {
            return;
        }
        assert_eq!(fs::read_to_string(&dst).unwrap(), "original");
        assert!(!tmp_path.exists(), ".fleet.tmp should be cleaned up");
    }
}
