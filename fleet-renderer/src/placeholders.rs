//! Token substitution for configuration files in freshly created repositories.
//!
//! Template repositories ship files that contain fixed placeholder tokens
//! (for example a workflow trigger prefix). The tokens and the form of the
//! repository name that replaces each one are declared in `fleet.yaml`; this
//! module builds the resulting `token → value` map and applies it.
//!
//! The text is scanned once, left to right. At each position the longest
//! matching token wins, and substituted values are never scanned again.

use std::path::{Path, PathBuf};

use fleet_core::config::Placeholder;

use crate::error::RenderError;

/// A resolved `token → value` map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitutions {
    entries: Vec<(String, String)>,
}

/// Result of applying [`Substitutions`] to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOutcome {
    pub path: PathBuf,
    /// `false` when no token was present, so nothing was written.
    pub changed: bool,
    /// Declared tokens that did not occur in the file.
    pub missing_tokens: Vec<String>,
}

impl Substitutions {
    /// Resolve `placeholders` against a repository name.
    pub fn for_repo(name: &str, placeholders: &[Placeholder]) -> Self {
        let mut entries: Vec<(String, String)> = placeholders
            .iter()
            .map(|p| (p.token.clone(), p.value.apply(name)))
            .collect();
        entries.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(&b.0)));
        entries.dedup_by(|a, b| a.0 == b.0);
        Substitutions { entries }
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.entries
    }

    /// Apply every substitution. Returns the new text and the tokens that
    /// were not found.
    pub fn apply(&self, content: &str) -> (String, Vec<String>) {
        let mut out = String::with_capacity(content.len());
        let mut used = vec![false; self.entries.len()];
        let mut rest = content;
        while let Some(ch) = rest.chars().next() {
            // `entries` is sorted longest first.
            let hit = self
                .entries
                .iter()
                .position(|(token, _)| !token.is_empty() && rest.starts_with(token.as_str()));
            match hit {
                Some(i) => {
                    let (token, value) = &self.entries[i];
                    used[i] = true;
                    out.push_str(value);
                    rest = &rest[token.len()..];
                }
                None => {
                    out.push(ch);
                    rest = &rest[ch.len_utf8()..];
                }
            }
        }
        let missing = self
            .entries
            .iter()
            .zip(&used)
            .filter(|(_, used)| !**used)
            .map(|((token, _), _)| token.clone())
            .collect();
        (out, missing)
    }

    /// Rewrite the file at `path` in place (write to `.tmp`, then rename).
    pub fn rewrite_file(&self, path: &Path) -> Result<RewriteOutcome, RenderError> {
        if !path.is_file() {
            return Err(RenderError::RewriteTargetMissing {
                path: path.to_path_buf(),
            });
        }
        let original = std::fs::read_to_string(path).map_err(|e| RenderError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        let (rewritten, missing_tokens) = self.apply(&original);
        let changed = rewritten != original;
        if changed {
            let tmp = PathBuf::from(format!("{}.fleet.tmp", path.display()));
            std::fs::write(&tmp, &rewritten).map_err(|e| RenderError::Io {
                path: tmp.clone(),
                source: e,
            })?;
            if let Err(e) = std::fs::rename(&tmp, path) {
                let _ = std::fs::remove_file(&tmp);
                return Err(RenderError::Io {
                    path: path.to_path_buf(),
                    source: e,
                });
            }
        }
        Ok(RewriteOutcome {
            path: path.to_path_buf(),
            changed,
            missing_tokens,
        })
    }
}
