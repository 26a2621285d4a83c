//! `fleet sync-template`: mirror the template checkout into every fleet
//! repository.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use fleet_core::types::ErrorKind;
use fleet_ops::{Outcome, RepoReport};
use fleet_sync::{sync_template, MirrorOptions, SyncRequest, TargetReport, WriteResult};

use super::context::{FleetContext, GlobalArgs};
use super::output::{self, ReportArgs};

/// Arguments for `fleet sync-template`.
#[derive(Args, Debug)]
pub struct SyncTemplateArgs {
    /// Show what would be written or removed without touching any file.
    #[arg(long)]
    pub dry_run: bool,

    /// Only add files the target lacks; never overwrite or delete.
    #[arg(long)]
    pub preserve: bool,

    #[command(flatten)]
    pub report: ReportArgs,
}

impl SyncTemplateArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let ctx = FleetContext::load(global)?;
        let targets = ctx.candidates()?;
        let request = SyncRequest {
            template_path: ctx.template_path(),
            template_name: ctx.config.template.repo.clone(),
            include: ctx.config.template.paths.clone(),
            options: MirrorOptions {
                dry_run: self.dry_run,
                preserve_existing: self.preserve,
            },
        };

        let results = sync_template(&request, &targets).context("template sync failed")?;
        if !self.report.json {
            for target in &results {
                print_changes(target, self.dry_run);
            }
        }
        let reports: Vec<RepoReport<SyncOutcome>> = results
            .iter()
            .map(|t| RepoReport::new(t.name.0.clone(), SyncOutcome::from(t)))
            .collect();
        output::finish("sync-template", &reports, &self.report)
    }
}

// ---------------------------------------------------------------------------
// Per-target outcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    Synced {
        written: Vec<String>,
        removed: Vec<String>,
        unchanged: usize,
        warnings: Vec<String>,
    },
    Error {
        kind: ErrorKind,
        reason: String,
    },
}

impl From<&TargetReport> for SyncOutcome {
    fn from(report: &TargetReport) -> Self {
        if let Some((kind, reason)) = &report.error {
            return SyncOutcome::Error {
                kind: *kind,
                reason: reason.clone(),
            };
        }
        let mut written = Vec::new();
        let mut removed = Vec::new();
        let mut unchanged = 0;
        for w in &report.writes {
            let path = w.path().display().to_string();
            match w {
                WriteResult::Written { .. } | WriteResult::WouldWrite { .. } => written.push(path),
                WriteResult::Removed { .. } | WriteResult::WouldRemove { .. } => removed.push(path),
                WriteResult::Unchanged { .. } | WriteResult::Preserved { .. } => unchanged += 1,
            }
        }
        SyncOutcome::Synced {
            written,
            removed,
            unchanged,
            warnings: report.warnings.iter().map(|w| w.message.clone()).collect(),
        }
    }
}

impl Outcome for SyncOutcome {
    fn label(&self) -> &'static str {
        match self {
            SyncOutcome::Synced {
                written, removed, ..
            } if written.is_empty() && removed.is_empty() => "unchanged",
            SyncOutcome::Synced { .. } => "synced",
            SyncOutcome::Error { .. } => "error",
        }
    }

    fn detail(&self) -> String {
        match self {
            SyncOutcome::Synced {
                written,
                removed,
                unchanged,
                warnings,
            } => {
                let mut detail = format!(
                    "{} written, {} removed, {unchanged} unchanged",
                    written.len(),
                    removed.len()
                );
                if !warnings.is_empty() {
                    detail.push_str(&format!("; {}", warnings.join("; ")));
                }
                detail
            }
            SyncOutcome::Error { kind, reason } => format!("{kind}: {reason}"),
        }
    }

    fn is_error(&self) -> bool {
        matches!(self, SyncOutcome::Error { .. })
    }
}

fn print_changes(target: &TargetReport, dry_run: bool) {
    let prefix = if dry_run { "[dry-run] " } else { "" };
    if target.changed() == 0 {
        return;
    }
    println!("{prefix}{}", target.name);
    for w in &target.writes {
        match w {
            WriteResult::Written { path } => println!("  ✎  {}", path.display()),
            WriteResult::WouldWrite { path } => println!("  ~  {}", path.display()),
            WriteResult::Removed { path } => println!("  ✗  {}", path.display()),
            WriteResult::WouldRemove { path } => println!("  -  {}", path.display()),
            WriteResult::Unchanged { .. } | WriteResult::Preserved { .. } => {}
        }
    }
}
