//! Shared report rendering: table on stdout, or JSON with `--json`, plus an
//! optional JSON copy written to `--output FILE`.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

use fleet_ops::{any_errors, Outcome, RepoReport};

/// Report flags shared by every per-repository command.
#[derive(Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Emit machine-readable JSON instead of a table.
    #[arg(long)]
    pub json: bool,

    /// Also write the JSON report to FILE.
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

#[derive(Serialize)]
struct JsonReport<'a, O> {
    command: &'a str,
    generated_at: DateTime<Utc>,
    summary: Summary,
    repos: &'a [RepoReport<O>],
}

#[derive(Debug, Clone, Copy, Serialize)]
struct Summary {
    total: usize,
    errors: usize,
}

#[derive(Tabled)]
struct ReportRow {
    #[tabled(rename = "repository")]
    repo: String,
    #[tabled(rename = "result")]
    result: String,
    #[tabled(rename = "detail")]
    detail: String,
}

/// Print `reports` and map them to the process exit code.
pub fn finish<O>(command: &str, reports: &[RepoReport<O>], args: &ReportArgs) -> Result<ExitCode>
where
    O: Outcome + Serialize,
{
    let summary = Summary {
        total: reports.len(),
        errors: reports.iter().filter(|r| r.outcome.is_error()).count(),
    };

    if args.json || args.output.is_some() {
        let payload = JsonReport {
            command,
            generated_at: Utc::now(),
            summary,
            repos: reports,
        };
        let json = serde_json::to_string_pretty(&payload)
            .with_context(|| format!("failed to serialize {command} report"))?;
        if let Some(path) = &args.output {
            write_report(path, &json)?;
        }
        if args.json {
            println!("{json}");
        }
    }
    if !args.json {
        print_table(command, reports, summary);
    }

    Ok(if any_errors(reports) {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    })
}

fn write_report(path: &Path, json: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create '{}'", parent.display()))?;
        }
    }
    std::fs::write(path, format!("{json}\n"))
        .with_context(|| format!("failed to write report to '{}'", path.display()))
}

fn print_table<O: Outcome>(command: &str, reports: &[RepoReport<O>], summary: Summary) {
    if reports.is_empty() {
        println!("{command}: no repositories matched.");
        return;
    }

    let rows: Vec<ReportRow> = reports
        .iter()
        .map(|r| ReportRow {
            repo: r.repo.clone(),
            result: r.outcome.label().to_string(),
            detail: r.outcome.detail(),
        })
        .collect();
    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let errors = if summary.errors == 0 {
        "0 errors".green().bold().to_string()
    } else {
        format!("{} errors", summary.errors).red().bold().to_string()
    };
    println!(
        "{command}: {} repositories | {errors}",
        summary.total
    );
}
