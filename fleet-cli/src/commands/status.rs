//! `fleet status`: read-only sync state of every fleet repository.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use fleet_ops::status;

use super::context::{FleetContext, GlobalArgs};
use super::output::{self, ReportArgs};

/// Arguments for `fleet status`.
#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub report: ReportArgs,
}

impl StatusArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let ctx = FleetContext::load(global)?;
        let repos = ctx.handles()?;
        if !self.report.json {
            let config = ctx
                .config_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "defaults".to_string());
            println!(
                "fleet v{} | {} | {} repositories | config: {config}",
                env!("CARGO_PKG_VERSION"),
                ctx.workspace.display(),
                repos.len(),
            );
        }
        let (git, gh) = (ctx.git(), ctx.gh());
        let reports = status(&git, &gh, &repos, &ctx.config.change_branch);
        output::finish("status", &reports, &self.report)
    }
}
