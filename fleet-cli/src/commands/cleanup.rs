//! `fleet cleanup`: return checkouts to the base branch once their change
//! branch has merged.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use fleet_ops::cleanup;

use super::context::{FleetContext, GlobalArgs};
use super::output::{self, ReportArgs};

/// Arguments for `fleet cleanup`.
#[derive(Args, Debug)]
pub struct CleanupArgs {
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub report: ReportArgs,
}

impl CleanupArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let ctx = FleetContext::load(global)?;
        let repos = ctx.handles()?;
        let reports = cleanup(
            &ctx.git(),
            &repos,
            &ctx.config.change_branch,
            &ctx.config.base_branch,
            self.dry_run,
        );
        output::finish("cleanup", &reports, &self.report)
    }
}
