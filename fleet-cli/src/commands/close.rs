//! `fleet close`

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use fleet_ops::close;

use super::context::{FleetContext, GlobalArgs};
use super::output::{self, ReportArgs};

/// Arguments for `fleet close`.
#[derive(Args, Debug)]
pub struct CloseArgs {
    /// List the pull requests and branches that would be closed.
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub report: ReportArgs,
}

impl CloseArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let ctx = FleetContext::load(global)?;
        let repos = ctx.handles()?;
        let (git, gh) = (ctx.git(), ctx.gh());
        let reports = close(&git, &gh, &repos, &ctx.config.change_branch, self.dry_run);
        output::finish("close", &reports, &self.report)
    }
}
