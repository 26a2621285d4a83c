//! `fleet configure`: re-apply merge settings and branch protection to
//! repositories that already exist.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use fleet_ops::configure;

use super::context::{FleetContext, GlobalArgs};
use super::output::{self, ReportArgs};

/// Arguments for `fleet configure`.
#[derive(Args, Debug)]
pub struct ConfigureArgs {
    /// Report what would be applied without calling the hosting API.
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub report: ReportArgs,
}

impl ConfigureArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let ctx = FleetContext::load(global)?;
        let repos = ctx.handles()?;
        let reports = configure(
            &ctx.gh(),
            &repos,
            &ctx.config.bootstrap,
            &ctx.config.base_branch,
            self.dry_run,
        );
        output::finish("configure", &reports, &self.report)
    }
}
