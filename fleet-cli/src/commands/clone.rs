//! `fleet clone`: populate or refresh the workspace from the organization.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Args;

use fleet_ops::{clone_workspace, CloneRequest};

use super::context::{FleetContext, GlobalArgs};
use super::output::{self, ReportArgs};

/// Arguments for `fleet clone`.
#[derive(Args, Debug)]
pub struct CloneArgs {
    /// List what would be cloned or updated without touching the workspace.
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub report: ReportArgs,
}

impl CloneArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let ctx = FleetContext::load(global)?;
        let (git, gh) = (ctx.git(), ctx.gh());
        let reports = clone_workspace(
            &git,
            &gh,
            CloneRequest {
                org: &ctx.config.org,
                workspace: &ctx.workspace,
                filter: &ctx.filter,
                template: &ctx.config.template.repo,
                base: &ctx.config.base_branch,
                dry_run: self.dry_run,
            },
        )
        .with_context(|| format!("failed to list repositories of '{}'", ctx.config.org))?;
        output::finish("clone", &reports, &self.report)
    }
}
