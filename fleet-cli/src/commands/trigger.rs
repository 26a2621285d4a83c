//! `fleet trigger <workflow>`: dispatch a workflow across the fleet with a
//! fixed pause between dispatches.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Args;

use fleet_ops::trigger;

use super::context::{FleetContext, GlobalArgs};
use super::output::{self, ReportArgs};

/// Arguments for `fleet trigger`.
#[derive(Args, Debug)]
pub struct TriggerArgs {
    /// Workflow file name or workflow name (e.g. `daily.yml`).
    pub workflow: String,

    /// Git ref to run the workflow on (default: the configured base branch).
    #[arg(long = "ref", value_name = "REF")]
    pub git_ref: Option<String>,

    /// Seconds to wait between dispatches (default: bootstrap.dispatch_delay_secs).
    #[arg(long, value_name = "N")]
    pub delay_secs: Option<u64>,

    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub report: ReportArgs,
}

impl TriggerArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let ctx = FleetContext::load(global)?;
        let repos = ctx.handles()?;
        let git_ref = self
            .git_ref
            .unwrap_or_else(|| ctx.config.base_branch.clone());
        let delay = Duration::from_secs(
            self.delay_secs
                .unwrap_or(ctx.config.bootstrap.dispatch_delay_secs),
        );
        let reports = trigger(
            &ctx.gh(),
            &repos,
            &self.workflow,
            &git_ref,
            delay,
            self.dry_run,
        );
        output::finish("trigger", &reports, &self.report)
    }
}
