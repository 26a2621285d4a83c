//! `fleet propagate <message>`: one change branch, one commit and one
//! auto-merging pull request per repository with local edits.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use clap::Args;

use fleet_ops::{PropagateSettings, Propagator, WatchSettings};
use fleet_renderer::Renderer;

use super::context::{FleetContext, GlobalArgs};
use super::output::{self, ReportArgs};

/// Arguments for `fleet propagate`.
#[derive(Args, Debug)]
pub struct PropagateArgs {
    /// Commit message, also the pull request title unless --title is given.
    pub message: String,

    /// Pull request title.
    #[arg(long)]
    pub title: Option<String>,

    /// Pull request body, instead of the rendered template.
    #[arg(long)]
    pub body: Option<String>,

    /// Wait for each opened pull request to merge or close, then clean up
    /// the checkout.
    #[arg(long)]
    pub watch: bool,

    /// State checks per pull request while watching.
    #[arg(long, default_value_t = 30, value_name = "N", requires = "watch")]
    pub watch_attempts: u32,

    /// Seconds between state checks while watching.
    #[arg(long, default_value_t = 20, value_name = "SECS", requires = "watch")]
    pub watch_interval_secs: u64,

    /// Classify every repository and report what would happen, without
    /// creating branches, commits or pull requests.
    #[arg(long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub report: ReportArgs,
}

impl PropagateArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        ensure!(
            !self.message.trim().is_empty(),
            "the commit message must not be empty"
        );
        let ctx = FleetContext::load(global)?;
        let repos = ctx.handles()?;
        let renderer = Renderer::with_overrides(ctx.config.templates_dir.as_deref())
            .context("failed to load pull request templates")?;

        let watch = (self.watch && !self.dry_run).then(|| WatchSettings {
            attempts: self.watch_attempts.max(1),
            interval: Duration::from_secs(self.watch_interval_secs),
        });
        let settings = PropagateSettings {
            message: self.message,
            title: self.title.filter(|t| !t.trim().is_empty()),
            body: self.body,
            branch: ctx.config.change_branch.clone(),
            base: ctx.config.base_branch.clone(),
            merge_method: ctx.config.merge_method,
            dry_run: self.dry_run,
            watch,
        };
        let (git, gh) = (ctx.git(), ctx.gh());
        let reports = Propagator::new(&git, &gh, &renderer, settings).run(&repos);
        output::finish("propagate", &reports, &self.report)
    }
}
