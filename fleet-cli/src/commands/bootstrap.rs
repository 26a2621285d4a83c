//! `fleet bootstrap <name>...`: create repositories from the template,
//! configure them and kick off their first workflow run.

use std::process::ExitCode;

use anyhow::{bail, Result};
use clap::Args;

use fleet_ops::Bootstrapper;

use super::context::{FleetContext, GlobalArgs};
use super::output::{self, ReportArgs};

/// Arguments for `fleet bootstrap`.
#[derive(Args, Debug)]
pub struct BootstrapArgs {
    /// Names of the repositories to create (e.g. `Toyota-Prius`).
    #[arg(required = true, value_name = "NAME")]
    pub names: Vec<String>,

    /// Skip the workflow dispatch even when one is configured.
    #[arg(long)]
    pub no_dispatch: bool,

    #[command(flatten)]
    pub report: ReportArgs,
}

impl BootstrapArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let names = validate_names(self.names)?;
        let ctx = FleetContext::load(global)?;
        let mut bootstrap = ctx.config.bootstrap.clone();
        if self.no_dispatch {
            bootstrap.workflow = None;
        }

        let (git, gh) = (ctx.git(), ctx.gh());
        let reports = Bootstrapper::new(
            &git,
            &gh,
            &bootstrap,
            ctx.config.org.clone(),
            ctx.workspace.clone(),
            ctx.config.base_branch.clone(),
        )
        .run(&names);
        output::finish("bootstrap", &reports, &self.report)
    }
}

/// Reject names `gh repo create` would misread, keeping the first occurrence
/// of duplicates.
fn validate_names(names: Vec<String>) -> Result<Vec<String>> {
    let mut seen = Vec::with_capacity(names.len());
    for name in names {
        let trimmed = name.trim();
        if trimmed.is_empty() || trimmed.starts_with('.') || trimmed.contains('/') {
            bail!("invalid repository name '{name}'");
        }
        if !seen.iter().any(|n: &String| n == trimmed) {
            seen.push(trimmed.to_string());
        }
    }
    Ok(seen)
}
