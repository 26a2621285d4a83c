//! `fleet init [--force]`

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Args;

use fleet_core::config::{self, FleetConfig, CONFIG_FILE_NAME};

use super::context::GlobalArgs;

/// Write a default `fleet.yaml` to `--config`, or into `--workspace`
/// (the current directory when neither is given).
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing configuration file.
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    pub fn run(self, global: &GlobalArgs) -> Result<ExitCode> {
        let path = match (&global.config, &global.workspace) {
            (Some(path), _) => path.clone(),
            (None, Some(dir)) => dir.join(CONFIG_FILE_NAME),
            (None, None) => std::env::current_dir()
                .context("could not determine current directory")?
                .join(CONFIG_FILE_NAME),
        };
        if path.exists() && !self.force {
            bail!(
                "'{}' already exists (use --force to overwrite)",
                path.display()
            );
        }

        let mut config = FleetConfig::default();
        if global.workspace.is_some() {
            config.workspace = PathBuf::from(".");
        }
        config.repos.exclude_prefixes = global.exclude.clone();
        config::save_at(&path, &config)
            .with_context(|| format!("failed to write '{}'", path.display()))?;

        println!("✓ Wrote {}", path.display());
        println!("  Organization: {}", config.org);
        println!("  Template:     {}", config.template.repo);
        Ok(ExitCode::SUCCESS)
    }
}
