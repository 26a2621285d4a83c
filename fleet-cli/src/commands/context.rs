//! Global flags and the per-invocation view of the fleet they resolve to.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use fleet_core::config::{self, FleetConfig};
use fleet_core::types::RepoHandle;
use fleet_core::workspace::{scan_at, RepoCandidate, RepoFilter};
use fleet_ops::{resolve_handles, GhCli, GitCli, SystemRunner};

/// Flags accepted before or after any subcommand.
#[derive(Args, Debug, Clone, Default)]
pub struct GlobalArgs {
    /// Path to fleet.yaml (default: <workspace>/fleet.yaml, then ~/.fleet/fleet.yaml).
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory holding one checkout per fleet repository.
    #[arg(long, global = true, value_name = "DIR")]
    pub workspace: Option<PathBuf>,

    /// Skip repositories whose name starts with PREFIX (repeatable).
    #[arg(long = "exclude", global = true, value_name = "PREFIX")]
    pub exclude: Vec<String>,

    /// Restrict the run to a single repository.
    #[arg(long, global = true, value_name = "NAME")]
    pub repo: Option<String>,
}

/// Resolved configuration, workspace and membership filter.
#[derive(Debug, Clone)]
pub struct FleetContext {
    pub config: FleetConfig,
    pub config_path: Option<PathBuf>,
    pub workspace: PathBuf,
    pub filter: RepoFilter,
}

impl FleetContext {
    /// Resolve config and workspace. A relative `workspace:` in fleet.yaml is
    /// taken relative to the current directory; `--workspace` always wins.
    pub fn load(global: &GlobalArgs) -> Result<Self> {
        let cwd = std::env::current_dir().context("could not determine current directory")?;
        let hint = global.workspace.clone().unwrap_or_else(|| cwd.clone());
        let (config, config_path) = config::resolve(global.config.as_deref(), &hint)
            .context("failed to load fleet configuration")?;
        let workspace = match &global.workspace {
            Some(dir) => dir.clone(),
            None => config.workspace_dir(&cwd),
        };
        let filter = config
            .repos
            .clone()
            .with_overrides(&global.exclude, global.repo.as_deref());
        tracing::debug!(
            workspace = %workspace.display(),
            config = ?config_path,
            "fleet context resolved"
        );
        Ok(FleetContext {
            config,
            config_path,
            workspace,
            filter,
        })
    }

    /// Checkouts in the workspace that belong to the fleet. Failing to list
    /// them is the one fatal error of every per-repository command.
    pub fn candidates(&self) -> Result<Vec<RepoCandidate>> {
        scan_at(&self.workspace, &self.filter).with_context(|| {
            format!(
                "failed to enumerate repositories in '{}'",
                self.workspace.display()
            )
        })
    }

    pub fn handles(&self) -> Result<Vec<RepoHandle>> {
        Ok(resolve_handles(&self.candidates()?, &self.config.org))
    }

    pub fn template_path(&self) -> PathBuf {
        self.workspace.join(&self.config.template.repo.0)
    }

    pub fn git(&self) -> GitCli<SystemRunner> {
        GitCli::new(SystemRunner)
    }

    pub fn gh(&self) -> GhCli<SystemRunner> {
        GhCli::new(SystemRunner)
    }
}
