//! fleet: keep a fleet of GitHub repositories in step.
//!
//! # Usage
//!
//! ```text
//! fleet [--config PATH] [--workspace DIR] [--exclude PREFIX]... [--repo NAME] <command>
//!
//! fleet init [--force]
//! fleet propagate <message> [--dry-run]
//! fleet bootstrap <name>... [--no-dispatch]
//! fleet sync-template [--dry-run] [--preserve]
//! fleet configure [--dry-run]
//! fleet clone [--dry-run]
//! fleet cleanup [--dry-run]
//! fleet close [--dry-run]
//! fleet trigger <workflow> [--ref REF] [--delay-secs N] [--dry-run]
//! fleet status
//! ```
//!
//! Every command that reports per repository also accepts `--json` and
//! `--output FILE`. The exit code is 1 when any repository reported an error.

mod commands;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{
    bootstrap::BootstrapArgs, cleanup::CleanupArgs, clone::CloneArgs, close::CloseArgs,
    configure::ConfigureArgs, context::GlobalArgs, init::InitArgs, propagate::PropagateArgs,
    status::StatusArgs, sync_template::SyncTemplateArgs, trigger::TriggerArgs,
};

// ---------------------------------------------------------------------------
// CLI entry point
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(
    name = "fleet",
    version,
    about = "Propagate changes, bootstrap repositories and sync templates across a GitHub fleet",
    long_about = None,
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Write a default fleet.yaml into the workspace.
    Init(InitArgs),

    /// Commit local edits on a change branch and open auto-merging pull requests.
    Propagate(PropagateArgs),

    /// Create repositories from the template and configure them.
    Bootstrap(BootstrapArgs),

    /// Mirror the template repository's paths into every fleet repository.
    SyncTemplate(SyncTemplateArgs),

    /// Apply merge settings and branch protection to existing repositories.
    Configure(ConfigureArgs),

    /// Clone (or hard-reset) every organization repository into the workspace.
    Clone(CloneArgs),

    /// Delete local change branches whose pull requests have merged.
    Cleanup(CleanupArgs),

    /// Abandon outstanding change branches and their pull requests.
    Close(CloseArgs),

    /// Dispatch a workflow on every fleet repository.
    Trigger(TriggerArgs),

    /// Show the sync state of every fleet repository.
    Status(StatusArgs),
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<ExitCode> {
    init_tracing();
    let cli = Cli::parse();
    let global = cli.global;
    match cli.command {
        Commands::Init(args) => args.run(&global),
        Commands::Propagate(args) => args.run(&global),
        Commands::Bootstrap(args) => args.run(&global),
        Commands::SyncTemplate(args) => args.run(&global),
        Commands::Configure(args) => args.run(&global),
        Commands::Clone(args) => args.run(&global),
        Commands::Cleanup(args) => args.run(&global),
        Commands::Close(args) => args.run(&global),
        Commands::Trigger(args) => args.run(&global),
        Commands::Status(args) => args.run(&global),
    }
}
