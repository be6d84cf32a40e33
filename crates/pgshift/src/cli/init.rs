use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context as _, Result};
use clap::Parser;
use console::style;
use pgshift_core::config::ShiftConfig;

use super::Context;

/// Create the migrations directory and a starter config.
#[derive(Parser)]
pub struct InitCommand {
    /// Do not create the seeds directory.
    #[arg(long)]
    pub no_seeds: bool,
}

/// What `init` created; anything already present is left untouched.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InitOutcome {
    pub created: Vec<PathBuf>,
    pub existing: Vec<PathBuf>,
}

impl InitCommand {
    pub fn execute(self, ctx: &Context) -> Result<ExitCode> {
        let seeds = (!self.no_seeds).then_some(ctx.config.migrations.seeds_dir.as_path());
        let outcome = init_layout(&ctx.config_path, &ctx.migrations_dir, seeds)?;

        println!();
        for path in &outcome.created {
            println!("  {} Created {}", style("✓").green(), path.display());
        }
        for path in &outcome.existing {
            println!("  {} {} already exists", style("ℹ").blue(), path.display());
        }
        println!();
        println!(
            "  Next: {} to scaffold a migration",
            style("pgshift create <name>").cyan()
        );
        println!();

        Ok(ExitCode::SUCCESS)
    }
}

/// Idempotently create the config file and directories.
pub fn init_layout(
    config_path: &Path,
    migrations_dir: &Path,
    seeds_dir: Option<&Path>,
) -> Result<InitOutcome> {
    let mut outcome = InitOutcome::default();

    for dir in std::iter::once(migrations_dir).chain(seeds_dir) {
        if dir.is_dir() {
            outcome.existing.push(dir.to_path_buf());
        } else {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            outcome.created.push(dir.to_path_buf());
        }
    }

    if config_path.exists() {
        outcome.existing.push(config_path.to_path_buf());
    } else {
        fs::write(config_path, ShiftConfig::template())
            .with_context(|| format!("Failed to write {}", config_path.display()))?;
        outcome.created.push(config_path.to_path_buf());
    }

    Ok(outcome)
}
