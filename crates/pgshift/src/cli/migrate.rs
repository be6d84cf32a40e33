use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use console::style;
use pgshift_runtime::{Reconciler, StatusReport};

use super::Context;

fn banner(title: &str) {
    println!();
    println!("  {}  {}", style("⛁").bold(), style(title).bold().cyan());
    println!();
}

/// Apply all pending migrations.
#[derive(Parser)]
pub struct UpCommand {}

impl UpCommand {
    pub async fn execute(self, ctx: &Context) -> Result<ExitCode> {
        let store = ctx.store();
        // Surface a missing root before touching the database.
        store.ensure_exists()?;

        let db = ctx.connect().await?;
        let mut reconciler = Reconciler::new(db.session(), store);
        let result = reconciler.apply_pending().await;
        drop(reconciler);
        db.close().await;
        let report = result?;

        banner("Migrations");

        for name in &report.skipped {
            println!(
                "  {} Skipped {} (no up.sql content)",
                style("⚠").yellow(),
                style(name).yellow()
            );
        }

        if report.is_noop() {
            println!("  {} Nothing to apply, database is up to date", style("ℹ").blue());
        } else {
            for name in &report.applied {
                println!("  {} Applied: {}", style("✓").green(), style(name).cyan());
            }
            println!();
            println!(
                "  {} Applied {} migration(s), {} statement(s)",
                style("✓").green(),
                report.applied.len(),
                report.statements
            );
        }
        println!();

        Ok(ExitCode::SUCCESS)
    }
}

/// Revert the most recently applied migration.
#[derive(Parser)]
pub struct DownCommand {}

impl DownCommand {
    pub async fn execute(self, ctx: &Context) -> Result<ExitCode> {
        let store = ctx.store();
        store.ensure_exists()?;

        let db = ctx.connect().await?;
        let mut reconciler = Reconciler::new(db.session(), store);
        let result = reconciler.revert_last().await;
        drop(reconciler);
        db.close().await;
        let reverted = result?;

        banner("Migrations");

        match reverted {
            None => println!("  {} No migrations to roll back", style("ℹ").blue()),
            Some(report) => {
                if !report.ran_script {
                    println!(
                        "  {} {} has no down.sql content, removed ledger entry only",
                        style("⚠").yellow(),
                        style(&report.name).yellow()
                    );
                }
                println!(
                    "  {} Rolled back: {}",
                    style("✓").green(),
                    style(&report.name).cyan()
                );
            }
        }
        println!();

        Ok(ExitCode::SUCCESS)
    }
}

/// Show applied and pending migrations.
#[derive(Parser)]
pub struct StatusCommand {
    /// Print counts only.
    #[arg(short, long)]
    pub quiet: bool,

    /// Exit with status 1 when any migration is pending.
    #[arg(long)]
    pub check: bool,

    /// Print the report as JSON.
    #[arg(long, conflicts_with = "quiet")]
    pub json: bool,
}

impl StatusCommand {
    pub async fn execute(self, ctx: &Context) -> Result<ExitCode> {
        let store = ctx.store();
        store.ensure_exists()?;

        let db = ctx.connect().await?;
        let mut reconciler = Reconciler::new(db.session(), store);
        let result = reconciler.status().await;
        drop(reconciler);
        db.close().await;
        let status = result?;

        if self.json {
            println!("{}", serde_json::to_string_pretty(&status)?);
        } else if self.quiet {
            println!("{}", summary_line(&status));
        } else {
            print_status(&status);
        }

        Ok(status_exit_code(&status, self.check))
    }
}

/// `--check` turns pending migrations into exit status 1.
fn status_exit_code(status: &StatusReport, check: bool) -> ExitCode {
    if check && status.has_pending() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}

fn summary_line(status: &StatusReport) -> String {
    format!(
        "{} applied, {} pending",
        status.applied_count(),
        status.pending_count()
    )
}

fn print_status(status: &StatusReport) {
    banner("Migration Status");

    if status.is_empty() {
        println!("  {} No migrations found", style("ℹ").blue());
        println!();
        return;
    }

    for entry in &status.entries {
        let down_marker = if entry.has_down {
            style("↓").green().to_string()
        } else {
            style("-").dim().to_string()
        };
        match entry.applied_at {
            Some(at) => println!(
                "  {} {} {} {} ({})",
                style("✓").green(),
                down_marker,
                style(&entry.name).cyan(),
                style("at").dim(),
                at.format("%Y-%m-%d %H:%M:%S")
            ),
            None => println!(
                "  {} {} {}",
                style("○").yellow(),
                down_marker,
                style(&entry.name).yellow()
            ),
        }
    }

    println!();
    println!("  {} {}", style("ℹ").blue(), summary_line(status));
    println!();
    println!(
        "  {} = has down migration, {} = no down migration",
        style("↓").green(),
        style("-").dim()
    );
    println!();
}
