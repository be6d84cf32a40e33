use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use console::style;
use pgshift_runtime::Seeder;

use super::Context;

/// Run seed data scripts.
#[derive(Parser)]
pub struct SeedCommand {
    /// Seeds directory (overrides config).
    #[arg(short, long)]
    pub dir: Option<PathBuf>,
}

impl SeedCommand {
    pub async fn execute(self, ctx: &Context) -> Result<ExitCode> {
        let dir = self
            .dir
            .unwrap_or_else(|| ctx.config.migrations.seeds_dir.clone());
        if !dir.is_dir() {
            anyhow::bail!(
                "Seeds directory not found: {}\nRun `pgshift init` or pass --dir.",
                dir.display()
            );
        }

        let db = ctx.connect().await?;
        let mut seeder = Seeder::new(db.session(), &dir);
        let result = seeder.run().await;
        drop(seeder);
        db.close().await;
        let report = result?;

        println!();
        if report.executed.is_empty() {
            println!(
                "  {} No seed scripts in {}",
                style("ℹ").blue(),
                dir.display()
            );
        } else {
            for name in &report.executed {
                println!("  {} Seeded: {}", style("✓").green(), style(name).cyan());
            }
            println!();
            println!(
                "  {} Ran {} seed script(s), {} statement(s)",
                style("✓").green(),
                report.executed.len(),
                report.statements
            );
        }
        println!();

        Ok(ExitCode::SUCCESS)
    }
}
