use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;
use console::style;
use pgshift_runtime::schema::resolve_path;
use pgshift_runtime::{SchemaDumper, SchemaLoader};

use super::Context;

/// Dump the database schema with pg_dump.
#[derive(Parser)]
pub struct DumpCommand {
    /// Output file (defaults to `[dump].output`).
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl DumpCommand {
    pub async fn execute(self, ctx: &Context) -> Result<ExitCode> {
        let url = ctx.database_url()?;
        let output = resolve_path(self.output, &ctx.config.dump.output);

        let dumper = SchemaDumper::new(&ctx.config.dump.pg_dump);
        let bytes = dumper.dump(&url, &output).await?;

        println!();
        println!(
            "  {} Schema written to {} ({} bytes)",
            style("✓").green(),
            style(output.display()).cyan(),
            bytes
        );
        println!();

        Ok(ExitCode::SUCCESS)
    }
}

/// Load a schema file.
#[derive(Parser)]
pub struct LoadCommand {
    /// Schema file (defaults to `[dump].output`).
    #[arg(short, long)]
    pub input: Option<PathBuf>,
}

impl LoadCommand {
    pub async fn execute(self, ctx: &Context) -> Result<ExitCode> {
        let input = resolve_path(self.input, &ctx.config.dump.output);
        if !input.is_file() {
            anyhow::bail!("Schema file not found: {}", input.display());
        }

        let db = ctx.connect().await?;
        let mut loader = SchemaLoader::new(db.session());
        let result = loader.load(&input).await;
        drop(loader);
        db.close().await;
        let statements = result?;

        println!();
        println!(
            "  {} Loaded {} ({} statement(s))",
            style("✓").green(),
            style(input.display()).cyan(),
            statements
        );
        println!();

        Ok(ExitCode::SUCCESS)
    }
}
