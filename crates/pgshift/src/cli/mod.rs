mod context;
mod create;
mod init;
mod migrate;
mod schema;
mod seed;
mod template;

pub use context::Context;
pub use create::CreateCommand;
pub use init::InitCommand;
pub use migrate::{DownCommand, StatusCommand, UpCommand};
pub use schema::{DumpCommand, LoadCommand};
pub use seed::SeedCommand;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use pgshift_core::config::DEFAULT_CONFIG_FILE;
use tracing_subscriber::EnvFilter;

/// pgshift - plain SQL migrations for PostgreSQL
#[derive(Parser)]
#[command(name = "pgshift")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Configuration file path (optional).
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, global = true)]
    pub config: PathBuf,

    /// Migrations directory (overrides config).
    #[arg(short, long, global = true)]
    pub migrations_dir: Option<PathBuf>,

    /// Connection string (overrides DATABASE_URL / POSTGRES_URL).
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    /// More log output (-v info, -vv debug).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// Create the migrations directory and a starter config.
    Init(InitCommand),

    /// Scaffold a new migration directory.
    Create(CreateCommand),

    /// Apply all pending migrations.
    Up(UpCommand),

    /// Revert the most recently applied migration.
    Down(DownCommand),

    /// Show applied and pending migrations.
    Status(StatusCommand),

    /// Run seed data scripts.
    Seed(SeedCommand),

    /// Dump the database schema with pg_dump.
    Dump(DumpCommand),

    /// Load a schema file.
    Load(LoadCommand),
}

impl Cli {
    /// Execute the CLI command. Only this layer picks the exit code.
    pub async fn execute(self) -> Result<ExitCode> {
        let ctx = Context::load(&self.global)?;
        match self.command {
            Commands::Init(cmd) => cmd.execute(&ctx),
            Commands::Create(cmd) => cmd.execute(&ctx),
            Commands::Up(cmd) => cmd.execute(&ctx).await,
            Commands::Down(cmd) => cmd.execute(&ctx).await,
            Commands::Status(cmd) => cmd.execute(&ctx).await,
            Commands::Seed(cmd) => cmd.execute(&ctx).await,
            Commands::Dump(cmd) => cmd.execute(&ctx).await,
            Commands::Load(cmd) => cmd.execute(&ctx).await,
        }
    }
}

/// Install the stderr log subscriber. `RUST_LOG` wins when set.
pub fn init_tracing(verbose: u8) {
    let level = log_level(verbose);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn log_level(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}
