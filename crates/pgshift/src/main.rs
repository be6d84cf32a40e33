mod cli;

use std::process::ExitCode;

use clap::Parser;
use console::style;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env if present
    dotenvy::dotenv().ok();

    let cli = cli::Cli::parse();
    cli::init_tracing(cli.global.verbose);

    match cli.execute().await {
        Ok(code) => code,
        Err(e) => {
            eprintln!();
            eprintln!("  {} {:#}", style("✗").red().bold(), e);
            eprintln!();
            ExitCode::FAILURE
        }
    }
}
