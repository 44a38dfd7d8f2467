//! Diary CLI - maintenance commands for the diary database
//!
//! `diary backup` is the process the web server runs for its backup page.

mod cli;
mod commands;
mod error;

use clap::Parser;

use cli::{Cli, Commands};
use commands::backup::run_backup;
use commands::common::resolve_db_path;
use commands::completions::run_completions;
use commands::export::run_export;
use commands::list::run_list;
use commands::token::run_token;
use error::CliError;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    let directive = "diary=info"
        .parse()
        .map_err(|error| CliError::Config(format!("invalid log directive: {error}")))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(directive))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);

    match cli.command {
        Commands::Backup { output_dir } => run_backup(&output_dir, &db_path).await?,
        Commands::Export { format, output } => {
            run_export(format, output.as_deref(), &db_path).await?;
        }
        Commands::List {
            owner,
            page,
            page_size,
            json,
        } => {
            run_list(&owner, page.as_deref(), page_size, json, &db_path).await?;
        }
        Commands::Token { user, ttl_secs } => run_token(&user, ttl_secs)?,
        Commands::Completions { shell, output } => {
            run_completions(shell, output.as_deref())?;
        }
    }

    Ok(())
}
