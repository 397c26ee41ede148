//! partneracl - Partner whitelist manager for SAP Web Dispatcher and SAProuter
//!
//! Adds partner source addresses to the dispatcher ACL and the router
//! table in one locked, backed-up session.

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use partneracl::cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = if cli.verbose {
        Level::DEBUG
    } else if cli.quiet {
        Level::ERROR
    } else {
        Level::INFO
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .with_thread_ids(false)
        .without_time()
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Add(args) => partneracl::commands::add::run(args, &cli.config).await,
        Commands::List { cert_id, json } => {
            partneracl::commands::list::run(cert_id, json, &cli.config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check { json } => partneracl::commands::check::run(json, &cli.config).await,
        Commands::Lookup { sid } => {
            partneracl::commands::lookup::run(&sid, &cli.config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Init { force } => {
            partneracl::commands::init::run(force, &cli.config).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Version => {
            println!("partneracl {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }
    }
}
