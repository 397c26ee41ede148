//! Add command implementation.
//!
//! Runs one interactive session under the session lock. The session
//! itself is blocking (it reads stdin), so it runs on the blocking pool
//! while the async side waits for it or for SIGINT/SIGTERM. An interrupt
//! that lands while the tables are being written waits for the write to
//! finish and reports its outcome before exiting.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, info};

use crate::cli::AddArgs;
use crate::cmd_abstraction::RealCommandExecutor;
use crate::config::Config;
use crate::engine::ReloadStatus;
use crate::error::AclError;
use crate::fs_abstraction::RealFileSystem;
use crate::lock::SessionLock;
use crate::prompt::TerminalPrompt;
use crate::session::{CommitSummary, Session, SessionInput, SessionOutcome};
use crate::signal::{
    global_cleanup, global_commit_gate, InterruptAction, InterruptListener, INTERRUPTED_EXIT_CODE,
};

/// Run the add command
pub async fn run(args: AddArgs, config_path: &Path) -> Result<ExitCode> {
    let config = Config::load_or_default(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    let input = SessionInput::from(args);

    // Handlers go in before the session can take the lock.
    let mut interrupts = InterruptListener::register();
    let mut session = tokio::task::spawn_blocking(move || run_session(&config, input));

    let interrupt = tokio::select! {
        joined = &mut session => return joined.context("Session task panicked")?,
        interrupt = interrupts.recv() => interrupt,
    };

    if global_commit_gate().interrupt() == InterruptAction::WaitForCommit {
        eprintln!(
            "[WARN] {:?} received while writing the tables, finishing the write first",
            interrupt
        );
        match session.await.context("Session task panicked")? {
            Ok(_) => info!("Write finished before exit"),
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }

    let removed = global_cleanup().run();
    debug!("Removed {} session file(s)", removed);
    eprintln!("[WARN] Session interrupted by {:?}", interrupt);
    std::process::exit(INTERRUPTED_EXIT_CODE);
}

fn run_session(config: &Config, input: SessionInput) -> Result<ExitCode> {
    let _lock = SessionLock::acquire(&config.lock_file)?;

    let fs = RealFileSystem;
    let executor = RealCommandExecutor::new();
    let mut prompt = TerminalPrompt::stdio();
    let mut session = Session::new(config, &fs, &executor).with_commit_gate(global_commit_gate());

    match session.run(&mut prompt, input) {
        Ok(SessionOutcome::Committed(summary)) => {
            print_summary(&summary);
            Ok(ExitCode::SUCCESS)
        }
        Ok(SessionOutcome::NothingToDo(reason)) => {
            println!("[WARN] Nothing to do: {}", reason);
            Ok(ExitCode::FAILURE)
        }
        Err(e) => match e.downcast_ref::<AclError>() {
            Some(AclError::UnresolvedSid(_)) => {
                error!("{}", e);
                anyhow::bail!("Internal error: merge aborted, no files were changed")
            }
            _ => Err(e),
        },
    }
}

fn print_summary(summary: &CommitSummary) {
    println!();
    println!(
        "[OK] Partner {}: {}",
        summary.certification_id, summary.partner_name
    );

    for line in &summary.report.dispatcher_added {
        println!("  + [dispatcher] {}", line);
    }
    for line in &summary.report.router_added {
        println!("  + [router]     {}", line);
    }
    if !summary.report.skipped.is_empty() {
        println!(
            "[WARN] {} entr{} already present, skipped",
            summary.report.skipped.len(),
            if summary.report.skipped.len() == 1 { "y" } else { "ies" }
        );
    }
    for (ip, sid) in &summary.report.partial_pairs {
        println!("[WARN] Only one router entry was new for {} / {}", ip, sid);
    }

    for backup in &summary.backups {
        info!("Backup: {:?}", backup);
    }
    for path in &summary.commit.written {
        println!("[OK] Wrote {}", path.display());
    }

    match &summary.commit.reload {
        ReloadStatus::Skipped => println!("[INFO] Router reload skipped"),
        ReloadStatus::Succeeded => println!("[OK] Router reloaded"),
        ReloadStatus::Failed(reason) => {
            println!("[WARN] Router reload failed: {}", reason);
            println!("       The tables were written; reload the router manually.");
        }
    }
}
