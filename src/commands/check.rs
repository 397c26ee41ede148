//! Check command implementation.
//!
//! Reports inconsistencies between the dispatcher and router tables.

use anyhow::{Context, Result};
use std::path::Path;
use std::process::ExitCode;

use crate::config::Config;
use crate::consistency::{self, Severity};
use crate::engine::WorkingCopies;
use crate::fs_abstraction::RealFileSystem;

/// Run the check command
pub async fn run(json: bool, config_path: &Path) -> Result<ExitCode> {
    let config = Config::load_or_default(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    let copies = WorkingCopies::open(&RealFileSystem, &config)?;

    let report = consistency::check(&copies);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else if report.findings.is_empty() {
        println!("[OK] Dispatcher and router tables are consistent");
    } else {
        for finding in &report.findings {
            let tag = match finding.severity {
                Severity::Problem => "[FAIL]",
                Severity::Notice => "[INFO]",
            };
            println!(
                "{} {}: {} ({})",
                tag,
                finding.kind,
                finding.message,
                finding.file.display()
            );
        }
        println!();
        println!(
            "{} problem(s), {} notice(s)",
            report.problems(),
            report.findings.len() - report.problems()
        );
    }

    if report.has_problems() {
        return Ok(ExitCode::FAILURE);
    }
    Ok(ExitCode::SUCCESS)
}
