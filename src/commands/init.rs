//! Init command implementation: write a default configuration file.

use anyhow::Result;
use std::path::Path;
use tracing::info;

use crate::config::Config;

/// Run the init command
pub async fn run(force: bool, config_path: &Path) -> Result<()> {
    if config_path.exists() && !force {
        anyhow::bail!(
            "Config file {:?} already exists. Use --force to overwrite it",
            config_path
        );
    }

    let config = Config::default();
    config.validate()?;
    config.save(config_path)?;

    info!("Wrote default configuration to {:?}", config_path);
    println!("[OK] Configuration written to {}", config_path.display());
    println!("     Review the table paths and reload command before the first session.");

    Ok(())
}
