//! SID lookup command implementation.

use anyhow::{Context, Result};
use std::path::Path;

use crate::acl::{AclTable, ReferenceTable, RouterEntry};
use crate::config::Config;
use crate::fs_abstraction::{FileSystem, RealFileSystem};
use crate::validation::validate_sid;

/// Run the lookup command
pub async fn run(sid: &str, config_path: &Path) -> Result<()> {
    let sid = validate_sid(sid)?;
    let config = Config::load_or_default(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    let text = RealFileSystem
        .read_to_string(&config.router_table)
        .with_context(|| format!("Failed to read {:?}", config.router_table))?;
    let router: AclTable<RouterEntry> =
        AclTable::parse(&config.router_table, &text, &config.router_anchor())?;
    let reference = ReferenceTable::from_lines(router.lines());

    let Some(record) = reference.resolve(&sid) else {
        anyhow::bail!(
            "SID {} not found among {} reference row(s) in {:?}",
            sid,
            reference.len(),
            config.router_table
        );
    };

    println!("{}", record.sid);
    println!("  Host:            {}", record.hostname);
    println!("  Dispatcher port: {}", record.dispatcher_port);
    println!("  Gateway port:    {}", record.gateway_port);

    Ok(())
}
