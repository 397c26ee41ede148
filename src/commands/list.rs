//! List command implementation.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;

use crate::acl::AclTable;
use crate::config::Config;
use crate::engine::WorkingCopies;
use crate::fs_abstraction::RealFileSystem;

/// One partner as seen across both tables.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PartnerListing {
    pub certification_id: String,
    pub partner_name: String,
    pub dispatcher: Vec<String>,
    pub router: Vec<String>,
}

/// Run the list command
pub async fn run(cert_id: Option<String>, json: bool, config_path: &Path) -> Result<()> {
    let config = Config::load_or_default(config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;
    let copies = WorkingCopies::open(&RealFileSystem, &config)?;

    let partners = collect(&copies, cert_id.as_deref());

    if json {
        println!("{}", serde_json::to_string_pretty(&partners)?);
        return Ok(());
    }

    if partners.is_empty() {
        match cert_id {
            Some(id) => println!("No partner block for certification id {}", id),
            None => println!("No partner blocks"),
        }
        return Ok(());
    }

    for partner in &partners {
        println!("=== {}: {} ===", partner.certification_id, partner.partner_name);
        for line in &partner.dispatcher {
            println!("  [dispatcher] {}", line);
        }
        for line in &partner.router {
            println!("  [router]     {}", line);
        }
        println!();
    }
    println!("{} partner(s)", partners.len());

    Ok(())
}

/// Group blocks by certification id, dispatcher table first. The name
/// comes from the first header seen.
pub fn collect(copies: &WorkingCopies, only: Option<&str>) -> Vec<PartnerListing> {
    let mut partners: Vec<PartnerListing> = Vec::new();
    add_blocks(&mut partners, &copies.dispatcher, only, |p| &mut p.dispatcher);
    add_blocks(&mut partners, &copies.router, only, |p| &mut p.router);
    partners
}

fn add_blocks<E>(
    partners: &mut Vec<PartnerListing>,
    table: &AclTable<E>,
    only: Option<&str>,
    lines_of: fn(&mut PartnerListing) -> &mut Vec<String>,
) {
    for block in table.blocks() {
        let header = block.header();
        if only.is_some_and(|id| id != header.certification_id) {
            continue;
        }

        let index = match partners
            .iter()
            .position(|p| p.certification_id == header.certification_id)
        {
            Some(i) => i,
            None => {
                partners.push(PartnerListing {
                    certification_id: header.certification_id.clone(),
                    partner_name: header.partner_name.clone(),
                    dispatcher: Vec::new(),
                    router: Vec::new(),
                });
                partners.len() - 1
            }
        };

        lines_of(&mut partners[index]).extend(block.lines().iter().map(|l| l.text().to_string()));
    }
}
