//! Cross-file consistency checks for the two managed tables.
//!
//! The merge engine keeps the tables consistent for the entries it writes,
//! but both files are also edited by hand. These checks report what a
//! later session would trip over.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::acl::{AclEntry, AclTable};
use crate::engine::WorkingCopies;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Makes the exit status non-zero
    Problem,
    /// Informational only
    Notice,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    ConflictingPartnerName,
    DuplicateHeader,
    DuplicateEntry,
    RouterWithoutDispatcher,
}

impl fmt::Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::ConflictingPartnerName => "conflicting partner name",
            Self::DuplicateHeader => "duplicate header",
            Self::DuplicateEntry => "duplicate entry",
            Self::RouterWithoutDispatcher => "router entry without dispatcher entry",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Finding {
    pub severity: Severity,
    pub kind: FindingKind,
    pub file: PathBuf,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ConsistencyReport {
    pub findings: Vec<Finding>,
}

impl ConsistencyReport {
    pub fn has_problems(&self) -> bool {
        self.findings
            .iter()
            .any(|f| f.severity == Severity::Problem)
    }

    pub fn problems(&self) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == Severity::Problem)
            .count()
    }

    fn push(&mut self, severity: Severity, kind: FindingKind, file: &Path, message: String) {
        self.findings.push(Finding {
            severity,
            kind,
            file: file.to_path_buf(),
            message,
        });
    }
}

/// Run every check over both tables.
pub fn check(copies: &WorkingCopies) -> ConsistencyReport {
    let mut report = ConsistencyReport::default();

    duplicate_headers(&copies.dispatcher, &mut report);
    duplicate_headers(&copies.router, &mut report);
    duplicate_entries(&copies.dispatcher, &mut report);
    duplicate_entries(&copies.router, &mut report);
    conflicting_names(copies, &mut report);
    router_without_dispatcher(copies, &mut report);

    report
}

fn duplicate_headers<E>(table: &AclTable<E>, report: &mut ConsistencyReport) {
    let headers = table
        .outside_headers()
        .iter()
        .chain(table.blocks().iter().map(|b| b.header()));
    let mut seen: Vec<&str> = Vec::new();
    for header in headers {
        let id = header.certification_id.as_str();
        if seen.contains(&id) {
            continue;
        }
        seen.push(id);
        let count = table.header_count(id);
        if count > 1 {
            report.push(
                Severity::Problem,
                FindingKind::DuplicateHeader,
                table.path(),
                format!("certification id {} has {} headers", id, count),
            );
        }
    }
}

fn duplicate_entries<E: AclEntry>(table: &AclTable<E>, report: &mut ConsistencyReport) {
    let keys = table.keys();
    let mut reported: Vec<&E::Key> = Vec::new();
    for (i, key) in keys.iter().enumerate() {
        if reported.contains(&key) {
            continue;
        }
        let count = keys[i..].iter().filter(|k| *k == key).count();
        if count > 1 {
            reported.push(key);
            report.push(
                Severity::Problem,
                FindingKind::DuplicateEntry,
                table.path(),
                format!("{:?} appears {} times", key, count),
            );
        }
    }
}

fn conflicting_names(copies: &WorkingCopies, report: &mut ConsistencyReport) {
    let mut names: HashMap<&str, &str> = HashMap::new();
    for block in copies.dispatcher.blocks() {
        let header = block.header();
        names
            .entry(header.certification_id.as_str())
            .or_insert(header.partner_name.as_str());
    }

    for block in copies.router.blocks() {
        let header = block.header();
        if let Some(&name) = names.get(header.certification_id.as_str()) {
            if name != header.partner_name {
                report.push(
                    Severity::Problem,
                    FindingKind::ConflictingPartnerName,
                    copies.router.path(),
                    format!(
                        "certification id {} is '{}' here but '{}' in {}",
                        header.certification_id,
                        header.partner_name,
                        name,
                        copies.dispatcher.path().display()
                    ),
                );
            }
        }
    }
}

/// Router-only sessions create these legitimately, so they are notices.
fn router_without_dispatcher(copies: &WorkingCopies, report: &mut ConsistencyReport) {
    for block in copies.router.blocks() {
        let id = &block.header().certification_id;
        let dispatcher_ips: Vec<&str> = copies
            .dispatcher
            .blocks()
            .iter()
            .filter(|b| &b.header().certification_id == id)
            .flat_map(|b| b.entries())
            .map(|e| e.source_ip.as_str())
            .collect();

        let mut reported: Vec<&str> = Vec::new();
        for entry in block.entries() {
            let ip = entry.source_ip.as_str();
            if dispatcher_ips.contains(&ip) || reported.contains(&ip) {
                continue;
            }
            reported.push(ip);
            report.push(
                Severity::Notice,
                FindingKind::RouterWithoutDispatcher,
                copies.router.path(),
                format!(
                    "{} is routed for certification id {} but has no dispatcher entry in that block",
                    ip, id
                ),
            );
        }
    }
}
