//! Router table lines and the SID reference rows embedded in the same file.
//!
//! Route entries: `{rule} {source_ip} {hostname} {port} # Entry: ...`
//! Reference rows: `# {SID} {hostname} {dispatcher_port}[,] {gateway_port}`

use std::fmt;

use super::{split_comment, AclEntry, AuditTag};
use crate::validation::is_valid_sid_format;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouterEntry {
    pub rule: String,
    pub source_ip: String,
    pub hostname: String,
    pub port: String,
    /// Trailing fields such as a route password.
    pub extra: Vec<String>,
    pub audit: Option<AuditTag>,
}

impl AclEntry for RouterEntry {
    /// `(source_ip, hostname, port)`. The two lines generated for one SID
    /// share address and host, so the port tells them apart.
    type Key = (String, String, String);

    fn parse(line: &str) -> Option<Self> {
        if line.trim_start().starts_with('#') {
            return None;
        }
        let (fields, comment) = split_comment(line);
        let mut fields = fields.split_whitespace();
        let rule = fields.next()?.to_string();
        let source_ip = fields.next()?.to_string();
        let hostname = fields.next()?.to_string();
        let port = fields.next()?.to_string();

        Some(Self {
            rule,
            source_ip,
            hostname,
            port,
            extra: fields.map(str::to_string).collect(),
            audit: comment.and_then(AuditTag::parse_comment),
        })
    }

    fn key(&self) -> (String, String, String) {
        (
            self.source_ip.clone(),
            self.hostname.clone(),
            self.port.clone(),
        )
    }
}

impl fmt::Display for RouterEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.rule, self.source_ip, self.hostname, self.port)?;
        for field in &self.extra {
            write!(f, " {}", field)?;
        }
        if let Some(audit) = &self.audit {
            write!(f, " {}", audit)?;
        }
        Ok(())
    }
}

/// Routing metadata for one SID.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceRecord {
    pub sid: String,
    pub hostname: String,
    pub dispatcher_port: String,
    pub gateway_port: String,
}

impl ReferenceRecord {
    /// Parse a reference row. The dispatcher port may carry a trailing comma.
    pub fn parse(line: &str) -> Option<Self> {
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() < 5 || fields[0] != "#" || !is_valid_sid_format(fields[1]) {
            return None;
        }

        let dispatcher_port = fields[3].strip_suffix(',').unwrap_or(fields[3]);
        let gateway_port = fields[4];
        let is_port = |p: &str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
        if !is_port(dispatcher_port) || !is_port(gateway_port) {
            return None;
        }

        Some(Self {
            sid: fields[1].to_string(),
            hostname: fields[2].to_string(),
            dispatcher_port: dispatcher_port.to_string(),
            gateway_port: gateway_port.to_string(),
        })
    }
}

/// Read-only SID lookup built from the router table's reference rows.
#[derive(Debug, Clone, Default)]
pub struct ReferenceTable {
    records: Vec<ReferenceRecord>,
}

impl ReferenceTable {
    pub fn from_lines<'a>(lines: impl IntoIterator<Item = &'a str>) -> Self {
        Self {
            records: lines.into_iter().filter_map(ReferenceRecord::parse).collect(),
        }
    }

    /// Resolve a SID (case-insensitive). The first matching row wins.
    pub fn resolve(&self, sid: &str) -> Option<&ReferenceRecord> {
        self.records.iter().find(|r| r.sid.eq_ignore_ascii_case(sid))
    }

    pub fn records(&self) -> &[ReferenceRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
