//! Structured view of the two managed ACL tables.
//!
//! Both tables are plain text. They are parsed into records on read
//! ([`AclTable`]) and rendered back to text on write, so the merge logic
//! never edits raw lines.

mod dispatcher;
mod router;
mod table;

pub use dispatcher::DispatcherEntry;
pub use router::{ReferenceRecord, ReferenceTable, RouterEntry};
pub use table::{AclTable, InsertOutcome, PartnerBlock, PartnerHeader, Record, RegionAnchor, RegionLine};

use std::fmt;

/// Prefix of the audit comment appended to every generated entry.
pub const AUDIT_PREFIX: &str = "Entry:";

/// A line that can live inside a partner block.
pub trait AclEntry: fmt::Display + Sized {
    /// Uniqueness key within one file.
    type Key: PartialEq + fmt::Debug;

    /// Parse a raw table line. Comments, blank lines and headers yield `None`.
    fn parse(line: &str) -> Option<Self>;

    fn key(&self) -> Self::Key;
}

/// Who requested an entry and when: `{employee} | {date} | {requester} | {email}`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditTag {
    pub employee_id: String,
    pub date: String,
    pub requested_by: String,
    pub contact_email: String,
}

impl AuditTag {
    /// Parse the text following `#` on an entry line.
    pub fn parse_comment(comment: &str) -> Option<Self> {
        let body = comment.trim().strip_prefix(AUDIT_PREFIX)?;
        let parts: Vec<&str> = body.split('|').map(str::trim).collect();
        match parts.as_slice() {
            [employee_id, date, requested_by, contact_email] => Some(Self {
                employee_id: employee_id.to_string(),
                date: date.to_string(),
                requested_by: requested_by.to_string(),
                contact_email: contact_email.to_string(),
            }),
            _ => None,
        }
    }
}

impl fmt::Display for AuditTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "# {} {} | {} | {} | {}",
            AUDIT_PREFIX, self.employee_id, self.date, self.requested_by, self.contact_email
        )
    }
}

/// Split an entry line into its field part and the optional `#` comment.
pub(crate) fn split_comment(line: &str) -> (&str, Option<&str>) {
    match line.split_once('#') {
        Some((fields, comment)) => (fields, Some(comment)),
        None => (line, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tag() -> AuditTag {
        AuditTag {
            employee_id: "D123456".to_string(),
            date: "2026-10-19".to_string(),
            requested_by: "Jane Doe".to_string(),
            contact_email: "jane@example.com".to_string(),
        }
    }

    #[test]
    fn test_audit_tag_display() {
        assert_eq!(
            sample_tag().to_string(),
            "# Entry: D123456 | 2026-10-19 | Jane Doe | jane@example.com"
        );
    }

    #[test]
    fn test_audit_tag_parse_comment() {
        let parsed =
            AuditTag::parse_comment(" Entry: D123456 | 2026-10-19 | Jane Doe | jane@example.com");
        assert_eq!(parsed, Some(sample_tag()));
    }

    #[test]
    fn test_audit_tag_parse_rejects_other_comments() {
        assert!(AuditTag::parse_comment(" added by hand").is_none());
        assert!(AuditTag::parse_comment(" Entry: D123456 | 2026-10-19").is_none());
    }

    #[test]
    fn test_split_comment() {
        assert_eq!(split_comment("P a b # c"), ("P a b ", Some(" c")));
        assert_eq!(split_comment("P a b"), ("P a b", None));
    }
}
