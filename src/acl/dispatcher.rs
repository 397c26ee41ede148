//! Dispatcher ACL table lines.
//!
//! `{rule} {path} {user} {group} {source_ip} {dest} # Entry: ...`

use std::fmt;

use super::{split_comment, AclEntry, AuditTag};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherEntry {
    pub rule: String,
    pub path_glob: String,
    pub user_glob: String,
    pub group_glob: String,
    pub source_ip: String,
    pub dest_glob: String,
    pub audit: Option<AuditTag>,
}

impl AclEntry for DispatcherEntry {
    type Key = String;

    fn parse(line: &str) -> Option<Self> {
        if line.trim_start().starts_with('#') {
            return None;
        }
        let (fields, comment) = split_comment(line);
        let fields: Vec<&str> = fields.split_whitespace().collect();
        let [rule, path_glob, user_glob, group_glob, source_ip, dest_glob] = fields.as_slice()
        else {
            return None;
        };

        Some(Self {
            rule: rule.to_string(),
            path_glob: path_glob.to_string(),
            user_glob: user_glob.to_string(),
            group_glob: group_glob.to_string(),
            source_ip: source_ip.to_string(),
            dest_glob: dest_glob.to_string(),
            audit: comment.and_then(AuditTag::parse_comment),
        })
    }

    fn key(&self) -> String {
        self.source_ip.clone()
    }
}

impl fmt::Display for DispatcherEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.rule, self.path_glob, self.user_glob, self.group_glob, self.source_ip, self.dest_glob
        )?;
        if let Some(audit) = &self.audit {
            write!(f, " {}", audit)?;
        }
        Ok(())
    }
}
