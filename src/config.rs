//! Configuration management for partneracl.

use anyhow::{Context, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::acl::RegionAnchor;

/// Default location of the configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/partneracl/config.yaml";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Dispatcher ACL table (managed region below `marker`)
    pub dispatcher_table: PathBuf,

    /// Router table; also holds the SID reference rows
    pub router_table: PathBuf,

    /// Marker line opening the managed region of the dispatcher table
    pub marker: String,

    /// Session lock marker file
    pub lock_file: PathBuf,

    /// Directory for timestamped backups taken before each write
    pub backup_dir: PathBuf,

    /// Field values used when generating new entries
    pub entry: EntryTemplate,

    /// Audit tag settings
    pub audit: AuditConfig,

    /// Router reload command run after a successful write
    pub reload: ReloadConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dispatcher_table: PathBuf::from("/usr/sap/webdispatcher/acl/partner_acl.txt"),
            router_table: PathBuf::from("/usr/sap/saprouter/saprouttab"),
            marker: "# Script inserted entries".to_string(),
            lock_file: PathBuf::from("/var/run/partneracl.lock"),
            backup_dir: PathBuf::from("/var/backups/partneracl"),
            entry: EntryTemplate::default(),
            audit: AuditConfig::default(),
            reload: ReloadConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path.as_ref()))?;

        config.validate()?;

        Ok(config)
    }

    /// Load the file if it exists, otherwise fall back to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            tracing::debug!(
                "Config file {:?} not found, using defaults",
                path.as_ref()
            );
            Ok(Self::default())
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.dispatcher_table == self.router_table {
            anyhow::bail!(
                "dispatcher_table and router_table must be different files: {:?}",
                self.dispatcher_table
            );
        }

        if !self.marker.trim().starts_with('#') {
            anyhow::bail!("Invalid marker '{}'. It must be a comment line", self.marker);
        }

        self.entry.validate()?;

        if self.audit.date_format.is_empty()
            || StrftimeItems::new(&self.audit.date_format).any(|item| matches!(item, Item::Error))
        {
            anyhow::bail!("Invalid audit.date_format '{}'", self.audit.date_format);
        }

        if self.audit.employee_id_letters.is_empty()
            || !self
                .audit
                .employee_id_letters
                .chars()
                .all(|c| c.is_ascii_alphabetic())
        {
            anyhow::bail!(
                "Invalid audit.employee_id_letters '{}'. Use ASCII letters only",
                self.audit.employee_id_letters
            );
        }

        if self.reload.enabled && self.reload.command.trim().is_empty() {
            anyhow::bail!("reload.command cannot be empty when reload is enabled");
        }

        Ok(())
    }

    /// Save configuration to YAML file atomically
    ///
    /// Uses tempfile + rename pattern to prevent corruption on crash.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        use std::io::Write;
        use tempfile::NamedTempFile;

        let path = path.as_ref();
        let content = serde_yaml::to_string(self).with_context(|| "Failed to serialize config")?;

        let parent_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent_dir)
            .with_context(|| format!("Failed to create config directory {:?}", parent_dir))?;
        let mut temp_file = NamedTempFile::new_in(parent_dir)
            .context("Failed to create temporary file for config")?;

        temp_file.write_all(content.as_bytes())?;
        temp_file.as_file().sync_all()?;

        temp_file
            .persist(path)
            .with_context(|| format!("Failed to persist config file: {:?}", path))?;

        Ok(())
    }

    /// Region anchor of the dispatcher table
    pub fn dispatcher_anchor(&self) -> RegionAnchor {
        RegionAnchor::Marker(self.marker.clone())
    }

    /// Region anchor of the router table
    pub fn router_anchor(&self) -> RegionAnchor {
        RegionAnchor::FirstHeader
    }
}

/// Fixed fields of generated entries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EntryTemplate {
    pub dispatcher_rule: String,
    pub path_glob: String,
    pub user_glob: String,
    pub group_glob: String,
    pub dest_glob: String,
    pub router_rule: String,
}

impl Default for EntryTemplate {
    fn default() -> Self {
        Self {
            dispatcher_rule: "P".to_string(),
            path_glob: "*".to_string(),
            user_glob: "*".to_string(),
            group_glob: "*".to_string(),
            dest_glob: "*".to_string(),
            router_rule: "P".to_string(),
        }
    }
}

impl EntryTemplate {
    fn validate(&self) -> Result<()> {
        let fields = [
            ("entry.dispatcher_rule", &self.dispatcher_rule),
            ("entry.path_glob", &self.path_glob),
            ("entry.user_glob", &self.user_glob),
            ("entry.group_glob", &self.group_glob),
            ("entry.dest_glob", &self.dest_glob),
            ("entry.router_rule", &self.router_rule),
        ];
        for (name, value) in fields {
            if value.is_empty() || value.contains(|c: char| c.is_whitespace() || c == '#') {
                anyhow::bail!(
                    "Invalid {} '{}'. It must be a single token without '#'",
                    name,
                    value
                );
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditConfig {
    /// chrono strftime format for the audit date
    pub date_format: String,
    /// Letters an employee id may start with
    pub employee_id_letters: String,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            date_format: "%Y-%m-%d".to_string(),
            employee_id_letters: "CDI".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    pub enabled: bool,
    pub command: String,
    pub args: Vec<String>,
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            command: "/usr/sap/saprouter/saprouter".to_string(),
            args: vec!["-n".to_string()],
        }
    }
}
