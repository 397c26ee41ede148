//! ACL merge engine.
//!
//! Takes validated whitelist requests for one partner and applies them to
//! in-memory working copies of the dispatcher and router tables:
//!
//! ```text
//!   WorkingCopies::open ──► resolve_partner_block ──► merge ──► finalize_and_persist
//!        (parse)              (header lookup)        (insert_entry,     (dispatcher, then
//!                                                     SID expansion)     router, then reload)
//! ```
//!
//! Headers are never duplicated; entries are deduplicated by key before
//! insertion. Nothing touches disk until [`finalize_and_persist`].

use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

use crate::acl::{
    AclEntry, AclTable, AuditTag, DispatcherEntry, InsertOutcome, ReferenceTable, RouterEntry,
};
use crate::cmd_abstraction::CommandExecutor;
use crate::config::{Config, EntryTemplate, ReloadConfig};
use crate::error::AclError;
use crate::fs_abstraction::FileSystem;
use crate::validation::validate_partner_name;

/// Parsed working copies of both managed tables.
#[derive(Debug, Clone)]
pub struct WorkingCopies {
    pub dispatcher: AclTable<DispatcherEntry>,
    pub router: AclTable<RouterEntry>,
}

impl WorkingCopies {
    /// Read and parse both tables.
    pub fn open(fs: &dyn FileSystem, config: &Config) -> Result<Self, AclError> {
        let dispatcher_text = fs
            .read_to_string(&config.dispatcher_table)
            .map_err(|e| AclError::persistence(&config.dispatcher_table, e))?;
        let router_text = fs
            .read_to_string(&config.router_table)
            .map_err(|e| AclError::persistence(&config.router_table, e))?;

        Ok(Self {
            dispatcher: AclTable::parse(
                &config.dispatcher_table,
                &dispatcher_text,
                &config.dispatcher_anchor(),
            )?,
            router: AclTable::parse(&config.router_table, &router_text, &config.router_anchor())?,
        })
    }

    /// SID reference rows of the router table.
    pub fn reference(&self) -> ReferenceTable {
        ReferenceTable::from_lines(self.router.lines())
    }

    /// Both tables, dispatcher first, for partner lookups.
    pub fn partner_indexes(&self) -> [&dyn PartnerIndex; 2] {
        [&self.dispatcher, &self.router]
    }
}

/// Anything that can answer "which partner owns this certification id".
pub trait PartnerIndex {
    fn source(&self) -> &Path;
    fn partner_name(&self, certification_id: &str) -> Option<&str>;
}

impl<E> PartnerIndex for AclTable<E> {
    fn source(&self) -> &Path {
        self.path()
    }

    fn partner_name(&self, certification_id: &str) -> Option<&str> {
        AclTable::partner_name(self, certification_id)
    }
}

/// Find the partner name recorded for `certification_id`.
///
/// The first file containing a header wins. If files disagree the
/// mismatch is logged and left as is. When no file has a header,
/// `fallback_name` is asked for a name, which must be non-empty and free
/// of header delimiters.
pub fn resolve_partner_block<F>(
    certification_id: &str,
    files: &[&dyn PartnerIndex],
    fallback_name: F,
) -> Result<String, AclError>
where
    F: FnOnce() -> Result<String, AclError>,
{
    let found: Vec<(&Path, &str)> = files
        .iter()
        .filter_map(|f| {
            f.partner_name(certification_id)
                .map(|name| (f.source(), name))
        })
        .collect();

    let Some(&(_, first_name)) = found.first() else {
        info!(
            "Certification id {} not found, a new partner block will be created",
            certification_id
        );
        return validate_partner_name(&fallback_name()?);
    };

    for (path, name) in &found {
        info!(
            "Certification id {} found in {:?} as '{}'",
            certification_id, path, name
        );
    }
    if found.iter().any(|(_, name)| *name != first_name) {
        warn!(
            "Certification id {} has different partner names across files; using '{}'",
            certification_id, first_name
        );
    }

    Ok(first_name.to_string())
}

/// Insert `entry` under the block for `certification_id`, creating the
/// block at the end of the managed region if needed.
pub fn insert_entry<E: AclEntry>(
    table: &mut AclTable<E>,
    certification_id: &str,
    partner_name: &str,
    entry: E,
) -> Result<InsertOutcome, AclError> {
    let line = entry.to_string();
    let outcome = table.insert_entry(certification_id, partner_name, entry)?;
    match outcome {
        InsertOutcome::CreatedHeader => info!(
            "Created partner block {}: {} in {:?}",
            certification_id,
            partner_name,
            table.path()
        ),
        InsertOutcome::ExtendedBlock => debug!(
            "Extended partner block {} in {:?}",
            certification_id,
            table.path()
        ),
    }
    debug!("Inserted: {}", line);
    Ok(outcome)
}

/// Build the dispatcher line for one source address.
pub fn dispatcher_entry(template: &EntryTemplate, source_ip: &str, audit: &AuditTag) -> DispatcherEntry {
    DispatcherEntry {
        rule: template.dispatcher_rule.clone(),
        path_glob: template.path_glob.clone(),
        user_glob: template.user_glob.clone(),
        group_glob: template.group_glob.clone(),
        source_ip: source_ip.to_string(),
        dest_glob: template.dest_glob.clone(),
        audit: Some(audit.clone()),
    }
}

/// Expand one `(source_ip, sid)` request into its two router lines: one on
/// the dispatcher port, one on the gateway port.
pub fn expand_sid_to_router_entries(
    reference: &ReferenceTable,
    template: &EntryTemplate,
    source_ip: &str,
    sid: &str,
    audit: &AuditTag,
) -> Result<[RouterEntry; 2], AclError> {
    let record = reference
        .resolve(sid)
        .ok_or_else(|| AclError::UnresolvedSid(sid.to_string()))?;

    let entry_on = |port: &str| RouterEntry {
        rule: template.router_rule.clone(),
        source_ip: source_ip.to_string(),
        hostname: record.hostname.clone(),
        port: port.to_string(),
        extra: Vec::new(),
        audit: Some(audit.clone()),
    };

    Ok([
        entry_on(&record.dispatcher_port),
        entry_on(&record.gateway_port),
    ])
}

/// Everything one session asks the engine to add.
#[derive(Debug, Clone)]
pub struct MergeRequest {
    pub certification_id: String,
    pub partner_name: String,
    pub ips: Vec<String>,
    pub sids: Vec<String>,
    pub audit: AuditTag,
    /// Skip dispatcher entries and only add router lines.
    pub router_only: bool,
}

/// What a merge did.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    pub dispatcher_added: Vec<String>,
    pub router_added: Vec<String>,
    /// Duplicate warnings, one per skipped line
    pub skipped: Vec<String>,
    /// `(ip, sid)` pairs where only one of the two router lines was new
    pub partial_pairs: Vec<(String, String)>,
    pub headers_created: Vec<PathBuf>,
}

impl MergeReport {
    pub fn inserted(&self) -> usize {
        self.dispatcher_added.len() + self.router_added.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inserted() == 0
    }

    fn skip(&mut self, err: AclError) {
        warn!("{}", err);
        self.skipped.push(err.to_string());
    }
}

/// Apply a request to the working copies.
///
/// Duplicates are skipped and reported. An unresolvable SID or a partner
/// header above the managed region aborts the whole merge; the caller must
/// then discard the working copies.
pub fn merge(
    copies: &mut WorkingCopies,
    request: &MergeRequest,
    template: &EntryTemplate,
) -> Result<MergeReport, AclError> {
    let reference = copies.reference();
    let cert_id = request.certification_id.as_str();
    let partner = request.partner_name.as_str();
    let mut report = MergeReport::default();

    if !request.router_only {
        for ip in &request.ips {
            let entry = dispatcher_entry(template, ip, &request.audit);
            if copies.dispatcher.contains_key(&entry.key()) {
                report.skip(AclError::Duplicate(format!(
                    "{} is already whitelisted in {:?}",
                    ip,
                    copies.dispatcher.path()
                )));
                continue;
            }
            let line = entry.to_string();
            if insert_entry(&mut copies.dispatcher, cert_id, partner, entry)?
                == InsertOutcome::CreatedHeader
            {
                report.headers_created.push(copies.dispatcher.path().to_path_buf());
            }
            report.dispatcher_added.push(line);
        }
    }

    for ip in &request.ips {
        for sid in &request.sids {
            let pair = expand_sid_to_router_entries(&reference, template, ip, sid, &request.audit)?;
            let mut added = 0;
            for entry in pair {
                if copies.router.contains_key(&entry.key()) {
                    report.skip(AclError::Duplicate(format!(
                        "{} -> {}:{} is already routed in {:?}",
                        ip,
                        entry.hostname,
                        entry.port,
                        copies.router.path()
                    )));
                    continue;
                }
                let line = entry.to_string();
                if insert_entry(&mut copies.router, cert_id, partner, entry)?
                    == InsertOutcome::CreatedHeader
                {
                    report.headers_created.push(copies.router.path().to_path_buf());
                }
                report.router_added.push(line);
                added += 1;
            }
            if added == 1 {
                warn!(
                    "Only one of the two router entries for {} / {} was new",
                    ip, sid
                );
                report.partial_pairs.push((ip.clone(), sid.clone()));
            }
        }
    }

    Ok(report)
}

/// Runs the router reload command through an injected executor.
pub struct Reloader<'a> {
    executor: &'a dyn CommandExecutor,
    command: String,
    args: Vec<String>,
}

impl<'a> Reloader<'a> {
    pub fn new(executor: &'a dyn CommandExecutor, command: &str, args: &[String]) -> Self {
        Self {
            executor,
            command: command.to_string(),
            args: args.to_vec(),
        }
    }

    /// `None` when reload is disabled in the configuration.
    pub fn from_config(executor: &'a dyn CommandExecutor, config: &ReloadConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(executor, &config.command, &config.args))
    }

    /// Run the command and wait. Only the exit status is looked at.
    pub fn reload(&self) -> Result<(), AclError> {
        info!("Reloading router: {} {}", self.command, self.args.join(" "));
        let output = self
            .executor
            .execute(&self.command, &self.args)
            .map_err(|e| AclError::Reload(format!("{:#}", e)))?;

        if output.success {
            return Ok(());
        }

        let status = output
            .code
            .map(|c| c.to_string())
            .unwrap_or_else(|| "killed by signal".to_string());
        Err(AclError::Reload(format!(
            "{} exited with status {}: {}",
            self.command,
            status,
            output.stderr.trim()
        )))
    }
}

/// Outcome of the reload step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadStatus {
    Skipped,
    Succeeded,
    Failed(String),
}

/// What [`finalize_and_persist`] wrote.
#[derive(Debug, Clone)]
pub struct CommitResult {
    pub written: Vec<PathBuf>,
    pub reload: ReloadStatus,
}

/// Write modified working copies back, dispatcher table first, then run
/// the reload command.
///
/// Each table's managed region is rendered without blank lines and
/// replaces the target atomically. Untouched tables are not rewritten.
/// A router write failure after a successful dispatcher write is
/// reported as [`AclError::PartialCommit`]; nothing is rolled back.
/// Reload failures are recorded in the result, never returned as errors.
pub fn finalize_and_persist(
    fs: &dyn FileSystem,
    copies: &WorkingCopies,
    reloader: Option<&Reloader<'_>>,
) -> Result<CommitResult, AclError> {
    let mut written = Vec::new();

    if copies.dispatcher.is_dirty() {
        let path = copies.dispatcher.path();
        fs.write_atomic(path, copies.dispatcher.render().as_bytes())
            .map_err(|e| AclError::persistence(path, e))?;
        info!("Wrote {:?}", path);
        written.push(path.to_path_buf());
    }

    if copies.router.is_dirty() {
        let path = copies.router.path();
        if let Err(e) = fs.write_atomic(path, copies.router.render().as_bytes()) {
            let err = if written.is_empty() {
                AclError::persistence(path, e)
            } else {
                AclError::PartialCommit {
                    dispatcher: copies.dispatcher.path().to_path_buf(),
                    router: path.to_path_buf(),
                    source: e,
                }
            };
            error!("{}", err);
            return Err(err);
        }
        info!("Wrote {:?}", path);
        written.push(path.to_path_buf());
    }

    let reload = match reloader {
        None => ReloadStatus::Skipped,
        Some(_) if written.is_empty() => ReloadStatus::Skipped,
        Some(reloader) => match reloader.reload() {
            Ok(()) => ReloadStatus::Succeeded,
            Err(e) => {
                warn!("{}", e);
                ReloadStatus::Failed(e.to_string())
            }
        },
    };

    Ok(CommitResult { written, reload })
}
