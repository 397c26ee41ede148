//! Interactive whitelist session.
//!
//! One session collects a partner, source addresses, optional SIDs and the
//! audit metadata, merges them into the working copies, backs up and
//! persists the tables, then reloads the router:
//!
//! ```text
//! Idle -> WorkingCopiesOpen -> CollectingIps -> CollectingSids -> CollectingMetadata
//!      -> Merging -> BackupsTaken -> Persisting -> [Reloading] -> CleaningUp -> Idle
//! ```
//!
//! Invalid answers are re-prompted without leaving the current state.
//! Values given on the command line are validated the same way; a bad one
//! is reported and then asked for interactively.

use anyhow::Result;
use chrono::Local;
use std::io;
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::acl::{AuditTag, ReferenceTable};
use crate::backup::take_backups;
use crate::cmd_abstraction::CommandExecutor;
use crate::config::Config;
use crate::engine::{
    finalize_and_persist, merge, resolve_partner_block, CommitResult, MergeReport, MergeRequest,
    ReloadStatus, Reloader, WorkingCopies,
};
use crate::error::AclError;
use crate::fs_abstraction::FileSystem;
use crate::prompt::Prompt;
use crate::signal::CommitGate;
use crate::validation::{
    validate_certification_id, validate_email, validate_employee_id, validate_ipv4,
    validate_partner_name, validate_requested_by, validate_sid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    WorkingCopiesOpen,
    CollectingIps,
    CollectingSids,
    CollectingMetadata,
    Merging,
    BackupsTaken,
    Persisting,
    Reloading,
    CleaningUp,
}

/// Values supplied up front, typically from command-line flags.
/// Anything missing is prompted for.
#[derive(Debug, Clone, Default)]
pub struct SessionInput {
    pub certification_id: Option<String>,
    pub partner_name: Option<String>,
    pub ips: Vec<String>,
    pub sids: Vec<String>,
    pub employee_id: Option<String>,
    pub requested_by: Option<String>,
    pub email: Option<String>,
    pub router_only: bool,
    pub no_reload: bool,
}

/// Result of a committed session.
#[derive(Debug, Clone)]
pub struct CommitSummary {
    pub certification_id: String,
    pub partner_name: String,
    pub report: MergeReport,
    pub backups: Vec<PathBuf>,
    pub commit: CommitResult,
}

#[derive(Debug, Clone)]
pub enum SessionOutcome {
    Committed(CommitSummary),
    /// Nothing was written; the string says why.
    NothingToDo(String),
}

pub struct Session<'a> {
    config: &'a Config,
    fs: &'a dyn FileSystem,
    executor: &'a dyn CommandExecutor,
    state: SessionState,
    date: Option<String>,
    gate: Option<&'a CommitGate>,
}

impl<'a> Session<'a> {
    pub fn new(
        config: &'a Config,
        fs: &'a dyn FileSystem,
        executor: &'a dyn CommandExecutor,
    ) -> Self {
        Self {
            config,
            fs,
            executor,
            state: SessionState::Idle,
            date: None,
            gate: None,
        }
    }

    /// Take backups and write the tables only while holding `gate`, so an
    /// interrupt either stops the session before any write or waits for it.
    pub fn with_commit_gate(mut self, gate: &'a CommitGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Use a fixed audit date instead of today's.
    pub fn with_date(mut self, date: impl Into<String>) -> Self {
        self.date = Some(date.into());
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn enter(&mut self, next: SessionState) {
        debug!("Session state: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run one session to completion. The working copies are dropped on
    /// every path, so an aborted session leaves the tables untouched.
    pub fn run(&mut self, prompt: &mut dyn Prompt, input: SessionInput) -> Result<SessionOutcome> {
        let result = self.run_states(prompt, input);
        self.enter(SessionState::CleaningUp);
        if let Ok(SessionOutcome::NothingToDo(reason)) = &result {
            info!("Nothing to do: {}", reason);
        }
        self.enter(SessionState::Idle);
        result
    }

    fn run_states(&mut self, prompt: &mut dyn Prompt, input: SessionInput) -> Result<SessionOutcome> {
        let config = self.config;
        let mut copies = WorkingCopies::open(self.fs, config)?;
        self.enter(SessionState::WorkingCopiesOpen);

        let Some(certification_id) = ask(
            prompt,
            "Partner certification id: ",
            input.certification_id.as_deref(),
            validate_certification_id,
        )?
        else {
            return Ok(nothing("no certification id entered"));
        };

        let mut ended = false;
        let mut prompt_error = None;
        let resolved = resolve_partner_block(&certification_id, &copies.partner_indexes(), || {
            match ask(
                &mut *prompt,
                "Partner name: ",
                input.partner_name.as_deref(),
                validate_partner_name,
            ) {
                Ok(Some(name)) => Ok(name),
                Ok(None) => {
                    ended = true;
                    Err(AclError::invalid("partner name", "no partner name entered"))
                }
                Err(e) => {
                    let err = AclError::invalid("partner name", e.to_string());
                    prompt_error = Some(e);
                    Err(err)
                }
            }
        });
        if let Some(e) = prompt_error {
            return Err(e.into());
        }
        if ended {
            return Ok(nothing("no partner name entered"));
        }
        let partner_name = resolved?;
        if let Some(given) = input.partner_name.as_deref() {
            if given.trim() != partner_name {
                warn!(
                    "Certification id {} is recorded as '{}', ignoring '{}'",
                    certification_id,
                    partner_name,
                    given.trim()
                );
            }
        }

        self.enter(SessionState::CollectingIps);
        let ips = collect_list(
            prompt,
            "Source IP (empty line to finish): ",
            &input.ips,
            validate_ipv4,
        )?;
        if ips.is_empty() {
            return Ok(nothing("no IP address entered"));
        }

        self.enter(SessionState::CollectingSids);
        let reference = copies.reference();
        let sids = collect_list(
            prompt,
            "SID (empty line to finish): ",
            &input.sids,
            |raw| known_sid(&reference, raw),
        )?;
        if input.router_only && sids.is_empty() {
            return Ok(nothing("router-only session without any SID"));
        }

        self.enter(SessionState::CollectingMetadata);
        let letters = config.audit.employee_id_letters.as_str();
        let Some(employee_id) = ask(
            prompt,
            "Employee id: ",
            input.employee_id.as_deref(),
            |raw| validate_employee_id(raw, letters),
        )?
        else {
            return Ok(nothing("no employee id entered"));
        };
        let Some(requested_by) = ask(
            prompt,
            "Requested by: ",
            input.requested_by.as_deref(),
            validate_requested_by,
        )?
        else {
            return Ok(nothing("no requester entered"));
        };
        let Some(contact_email) = ask(
            prompt,
            "Contact email: ",
            input.email.as_deref(),
            validate_email,
        )?
        else {
            return Ok(nothing("no contact email entered"));
        };

        let date = self.date.clone().unwrap_or_else(|| {
            Local::now()
                .format(&config.audit.date_format)
                .to_string()
        });

        self.enter(SessionState::Merging);
        let request = MergeRequest {
            certification_id: certification_id.clone(),
            partner_name: partner_name.clone(),
            ips,
            sids,
            audit: AuditTag {
                employee_id,
                date,
                requested_by,
                contact_email,
            },
            router_only: input.router_only,
        };
        let report = merge(&mut copies, &request, &config.entry)?;
        if report.is_empty() {
            return Ok(nothing("every requested entry already exists"));
        }

        let _commit = match self.gate {
            Some(gate) => Some(gate.enter().ok_or(AclError::Interrupted)?),
            None => None,
        };

        // Both files are snapshotted even if only one of them changes.
        let targets = [copies.dispatcher.path(), copies.router.path()];
        let backups = take_backups(self.fs, &config.backup_dir, &targets, Local::now())?;
        self.enter(SessionState::BackupsTaken);

        self.enter(SessionState::Persisting);
        let reloader = if input.no_reload {
            None
        } else {
            Reloader::from_config(self.executor, &config.reload)
        };
        let commit = finalize_and_persist(self.fs, &copies, reloader.as_ref())?;
        if commit.reload != ReloadStatus::Skipped {
            self.enter(SessionState::Reloading);
        }

        Ok(SessionOutcome::Committed(CommitSummary {
            certification_id,
            partner_name,
            report,
            backups,
            commit,
        }))
    }
}

fn nothing(reason: &str) -> SessionOutcome {
    SessionOutcome::NothingToDo(reason.to_string())
}

/// A SID must be well-formed and present in the reference table.
fn known_sid(reference: &ReferenceTable, raw: &str) -> Result<String, AclError> {
    let sid = validate_sid(raw)?.to_ascii_uppercase();
    if reference.resolve(&sid).is_none() {
        return Err(AclError::UnresolvedSid(sid));
    }
    Ok(sid)
}

/// Ask for one required value. A preset is tried first; if it does not
/// validate, the operator is asked. `None` means input ended.
fn ask<F>(
    prompt: &mut dyn Prompt,
    label: &str,
    preset: Option<&str>,
    validate: F,
) -> io::Result<Option<String>>
where
    F: Fn(&str) -> Result<String, AclError>,
{
    if let Some(raw) = preset {
        match validate(raw) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => warn!("{}", e),
        }
    }

    while let Some(raw) = prompt.line(label)? {
        match validate(&raw) {
            Ok(value) => return Ok(Some(value)),
            Err(e) => prompt.say(&format!("[WARN] {}", e))?,
        }
    }
    Ok(None)
}

/// Collect a list of values. Presets are used when at least one of them
/// is valid; otherwise values are read one per line until an empty line
/// or end of input. Invalid and repeated values are reported and skipped.
fn collect_list<F>(
    prompt: &mut dyn Prompt,
    label: &str,
    presets: &[String],
    validate: F,
) -> io::Result<Vec<String>>
where
    F: Fn(&str) -> Result<String, AclError>,
{
    let mut items = Vec::new();

    for raw in presets {
        if let Err(e) = accept(&mut items, &validate, raw) {
            warn!("{}", e);
        }
    }
    if !items.is_empty() {
        return Ok(items);
    }

    while let Some(raw) = prompt.line(label)? {
        if raw.trim().is_empty() {
            break;
        }
        if let Err(e) = accept(&mut items, &validate, &raw) {
            prompt.say(&format!("[WARN] {}", e))?;
        }
    }
    Ok(items)
}

fn accept<F>(items: &mut Vec<String>, validate: &F, raw: &str) -> Result<(), AclError>
where
    F: Fn(&str) -> Result<String, AclError>,
{
    let value = validate(raw)?;
    if items.contains(&value) {
        return Err(AclError::Duplicate(format!("{} was already entered", value)));
    }
    items.push(value);
    Ok(())
}
