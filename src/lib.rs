//! # partneracl - Partner whitelist manager for SAP Web Dispatcher and SAProuter
//!
//! Onboards partner source addresses into two hand-maintained text tables:
//! the Web Dispatcher ACL and the SAProuter route table. Every session adds
//! entries under a per-partner header block, tags each line with who asked
//! for it and when, backs both files up, and rewrites them atomically.
//!
//! ## Features
//!
//! - **Partner blocks** - One `##-- id: name --##` header per partner and file, never duplicated
//! - **Duplicate-safe** - Existing addresses and routes are detected and skipped
//! - **SID expansion** - A SID resolves to one route per dispatcher and gateway port
//! - **Audit trail** - Every generated line carries employee, date, requester and contact
//! - **Single session** - A lock marker keeps concurrent operators apart
//! - **Safe writes** - Timestamped backups, then temp-file-and-rename replacement
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       partneracl                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  CLI (clap)                                                 │
//! │    └── Commands: add, list, check, lookup, init, version    │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Session (prompt-driven state machine, SessionLock)         │
//! │    └── collect -> merge -> backup -> persist -> reload      │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Engine                                                     │
//! │    ├── resolve_partner_block / insert_entry                 │
//! │    ├── expand_sid_to_router_entries                         │
//! │    └── finalize_and_persist (dispatcher, then router)       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ACL tables (parse on read, render on write)                │
//! │    ├── DispatcherEntry                                      │
//! │    └── RouterEntry + SID reference rows                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Seams: FileSystem, CommandExecutor (mockall in tests)      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example Usage
//!
//! ```no_run
//! use partneracl::acl::AuditTag;
//! use partneracl::config::Config;
//! use partneracl::engine::{finalize_and_persist, merge, MergeRequest, WorkingCopies};
//! use partneracl::fs_abstraction::RealFileSystem;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = Config::load("/etc/partneracl/config.yaml")?;
//!     let mut copies = WorkingCopies::open(&RealFileSystem, &config)?;
//!
//!     let request = MergeRequest {
//!         certification_id: "12345".to_string(),
//!         partner_name: "Acme".to_string(),
//!         ips: vec!["10.1.1.1".to_string()],
//!         sids: vec!["ABC".to_string()],
//!         audit: AuditTag {
//!             employee_id: "D123456".to_string(),
//!             date: "2026-10-19".to_string(),
//!             requested_by: "Jane Doe".to_string(),
//!             contact_email: "jane@example.com".to_string(),
//!         },
//!         router_only: false,
//!     };
//!     let report = merge(&mut copies, &request, &config.entry)?;
//!
//!     if !report.is_empty() {
//!         finalize_and_persist(&RealFileSystem, &copies, None)?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`acl`] - Table model: partner headers, entries, audit tags, SID reference rows
//! - [`backup`] - Timestamped backups before each write
//! - [`cli`] - Command-line interface definitions
//! - [`cmd_abstraction`] - Command execution seam (router reload)
//! - [`commands`] - CLI command implementations
//! - [`config`] - Configuration parsing and validation
//! - [`consistency`] - Cross-file consistency report
//! - [`engine`] - Merge engine and persistence
//! - [`error`] - Domain error taxonomy
//! - [`fs_abstraction`] - Filesystem seam
//! - [`lock`] - Session lock marker
//! - [`prompt`] - Operator prompts
//! - [`session`] - Interactive session state machine
//! - [`signal`] - Interrupt handling and cleanup registry
//! - [`validation`] - Input validation

pub mod acl;
pub mod backup;
pub mod cli;
pub mod cmd_abstraction;
pub mod commands;
pub mod config;
pub mod consistency;
pub mod engine;
pub mod error;
pub mod fs_abstraction;
pub mod lock;
pub mod prompt;
pub mod session;
pub mod signal;
pub mod validation;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use error::AclError;
