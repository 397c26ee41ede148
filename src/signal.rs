//! Signal handling for interrupted sessions.
//!
//! A session owns files that must not outlive it (the lock marker). They
//! are released by `Drop` on every normal path; on SIGINT/SIGTERM the
//! process exits without unwinding, so those paths are also kept in a
//! global cleanup registry that the signal path drains before exiting.
//!
//! Writing the tables is not interruptible: a [`CommitGate`] decides, under
//! one atomic transition, whether the interrupt or the write goes first.
//! An interrupt that arrives during the write waits for it to finish.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Mutex;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tracing::{debug, info, warn};

/// Exit status used when a session is interrupted.
pub const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Paths to remove if the process is interrupted.
#[derive(Debug, Default)]
pub struct CleanupRegistry {
    paths: Mutex<Vec<PathBuf>>,
}

impl CleanupRegistry {
    pub const fn new() -> Self {
        Self {
            paths: Mutex::new(Vec::new()),
        }
    }

    fn paths(&self) -> std::sync::MutexGuard<'_, Vec<PathBuf>> {
        self.paths.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a path to be removed on interrupt.
    pub fn register(&self, path: &Path) {
        self.paths().push(path.to_path_buf());
    }

    /// Forget a path once its owner has released it normally.
    pub fn unregister(&self, path: &Path) {
        self.paths().retain(|p| p != path);
    }

    /// Remove every registered path. Returns how many were removed.
    pub fn run(&self) -> usize {
        let paths: Vec<PathBuf> = self.paths().drain(..).collect();
        let mut removed = 0;
        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => {
                    debug!("Removed {:?}", path);
                    removed += 1;
                }
                Err(e) => warn!("Failed to remove {:?}: {}", path, e),
            }
        }
        removed
    }
}

static GLOBAL_CLEANUP: CleanupRegistry = CleanupRegistry::new();

/// Process-wide registry drained by the interrupt path.
pub fn global_cleanup() -> &'static CleanupRegistry {
    &GLOBAL_CLEANUP
}

const GATE_OPEN: u8 = 0;
const GATE_COMMITTING: u8 = 1;
const GATE_INTERRUPTED: u8 = 2;

/// Serializes "start writing the tables" against "exit on interrupt".
#[derive(Debug, Default)]
pub struct CommitGate {
    state: AtomicU8,
}

/// What the interrupt path should do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterruptAction {
    /// No write is in progress and none can start; exit now.
    ExitNow,
    /// A write is in progress; wait for the session to finish first.
    WaitForCommit,
}

impl CommitGate {
    pub const fn new() -> Self {
        Self {
            state: AtomicU8::new(GATE_OPEN),
        }
    }

    /// Enter the commit section. Returns `None` once an interrupt has
    /// claimed the gate; the caller must then leave the files alone.
    pub fn enter(&self) -> Option<CommitGuard<'_>> {
        self.state
            .compare_exchange(GATE_OPEN, GATE_COMMITTING, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| CommitGuard { gate: self })
    }

    /// Called by the interrupt path.
    pub fn interrupt(&self) -> InterruptAction {
        match self.state.compare_exchange(
            GATE_OPEN,
            GATE_INTERRUPTED,
            Ordering::AcqRel,
            Ordering::Acquire,
        ) {
            Ok(_) | Err(GATE_INTERRUPTED) => InterruptAction::ExitNow,
            Err(_) => InterruptAction::WaitForCommit,
        }
    }

    pub fn is_interrupted(&self) -> bool {
        self.state.load(Ordering::Acquire) == GATE_INTERRUPTED
    }
}

/// Held while the tables are being written; reopens the gate on drop.
#[derive(Debug)]
pub struct CommitGuard<'a> {
    gate: &'a CommitGate,
}

impl Drop for CommitGuard<'_> {
    fn drop(&mut self) {
        let _ = self.gate.state.compare_exchange(
            GATE_COMMITTING,
            GATE_OPEN,
            Ordering::AcqRel,
            Ordering::Acquire,
        );
    }
}

static GLOBAL_COMMIT_GATE: CommitGate = CommitGate::new();

/// Process-wide gate shared by the session and the interrupt path.
pub fn global_commit_gate() -> &'static CommitGate {
    &GLOBAL_COMMIT_GATE
}

/// Which signal ended the wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
    Sigint,
    Sigterm,
}

/// SIGINT and SIGTERM handlers, registered as soon as this is created.
pub struct InterruptListener {
    sigint: Option<Signal>,
    sigterm: Option<Signal>,
}

impl InterruptListener {
    /// Register both handlers. Must be called inside the tokio runtime.
    ///
    /// A handler that cannot be registered (e.g., in restricted
    /// environments) is logged and left to the default disposition.
    pub fn register() -> Self {
        let sigint = match signal(SignalKind::interrupt()) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Failed to register SIGINT handler: {}", e);
                None
            }
        };

        let sigterm = match signal(SignalKind::terminate()) {
            Ok(s) => Some(s),
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}", e);
                None
            }
        };

        Self { sigint, sigterm }
    }

    /// Wait for the next SIGINT or SIGTERM.
    pub async fn recv(&mut self) -> Interrupt {
        let received = match (self.sigint.as_mut(), self.sigterm.as_mut()) {
            (Some(int), Some(term)) => {
                tokio::select! {
                    _ = int.recv() => Interrupt::Sigint,
                    _ = term.recv() => Interrupt::Sigterm,
                }
            }
            (Some(int), None) => {
                int.recv().await;
                Interrupt::Sigint
            }
            (None, Some(term)) => {
                term.recv().await;
                Interrupt::Sigterm
            }
            (None, None) => {
                warn!("No signal handlers registered - interrupt cleanup disabled");
                std::future::pending::<Interrupt>().await
            }
        };

        info!("Received {:?}, releasing session resources...", received);
        received
    }
}
