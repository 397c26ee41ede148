//! Error types for partneracl.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AclError {
    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("SID {0} has no record in the reference table")]
    UnresolvedSid(String),

    #[error("Marker line '{marker}' not found in {}", path.display())]
    MissingMarker { marker: String, path: PathBuf },

    #[error(
        "Certification id {certification_id} has a header above the managed region of {}; \
         move that block below the marker before adding entries",
        path.display()
    )]
    HeaderOutsideRegion {
        certification_id: String,
        path: PathBuf,
    },

    #[error("File system error on {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Dispatcher table {} was written but router table {} was not: {source}. \
         The two files are now inconsistent; restore the router table from backup \
         or re-run the session",
        dispatcher.display(),
        router.display()
    )]
    PartialCommit {
        dispatcher: PathBuf,
        router: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Reload command failed: {0}")]
    Reload(String),

    #[error("Session interrupted before the tables were written")]
    Interrupted,

    #[error("Another session is in progress (lock file {})", .0.display())]
    Locked(PathBuf),
}

impl AclError {
    /// Shorthand for input validation failures.
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Persistence {
            path: path.into(),
            source,
        }
    }
}
