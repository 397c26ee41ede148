//! Session lock preventing concurrent edits of the ACL tables.
//!
//! The lock is a marker file: its presence means a session is in progress.
//! The file is created exclusively and additionally held with an flock-style
//! advisory lock. It is removed when the guard is dropped, and registered
//! with the interrupt cleanup so SIGINT/SIGTERM release it too.

use fs2::FileExt;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::AclError;
use crate::signal::global_cleanup;

/// A guard that holds the session lock marker.
/// The marker is removed when the guard is dropped.
#[derive(Debug)]
pub struct SessionLock {
    path: PathBuf,
    _file: File,
}

impl SessionLock {
    /// Attempt to acquire the session lock.
    /// Returns `AclError::Locked` if another session already holds it.
    ///
    /// `create_new` makes creation and the existence check a single step.
    pub fn acquire(path: &Path) -> Result<Self, AclError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| AclError::persistence(parent, e))?;
            }
        }

        let mut file = match OpenOptions::new().write(true).create_new(true).open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                return Err(AclError::Locked(path.to_path_buf()));
            }
            Err(e) => return Err(AclError::persistence(path, e)),
        };

        // From here on the marker is ours: make sure it goes away on failure.
        let guard_path = path.to_path_buf();
        global_cleanup().register(&guard_path);

        if file.try_lock_exclusive().is_err() {
            global_cleanup().unregister(&guard_path);
            let _ = fs::remove_file(&guard_path);
            return Err(AclError::Locked(guard_path));
        }

        if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
            warn!("Failed to set lock file permissions on {:?}: {}", path, e);
        }
        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            warn!("Failed to write pid to lock file {:?}: {}", path, e);
        }

        debug!("Acquired session lock {:?}", path);
        Ok(Self {
            path: guard_path,
            _file: file,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for SessionLock {
    fn drop(&mut self) {
        global_cleanup().unregister(&self.path);
        match fs::remove_file(&self.path) {
            Ok(()) => debug!("Released session lock {:?}", self.path),
            Err(e) => warn!("Failed to remove lock file {:?}: {}", self.path, e),
        }
    }
}
