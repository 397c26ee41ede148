//! Timestamped backups of the managed tables.
//!
//! Backups are written once per session, right before the first target is
//! replaced. They are never read back by the tool.

use chrono::{DateTime, Local};
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::AclError;
use crate::fs_abstraction::FileSystem;

const TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";

/// `{backup_dir}/{file_name}.{timestamp}.bak`
pub fn backup_path(backup_dir: &Path, target: &Path, timestamp: &DateTime<Local>) -> PathBuf {
    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table".to_string());
    backup_dir.join(format!(
        "{}.{}.bak",
        file_name,
        timestamp.format(TIMESTAMP_FORMAT)
    ))
}

/// Copy each target into `backup_dir`. Fails before anything is modified
/// if any copy fails.
pub fn take_backups(
    fs: &dyn FileSystem,
    backup_dir: &Path,
    targets: &[&Path],
    now: DateTime<Local>,
) -> Result<Vec<PathBuf>, AclError> {
    fs.create_dir_all(backup_dir)
        .map_err(|e| AclError::persistence(backup_dir, e))?;

    let mut written = Vec::with_capacity(targets.len());
    for target in targets {
        let base = backup_path(backup_dir, target, &now);
        let mut dest = base.clone();
        let mut attempt = 1;
        while fs.exists(&dest) {
            dest = base.with_extension(format!("bak.{}", attempt));
            attempt += 1;
        }

        fs.copy(target, &dest)
            .map_err(|e| AclError::persistence(*target, e))?;
        fs.set_permissions_mode(&dest, 0o600)
            .map_err(|e| AclError::persistence(&dest, e))?;

        info!("Backed up {:?} to {:?}", target, dest);
        written.push(dest);
    }

    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs_abstraction::{MockFileSystem, RealFileSystem};
    use chrono::TimeZone;
    use std::io;
    use tempfile::TempDir;

    fn fixed_time() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 10, 19, 14, 5, 9).unwrap()
    }

    #[test]
    fn test_backup_path_format() {
        let path = backup_path(
            Path::new("/var/backups/partneracl"),
            Path::new("/usr/sap/saprouter/saprouttab"),
            &fixed_time(),
        );
        assert_eq!(
            path,
            PathBuf::from("/var/backups/partneracl/saprouttab.20261019-140509.bak")
        );
    }

    #[test]
    fn test_take_backups_copies_both_tables() {
        let temp_dir = TempDir::new().unwrap();
        let acl = temp_dir.path().join("acl.txt");
        let router = temp_dir.path().join("saprouttab");
        std::fs::write(&acl, "acl content\n").unwrap();
        std::fs::write(&router, "router content\n").unwrap();
        let backup_dir = temp_dir.path().join("backups");

        let written = take_backups(
            &RealFileSystem,
            &backup_dir,
            &[acl.as_path(), router.as_path()],
            fixed_time(),
        )
        .unwrap();

        assert_eq!(written.len(), 2);
        assert_eq!(std::fs::read_to_string(&written[0]).unwrap(), "acl content\n");
        assert_eq!(std::fs::read_to_string(&written[1]).unwrap(), "router content\n");
    }

    #[test]
    fn test_take_backups_same_second_does_not_overwrite() {
        let temp_dir = TempDir::new().unwrap();
        let acl = temp_dir.path().join("acl.txt");
        std::fs::write(&acl, "v1\n").unwrap();
        let backup_dir = temp_dir.path().join("backups");

        let first = take_backups(&RealFileSystem, &backup_dir, &[acl.as_path()], fixed_time()).unwrap();
        std::fs::write(&acl, "v2\n").unwrap();
        let second = take_backups(&RealFileSystem, &backup_dir, &[acl.as_path()], fixed_time()).unwrap();

        assert_ne!(first[0], second[0]);
        assert_eq!(std::fs::read_to_string(&first[0]).unwrap(), "v1\n");
        assert_eq!(std::fs::read_to_string(&second[0]).unwrap(), "v2\n");
    }

    #[test]
    fn test_take_backups_copy_failure() {
        let mut mock = MockFileSystem::new();
        mock.expect_create_dir_all().returning(|_| Ok(()));
        mock.expect_exists().returning(|_| false);
        mock.expect_copy()
            .returning(|_, _| Err(io::Error::new(io::ErrorKind::NotFound, "gone")));

        let result = take_backups(
            &mock,
            Path::new("/backups"),
            &[Path::new("/srv/acl.txt")],
            fixed_time(),
        );
        assert!(matches!(result, Err(AclError::Persistence { .. })));
    }
}
