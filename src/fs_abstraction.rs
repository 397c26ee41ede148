//! Filesystem abstraction layer for testability
//!
//! This module provides a trait-based abstraction over the filesystem
//! operations the merge engine and backup step perform, so persistence
//! failures can be simulated without touching real files.
//! Uses mockall for automatic mock generation in test builds.

use std::io::{self, Write};
use std::path::Path;

#[cfg(test)]
use mockall::automock;

/// Trait abstracting filesystem operations for dependency injection.
///
/// # Example (testing)
/// ```ignore
/// use partneracl::fs_abstraction::MockFileSystem;
///
/// let mut mock_fs = MockFileSystem::new();
/// mock_fs.expect_write_atomic()
///     .returning(|_, _| Err(std::io::Error::other("disk full")));
/// ```
#[cfg_attr(test, automock)]
pub trait FileSystem: Send + Sync {
    /// Read file contents as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace a file's content atomically (temp file in the same
    /// directory, fsync, rename). Existing permissions are kept.
    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()>;

    /// Check if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Create a directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Copy a file from one location to another.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64>;

    /// Set Unix file permissions mode (e.g., 0o600).
    fn set_permissions_mode(&self, path: &Path, mode: u32) -> io::Result<()>;
}

/// Real filesystem implementation using std::fs.
#[derive(Default, Clone, Copy)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, contents: &[u8]) -> io::Result<()> {
        let parent_dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)?;
        temp_file.write_all(contents)?;

        // NamedTempFile is created 0600; keep the target's mode instead.
        if let Ok(metadata) = std::fs::metadata(path) {
            temp_file.as_file().set_permissions(metadata.permissions())?;
        }

        temp_file.as_file().sync_all()?;
        temp_file.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<u64> {
        std::fs::copy(from, to)
    }

    fn set_permissions_mode(&self, path: &Path, mode: u32) -> io::Result<()> {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::ErrorKind;
    use tempfile::TempDir;

    #[test]
    fn test_real_fs_write_atomic_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("acl.txt");

        let fs = RealFileSystem;
        fs.write_atomic(&file_path, b"# Script inserted entries\n").unwrap();

        let content = fs.read_to_string(&file_path).unwrap();
        assert_eq!(content, "# Script inserted entries\n");
    }

    #[test]
    fn test_real_fs_write_atomic_replaces_content() {
        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("saprouttab");

        let fs = RealFileSystem;
        std::fs::write(&file_path, "old\ncontent\n").unwrap();
        fs.write_atomic(&file_path, b"new\n").unwrap();

        assert_eq!(fs.read_to_string(&file_path).unwrap(), "new\n");
        // No temp files left behind
        assert_eq!(std::fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_real_fs_write_atomic_keeps_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = TempDir::new().unwrap();
        let file_path = temp_dir.path().join("saprouttab");

        let fs = RealFileSystem;
        std::fs::write(&file_path, "old\n").unwrap();
        fs.set_permissions_mode(&file_path, 0o644).unwrap();
        fs.write_atomic(&file_path, b"new\n").unwrap();

        let metadata = std::fs::metadata(&file_path).unwrap();
        assert_eq!(metadata.permissions().mode() & 0o777, 0o644);
    }

    #[test]
    fn test_real_fs_write_atomic_missing_dir() {
        let fs = RealFileSystem;
        let result = fs.write_atomic(Path::new("/nonexistent/path/file.txt"), b"test");
        assert!(result.is_err());
    }

    #[test]
    fn test_real_fs_exists_and_create_dir_all() {
        let temp_dir = TempDir::new().unwrap();
        let nested_path = temp_dir.path().join("a/b/c");

        let fs = RealFileSystem;
        assert!(!fs.exists(&nested_path));
        fs.create_dir_all(&nested_path).unwrap();
        assert!(fs.exists(&nested_path));
    }

    #[test]
    fn test_real_fs_copy() {
        let temp_dir = TempDir::new().unwrap();
        let src = temp_dir.path().join("src.txt");
        let dst = temp_dir.path().join("dst.txt");

        let fs = RealFileSystem;
        std::fs::write(&src, "copy me").unwrap();
        let bytes_copied = fs.copy(&src, &dst).unwrap();

        assert_eq!(bytes_copied, 7);
        assert_eq!(fs.read_to_string(&dst).unwrap(), "copy me");
    }

    #[test]
    fn test_real_fs_read_nonexistent() {
        let fs = RealFileSystem;
        let result = fs.read_to_string(Path::new("/nonexistent/path/file.txt"));
        assert_eq!(result.unwrap_err().kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_real_fs_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RealFileSystem>();
        assert!(!RealFileSystem.exists(Path::new("/nonexistent/path")));
    }

    #[test]
    fn test_mock_fs_error_simulation() {
        let mut mock = MockFileSystem::new();
        mock.expect_write_atomic().returning(|_, _| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"))
        });

        let result = mock.write_atomic(Path::new("/any/path"), b"data");
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
    }
}
