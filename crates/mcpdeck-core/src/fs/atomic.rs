//! Temp-then-rename writes and owner-only file creation.

use std::io::Write;
use std::path::{Path, PathBuf};

/// Owner read/write.
#[cfg(unix)]
pub const PRIVATE_MODE: u32 = 0o600;

/// Hidden sibling temp path next to `path`.
pub fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("file");
    path.with_file_name(format!(".{file_name}.{}.tmp", std::process::id()))
}

/// Create or truncate `path` with owner-only permissions and write `bytes`.
fn write_private(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut options = std::fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(PRIVATE_MODE);
    }
    let mut file = options.open(path)?;
    file.write_all(bytes)?;
    file.sync_all()?;

    // `mode` only applies on creation; tighten a pre-existing file too.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(PRIVATE_MODE))?;
    }
    Ok(())
}

/// Give `to` the permission bits of `from`.
fn copy_permissions(from: &Path, to: &Path) -> std::io::Result<()> {
    let permissions = std::fs::metadata(from)?.permissions();
    std::fs::set_permissions(to, permissions)
}

/// Replace `path` with `bytes` without ever exposing a partial file.
///
/// Existing permissions are kept; new files are created owner-only.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    write_atomic_checked(path, bytes, |_, e| e, |_| Ok(()))
}

/// Like [`write_atomic`], but runs `check` on the temp file before the rename.
///
/// I/O failures are mapped through `io_error` together with the path that
/// failed. The temp file is removed whenever the target is left untouched.
pub fn write_atomic_checked<E>(
    path: &Path,
    bytes: &[u8],
    io_error: impl Fn(&Path, std::io::Error) -> E,
    check: impl FnOnce(&Path) -> Result<(), E>,
) -> Result<(), E> {
    let tmp_path = temp_path_for(path);
    let result = write_private(&tmp_path, bytes)
        .and_then(|_| {
            if path.exists() {
                copy_permissions(path, &tmp_path)
            } else {
                Ok(())
            }
        })
        .map_err(|e| io_error(&tmp_path, e))
        .and_then(|_| check(&tmp_path))
        .and_then(|_| std::fs::rename(&tmp_path, path).map_err(|e| io_error(path, e)));

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_atomic_replaces_content_and_cleans_up() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "old").unwrap();

        write_atomic(&path, b"new").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert!(!temp_path_for(&path).exists());
    }

    #[test]
    fn failed_check_leaves_target_untouched() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.json");
        std::fs::write(&path, "old").unwrap();

        let err = write_atomic_checked(
            &path,
            b"new",
            |_, e| e.to_string(),
            |tmp| {
                assert_eq!(std::fs::read(tmp).unwrap(), b"new");
                Err("rejected".to_string())
            },
        )
        .unwrap_err();

        assert_eq!(err, "rejected");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old");
        assert!(!temp_path_for(&path).exists());
    }

    #[cfg(unix)]
    #[test]
    fn write_private_sets_owner_only_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("secrets.env");
        write_private(&path, b"A=1\n").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_keeps_existing_mode() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("shared.json");
        std::fs::write(&path, "{}").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_atomic(&path, b"{\"a\":1}").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }
}
