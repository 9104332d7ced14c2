//! Atomic config/profile persistence (spec §6.3).
//!
//! Grounded in the teacher's `acquire_config_lock` (a sibling `.lock` file,
//! `fs2::FileExt::lock_exclusive`) and its `etcetera`-based config directory
//! resolution, generalized from a single TOML file to the layered YAML tree
//! this spec describes.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use etcetera::base_strategy::{BaseStrategy, choose_base_strategy};
use fs2::FileExt;

use crate::error::CoreError;

#[cfg(unix)]
fn set_mode(path: &Path, mode: u32) -> std::io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_mode(_path: &Path, _mode: u32) -> std::io::Result<()> {
    Ok(())
}

/// The platform config directory for this tool, honoring `XDG_CONFIG_HOME`
/// (via `etcetera`) the same way the teacher resolves its own.
pub fn config_dir() -> Result<PathBuf, CoreError> {
    if let Ok(path) = std::env::var("GZ_CONFIG_DIR") {
        return Ok(PathBuf::from(path));
    }
    let strategy = choose_base_strategy()
        .map_err(|e| CoreError::ConfigInvalid(format!("could not resolve a config directory: {e}")))?;
    Ok(strategy.config_dir().join("gzr"))
}

/// Write `contents` to `path` atomically: write to a sibling temp file, fsync,
/// then rename over the destination. Creates the enclosing directory with
/// mode 0700 if missing, and sets the final file to mode 0600.
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), CoreError> {
    let parent = path
        .parent()
        .ok_or_else(|| CoreError::ConfigInvalid(format!("{} has no parent directory", path.display())))?;
    fs::create_dir_all(parent).map_err(|e| CoreError::ConfigInvalid(format!("could not create {}: {e}", parent.display())))?;
    let _ = set_mode(parent, 0o700);

    let lock_path = path.with_extension("lock");
    let lock_file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(&lock_path)
        .map_err(|e| CoreError::ConfigInvalid(format!("could not open lock file {}: {e}", lock_path.display())))?;
    lock_file
        .lock_exclusive()
        .map_err(|e| CoreError::ConfigInvalid(format!("could not acquire lock on {}: {e}", lock_path.display())))?;

    let tmp_path = path.with_extension("tmp");
    let mut tmp_file = fs::File::create(&tmp_path)
        .map_err(|e| CoreError::ConfigInvalid(format!("could not create {}: {e}", tmp_path.display())))?;
    tmp_file
        .write_all(contents.as_bytes())
        .and_then(|_| tmp_file.sync_all())
        .map_err(|e| CoreError::ConfigInvalid(format!("could not write {}: {e}", tmp_path.display())))?;
    drop(tmp_file);
    let _ = set_mode(&tmp_path, 0o600);

    fs::rename(&tmp_path, path).map_err(|e| CoreError::ConfigInvalid(format!("could not replace {}: {e}", path.display())))?;

    let _ = lock_file.unlock();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_creates_parent_and_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.yaml");
        write_atomic(&path, "parallel: 4\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "parallel: 4\n");
    }

    #[test]
    fn write_atomic_leaves_no_temp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        write_atomic(&path, "a: 1\n").unwrap();
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn config_dir_honors_explicit_override() {
        std::env::set_var("GZ_CONFIG_DIR", "/tmp/gzr-test-config-dir");
        let dir = config_dir().unwrap();
        assert_eq!(dir, PathBuf::from("/tmp/gzr-test-config-dir"));
        std::env::remove_var("GZ_CONFIG_DIR");
    }
}
