//! Atomic writes into a textfile collector directory.
//!
//! Text is written to a hidden temporary file next to the target, synced,
//! and renamed over the target. A scraper reading the directory sees either
//! the previous file or the complete new one.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::Error;

/// A fully written temporary file, not yet visible under its final name.
///
/// Dropping it without [`Staged::commit`] removes the temporary file and
/// leaves the target untouched.
#[derive(Debug)]
pub struct Staged {
    file: NamedTempFile,
    target: PathBuf,
}

impl Staged {
    /// Returns the path of the temporary file.
    #[must_use]
    pub fn temp_path(&self) -> &Path {
        self.file.path()
    }

    /// Renames the temporary file to its final name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Write`] if the rename fails. The temporary file is
    /// removed in that case.
    pub fn commit(self) -> Result<PathBuf, Error> {
        let Self { file, target } = self;

        file.persist(&target).map_err(|error| Error::Write {
            path: target.clone(),
            source: error.error,
        })?;

        Ok(target)
    }
}

/// Writes `text` to a temporary file in `dir`, ready to be renamed to
/// `file_name`.
///
/// # Errors
///
/// Returns [`Error::Write`] if the temporary file cannot be created, written
/// or synced, e.g. because `dir` does not exist.
pub fn stage(dir: &Path, file_name: &str, text: &str) -> Result<Staged, Error> {
    let target = dir.join(file_name);

    let write_error = |source| Error::Write {
        path: target.clone(),
        source,
    };

    let prefix = format!(".{file_name}.");

    let mut file = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(write_error)?;

    debug!(path = %file.path().display(), "staging");

    // collectors usually run as another user
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        file.as_file()
            .set_permissions(fs::Permissions::from_mode(0o644))
            .map_err(write_error)?;
    }

    file.write_all(text.as_bytes()).map_err(write_error)?;
    file.flush().map_err(write_error)?;
    file.as_file().sync_all().map_err(write_error)?;

    Ok(Staged { file, target })
}

/// Atomically replaces `dir/file_name` with `text`.
///
/// # Errors
///
/// Returns [`Error::Write`] if staging or renaming fails. A pre-existing
/// target is left untouched in that case.
pub fn write(dir: &Path, file_name: &str, text: &str) -> Result<PathBuf, Error> {
    stage(dir, file_name, text)?.commit()
}

/// Creates `dir` and its parents if missing.
///
/// # Errors
///
/// Returns [`Error::Write`] if the directory cannot be created.
pub fn create_dir(dir: &Path) -> Result<(), Error> {
    fs::create_dir_all(dir).map_err(|source| Error::Write {
        path: dir.into(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entries(dir: &Path) -> Vec<String> {
        let mut names = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect::<Vec<_>>();

        names.sort();
        names
    }

    #[test]
    fn writes_target() {
        let dir = tempfile::tempdir().unwrap();

        let path = write(dir.path(), "snapraid_diff.prom", "a 1\n").unwrap();

        assert_eq!(path, dir.path().join("snapraid_diff.prom"));
        assert_eq!(fs::read_to_string(&path).unwrap(), "a 1\n");
        assert_eq!(entries(dir.path()), vec!["snapraid_diff.prom"]);
    }

    #[test]
    fn replaces_target() {
        let dir = tempfile::tempdir().unwrap();

        write(dir.path(), "snapraid_diff.prom", "a 1\n").unwrap();
        write(dir.path(), "snapraid_diff.prom", "a 2\n").unwrap();

        let path = dir.path().join("snapraid_diff.prom");
        assert_eq!(fs::read_to_string(path).unwrap(), "a 2\n");
    }

    #[test]
    fn interrupted_before_rename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapraid_smart.prom");

        write(dir.path(), "snapraid_smart.prom", "old 1\n").unwrap();

        let staged = stage(dir.path(), "snapraid_smart.prom", "new 2\n").unwrap();
        let temp_path = staged.temp_path().to_owned();

        assert!(temp_path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old 1\n");

        drop(staged);

        assert!(!temp_path.exists());
        assert_eq!(fs::read_to_string(&path).unwrap(), "old 1\n");
        assert_eq!(entries(dir.path()), vec!["snapraid_smart.prom"]);
    }

    #[test]
    fn temporary_file_is_hidden() {
        let dir = tempfile::tempdir().unwrap();

        let staged = stage(dir.path(), "snapraid_status.prom", "").unwrap();
        let name = staged.temp_path().file_name().unwrap().to_owned();
        let name = name.to_string_lossy();

        assert!(name.starts_with(".snapraid_status.prom."));
        assert!(name.ends_with(".tmp"));
    }

    #[cfg(unix)]
    #[test]
    fn readable_by_collector() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();

        let path = write(dir.path(), "snapraid_diff.prom", "").unwrap();
        let mode = fs::metadata(path).unwrap().permissions().mode();

        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");

        let error = write(&missing, "snapraid_diff.prom", "").unwrap_err();

        assert!(matches!(error, Error::Write { .. }));
        assert!(!missing.exists());
    }

    #[test]
    fn create_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("node_exporter/textfile");

        create_dir(&missing).unwrap();
        write(&missing, "snapraid_diff.prom", "").unwrap();

        assert!(missing.join("snapraid_diff.prom").exists());
    }
}
