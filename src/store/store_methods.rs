// Opening, creating, and clearing out the on-disk files.

use std::fs::{self, File, OpenOptions};
use std::path::Path;

use log::debug;

use crate::error_types::partfile::PartfileError;

/// Enforce the overwrite policy for `path` and make sure its parent
/// directory exists.
///
/// A pre-existing file is an error unless `overwrite` permits deleting it.
pub(crate) fn prepare_destination(path: &Path, overwrite: bool) -> Result<(), PartfileError> {
    if path.exists() {
        if !overwrite {
            return Err(PartfileError::AlreadyExists(path.to_path_buf()));
        }
        debug!("Removing pre-existing `{}`", path.display());
        fs::remove_file(path).map_err(|error| PartfileError::io_on(path.display(), error))?;
    }
    ensure_parent(path)?;
    Ok(())
}

/// Create the parent directory chain of `path`.
pub(crate) fn ensure_parent(path: &Path) -> Result<(), PartfileError> {
    if let Some(parent) = path.parent() {
        // A bare filename has an empty parent; nothing to create then.
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|error| PartfileError::io_on(parent.display(), error))?;
        }
    }
    Ok(())
}

/// Exclusive-create a file for writing. A racing creator loses with
/// `AlreadyExists`.
pub(crate) fn create_exclusive(path: &Path) -> Result<File, PartfileError> {
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(file) => Ok(file),
        Err(error) if error.kind() == std::io::ErrorKind::AlreadyExists => {
            Err(PartfileError::AlreadyExists(path.to_path_buf()))
        }
        Err(error) => Err(PartfileError::io_on(path.display(), error)),
    }
}

/// Shared read-only handle.
pub(crate) fn open_read(path: &Path) -> Result<File, PartfileError> {
    OpenOptions::new()
        .read(true)
        .open(path)
        .map_err(|error| PartfileError::io_on(path.display(), error))
}

/// Write handle on an existing container, for resumed appends and header
/// patches.
pub(crate) fn open_write(path: &Path) -> Result<File, PartfileError> {
    OpenOptions::new()
        .write(true)
        .open(path)
        .map_err(|error| PartfileError::io_on(path.display(), error))
}
