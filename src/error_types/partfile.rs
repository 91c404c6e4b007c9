// Error types for the partfile container.
// We do not allow string-ly typed errors escaping the crate; everything a
// caller can hit is enumerated here.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while building, filling, or reading a
/// partfile.
///
/// Soft failures (duplicate chunk, write after creation) are NOT errors;
/// they surface through the `Warning` event instead and the call returns
/// `Ok` without mutating anything.
#[derive(Debug, Error)]
pub enum PartfileError {
    /// A caller-supplied value failed validation.
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The target file is already on disk and the matching overwrite flag
    /// was left off.
    #[error("`{}` already exists and overwriting is not permitted", .0.display())]
    AlreadyExists(PathBuf),

    /// The container did not start with the `APF` magic, or a header field
    /// could not be decoded.
    #[error("`{filename}` is not a partfile: {reason}")]
    InvalidFormat { filename: String, reason: String },

    /// The known boundary chunk sizes cannot tile the declared file size.
    #[error("`{filename}` has an inconsistent chunk layout: {reason}")]
    InvalidGeometry { filename: String, reason: String },

    /// A read touched a chunk that has not been written yet.
    #[error("`{filename}` does not contain chunk {chunk_id} yet")]
    MissingChunk { filename: String, chunk_id: i32 },

    /// The operation needs layout information that is not available yet.
    #[error("partfile is not ready: {0}")]
    NotReady(&'static str),

    /// Passthrough from the filesystem.
    #[error("io failure: {0}")]
    Io(#[from] std::io::Error),

    /// The operation is not supported on this object.
    #[error("operation not supported: {0}")]
    NotSupported(&'static str),

    /// The partfile was already torn down; its handles are gone.
    #[error("partfile `{0}` is disposed")]
    Disposed(String),
}

impl PartfileError {
    /// Wrap a raw filesystem error with the file it concerns. The OS error
    /// alone rarely says which of the two files went bad.
    pub(crate) fn io_on(name: impl std::fmt::Display, error: std::io::Error) -> PartfileError {
        PartfileError::Io(std::io::Error::new(
            error.kind(),
            format!("`{name}`: {error}"),
        ))
    }
}
