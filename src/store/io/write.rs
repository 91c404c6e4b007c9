// Appends and in-place header patches.

use std::fs::File;
use std::io::{Seek, SeekFrom, Write};
use std::os::unix::fs::FileExt;

use log::trace;

use crate::error_types::partfile::PartfileError;

/// Append one chunk record: the 4-byte little-endian id, then the payload.
///
/// Always seeks back to end-of-file first, because a header patch may have
/// moved the cursor since the previous append.
pub(crate) fn append_record(
    file: &mut File,
    filename: &str,
    chunk_id: i32,
    payload: &[u8],
) -> Result<(), PartfileError> {
    let end = file
        .seek(SeekFrom::End(0))
        .map_err(|error| PartfileError::io_on(filename, error))?;
    trace!(
        "Appending record for chunk {chunk_id} ({} bytes) at offset {end}",
        payload.len()
    );
    file.write_all(&chunk_id.to_le_bytes())
        .map_err(|error| PartfileError::io_on(filename, error))?;
    file.write_all(payload)
        .map_err(|error| PartfileError::io_on(filename, error))?;
    Ok(())
}

/// Rewrite one little-endian i32 header field in place.
///
/// Positional write; the append cursor is untouched.
pub(crate) fn patch_header_field(
    file: &File,
    filename: &str,
    offset: u64,
    value: i32,
) -> Result<(), PartfileError> {
    trace!("Patching header field at offset {offset} to {value}");
    file.write_all_at(&value.to_le_bytes(), offset)
        .map_err(|error| PartfileError::io_on(filename, error))?;
    Ok(())
}
