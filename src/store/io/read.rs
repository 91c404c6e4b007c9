// Positional reads against an open container.
// All of these use pread-style calls, so they never move a file cursor and
// need no lock of their own.

use std::fs::File;
use std::os::unix::fs::FileExt;

use log::trace;

use crate::error_types::partfile::PartfileError;

/// Fill `buf` from `offset`. Fails if the file ends early.
pub(crate) fn read_payload(
    file: &File,
    filename: &str,
    offset: i64,
    buf: &mut [u8],
) -> Result<(), PartfileError> {
    trace!("Reading {} bytes at offset {offset}", buf.len());
    file.read_exact_at(buf, offset as u64)
        .map_err(|error| PartfileError::io_on(filename, error))?;
    Ok(())
}

/// Decode the 4-byte little-endian chunk id of the record at `offset`.
pub(crate) fn read_record_id(
    file: &File,
    filename: &str,
    offset: i64,
) -> Result<i32, PartfileError> {
    let mut bytes: [u8; 4] = [0u8; 4];
    file.read_exact_at(&mut bytes, offset as u64)
        .map_err(|error| PartfileError::io_on(filename, error))?;
    Ok(i32::from_le_bytes(bytes))
}
