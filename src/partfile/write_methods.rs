// The single-writer append protocol.
//
// Every variant follows the same shape: soft-check under the writer lock,
// (for boundaries) patch the header, append the record, advance the
// cursor, settle geometry, and only then publish the index entry. Readers
// check the index before touching the file, so a chunk is never visible
// before its bytes are.

use log::trace;

use crate::error_types::partfile::PartfileError;
use crate::header::header_struct::{
    FIRST_CHUNKPOS_OFFSET, FIRST_CHUNKSIZE_OFFSET, LAST_CHUNKPOS_OFFSET, LAST_CHUNKSIZE_OFFSET,
};
use crate::partfile::partfile_struct::Partfile;
use crate::store::io::write::{append_record, patch_header_field};

impl Partfile {
    /// Append a middle chunk. `buf` must be exactly `chunksize` bytes.
    ///
    /// A duplicate id, or a write after the completed file exists, is a
    /// soft failure: a `Warning` fires and nothing changes.
    pub fn write(&self, chunk_id: i32, buf: &[u8]) -> Result<(), PartfileError> {
        self.guard_not_disposed()?;
        if buf.len() != self.chunksize as usize {
            return Err(PartfileError::InvalidArgument(
                "a middle chunk must be exactly chunksize bytes",
            ));
        }
        if chunk_id < 0 {
            return Err(PartfileError::InvalidArgument("chunk id must be non-negative"));
        }

        let mut writer = self
            .writer
            .lock()
            .expect("Other lock holders should not panic.");
        if let Some(message) = self.soft_check(chunk_id) {
            drop(writer);
            self.soft_warn(&message);
            return Ok(());
        }

        let file = writer
            .file
            .as_mut()
            .ok_or_else(|| PartfileError::Disposed(self.filename.clone()))?;
        append_record(file, &self.filename, chunk_id, buf)?;
        if self.options.flush_on_every_chunk {
            file.sync_all()
                .map_err(|error| PartfileError::io_on(&self.filename, error))?;
        }
        writer.cur_chunk_pos += 1;
        let ordinal = writer.cur_chunk_pos;
        self.index.insert(chunk_id, ordinal);
        trace!(
            "`{}`: chunk {chunk_id} appended at slot {ordinal}",
            self.filename
        );

        self.maybe_auto_create(&mut writer)
    }

    /// Append logical chunk 0, whose length may be anything up to
    /// `chunksize`. Its length pins the whole layout if it was not known
    /// before.
    pub fn write_first(&self, buf: &[u8]) -> Result<(), PartfileError> {
        self.write_boundary(0, buf)
    }

    /// Append the final logical chunk. `write_last(0, ...)` is the
    /// single-chunk case and lands on the first-chunk path.
    pub fn write_last(&self, chunk_id: i32, buf: &[u8]) -> Result<(), PartfileError> {
        self.write_boundary(chunk_id, buf)
    }

    /// Sync the container to disk. A durability point for producers that
    /// leave `flush_on_every_chunk` off.
    pub fn flush(&self) -> Result<(), PartfileError> {
        self.guard_not_disposed()?;
        let writer = self
            .writer
            .lock()
            .expect("Other lock holders should not panic.");
        if let Some(ref file) = writer.file {
            file.sync_all()
                .map_err(|error| PartfileError::io_on(&self.filename, error))?;
        }
        Ok(())
    }

    // Internal write plumbing

    /// Reason this write must be silently refused, if any.
    fn soft_check(&self, chunk_id: i32) -> Option<String> {
        if self.created() {
            return Some(format!(
                "`{}`: chunk {chunk_id} arrived after the file was already created",
                self.filename
            ));
        }
        if self.index.contains(chunk_id) {
            return Some(format!(
                "`{}`: chunk {chunk_id} was already written; keeping the original",
                self.filename
            ));
        }
        None
    }

    /// Shared path for the first/last chunks: patch the header so a resume
    /// can re-derive the slot, then append like any other chunk.
    fn write_boundary(&self, chunk_id: i32, buf: &[u8]) -> Result<(), PartfileError> {
        self.guard_not_disposed()?;
        let is_first = chunk_id == 0;
        let len = buf.len() as i32;
        if buf.is_empty() || len > self.chunksize {
            return Err(PartfileError::InvalidArgument(
                "a boundary chunk must be between 1 and chunksize bytes",
            ));
        }
        if chunk_id < 0 {
            return Err(PartfileError::InvalidArgument("chunk id must be non-negative"));
        }

        let mut writer = self
            .writer
            .lock()
            .expect("Other lock holders should not panic.");
        if let Some(message) = self.soft_check(chunk_id) {
            drop(writer);
            self.soft_warn(&message);
            return Ok(());
        }
        let next_pos = writer.cur_chunk_pos + 1;

        // Settle the layout on a scratch copy first; a bad length must not
        // leave bytes in the container.
        let mut trial = self.geometry_snapshot();
        if is_first {
            if trial.first_chunksize >= 0 && trial.first_chunksize != len {
                return Err(PartfileError::InvalidArgument(
                    "first chunk length does not match the known first chunk size",
                ));
            }
            trial.first_chunkpos = next_pos;
            trial.first_chunksize = len;
        } else {
            if trial.last_chunksize >= 0 && trial.last_chunksize != len {
                return Err(PartfileError::InvalidArgument(
                    "last chunk length does not match the known last chunk size",
                ));
            }
            trial.last_chunkpos = next_pos;
            trial.last_chunksize = len;
        }
        trial.refresh(&self.filename)?;
        if !is_first && trial.chunks_total >= 0 && chunk_id != trial.chunks_total - 1 {
            return Err(PartfileError::InvalidArgument(
                "chunk id does not name the final chunk of this layout",
            ));
        }

        let file = writer
            .file
            .as_mut()
            .ok_or_else(|| PartfileError::Disposed(self.filename.clone()))?;

        // Header first, then the payload. A crash in between leaves a slot
        // the header names but the body lacks; resume resets it.
        if is_first {
            patch_header_field(file, &self.filename, FIRST_CHUNKPOS_OFFSET, next_pos)?;
            patch_header_field(file, &self.filename, FIRST_CHUNKSIZE_OFFSET, len)?;
        } else {
            patch_header_field(file, &self.filename, LAST_CHUNKPOS_OFFSET, next_pos)?;
            patch_header_field(file, &self.filename, LAST_CHUNKSIZE_OFFSET, len)?;
        }
        append_record(file, &self.filename, chunk_id, buf)?;
        if self.options.flush_on_every_chunk {
            file.sync_all()
                .map_err(|error| PartfileError::io_on(&self.filename, error))?;
        }
        writer.cur_chunk_pos = next_pos;

        // Commit the settled layout before publishing, so a reader that
        // finds the chunk can also address it.
        {
            let mut geometry = self
                .geometry
                .write()
                .expect("Other lock holders should not panic.");
            *geometry = trial;
        }
        self.index.insert(chunk_id, next_pos);
        trace!(
            "`{}`: {} chunk ({len} bytes) appended at slot {next_pos}",
            self.filename,
            if is_first { "first" } else { "last" }
        );

        self.maybe_auto_create(&mut writer)
    }
}
