// Serving logical byte ranges out of a possibly sparse container.

use std::cmp::min;
use std::fs::File;

use log::trace;

use crate::error_types::partfile::PartfileError;
use crate::geometry::geometry_struct::Geometry;
use crate::partfile::partfile_struct::Partfile;
use crate::store::io::read::read_payload;
use crate::store::store_struct::ReadSource;

impl Partfile {
    /// Fill `buf` from logical byte position `pos`.
    ///
    /// The count is clamped to the end of the logical file. Returns the
    /// number of bytes read. Fails with `NotReady` while the first chunk
    /// size is unknown (nothing past chunk 0 can be addressed without it)
    /// and with `MissingChunk` when the range touches a chunk that has not
    /// arrived yet.
    pub fn read_at(&self, pos: i64, buf: &mut [u8]) -> Result<usize, PartfileError> {
        self.guard_not_disposed()?;
        if pos < 0 {
            return Err(PartfileError::InvalidArgument("read position must be non-negative"));
        }

        // Clamp to the logical end.
        let mut count = buf.len();
        if self.size >= 0 {
            if pos >= self.size {
                return Ok(0);
            }
            count = min(count, (self.size - pos) as usize);
        }
        if count == 0 {
            return Ok(0);
        }

        let source = self
            .reader
            .read()
            .expect("Other lock holders should not panic.");
        match &*source {
            // Once the completed file exists, this is a plain positional
            // read.
            ReadSource::Completed(file) => {
                read_payload(file, &self.filename, pos, &mut buf[..count])?;
                Ok(count)
            }
            ReadSource::Container(file) => self.read_sparse(file, pos, &mut buf[..count]),
            ReadSource::Closed => Err(PartfileError::Disposed(self.filename.clone())),
        }
    }

    /// Read from one chunk, starting `start_byte` into its payload.
    ///
    /// The count is clamped to the chunk's capacity. Returns the number of
    /// bytes read.
    pub fn read_chunk(
        &self,
        chunk_id: i32,
        start_byte: i64,
        buf: &mut [u8],
    ) -> Result<usize, PartfileError> {
        self.guard_not_disposed()?;
        if chunk_id < 0 || start_byte < 0 {
            return Err(PartfileError::InvalidArgument(
                "chunk id and start byte must be non-negative",
            ));
        }

        let source = self
            .reader
            .read()
            .expect("Other lock holders should not panic.");
        let geometry = self.geometry_snapshot();
        if geometry.first_chunksize < 0 {
            return Err(PartfileError::NotReady("first chunk size unknown"));
        }

        let capacity = geometry.capacity_of(chunk_id) as i64;
        if start_byte >= capacity {
            return Ok(0);
        }
        let readsize = min(buf.len() as i64, capacity - start_byte) as usize;

        match &*source {
            ReadSource::Completed(file) => {
                // Translate back to a logical position in the flat file.
                let chunk_start = if chunk_id == 0 {
                    0
                } else {
                    geometry.first_chunksize as i64
                        + (chunk_id as i64 - 1) * geometry.chunksize as i64
                };
                read_payload(file, &self.filename, chunk_start + start_byte, &mut buf[..readsize])?;
                Ok(readsize)
            }
            ReadSource::Container(file) => {
                let ordinal =
                    self.index
                        .get(chunk_id)
                        .ok_or_else(|| PartfileError::MissingChunk {
                            filename: self.filename.clone(),
                            chunk_id,
                        })?;
                let offset = geometry.chunk_offset(ordinal) + start_byte;
                read_payload(file, &self.filename, offset, &mut buf[..readsize])?;
                Ok(readsize)
            }
            ReadSource::Closed => Err(PartfileError::Disposed(self.filename.clone())),
        }
    }

    /// Allocating convenience over [`Partfile::read_at`].
    pub fn read_range(&self, pos: i64, len: usize) -> Result<Vec<u8>, PartfileError> {
        let mut buffer: Vec<u8> = vec![0u8; len];
        let got = self.read_at(pos, &mut buffer)?;
        buffer.truncate(got);
        Ok(buffer)
    }

    // Internal read plumbing

    /// The incomplete-container path: split the range into per-chunk reads
    /// and resolve each through the index.
    fn read_sparse(
        &self,
        file: &File,
        pos: i64,
        buf: &mut [u8],
    ) -> Result<usize, PartfileError> {
        let geometry: Geometry = self.geometry_snapshot();
        if geometry.first_chunksize < 0 {
            return Err(PartfileError::NotReady("first chunk size unknown"));
        }

        let mut total_read: usize = 0;
        let mut position = pos;
        let mut size_left = buf.len();
        while size_left > 0 {
            let (chunk_id, start_byte) = geometry.locate(position);
            let ordinal = self
                .index
                .get(chunk_id)
                .ok_or_else(|| PartfileError::MissingChunk {
                    filename: self.filename.clone(),
                    chunk_id,
                })?;

            let capacity = geometry.capacity_of(chunk_id) as i64;
            let readsize = min(size_left as i64, capacity - start_byte) as usize;
            let offset = geometry.chunk_offset(ordinal) + start_byte;
            read_payload(
                file,
                &self.filename,
                offset,
                &mut buf[total_read..total_read + readsize],
            )?;

            total_read += readsize;
            position += readsize as i64;
            size_left -= readsize;
        }
        trace!(
            "`{}`: served {total_read} bytes from logical position {pos}",
            self.filename
        );
        Ok(total_read)
    }
}
