// Filling in the layout and resolving positions against it.

use log::trace;

use crate::error_types::partfile::PartfileError;
use crate::geometry::geometry_struct::Geometry;

impl Geometry {
    /// Start from what the caller already knows. Boundary ordinals begin
    /// unknown; call `refresh` afterwards to settle totals.
    pub fn new(
        size: i64,
        chunksize: i32,
        headers_size: i64,
        first_chunksize: i32,
        last_chunksize: i32,
    ) -> Self {
        Geometry {
            size,
            chunksize,
            headers_size,
            first_chunkpos: -1,
            first_chunksize,
            last_chunkpos: -1,
            last_chunksize,
            chunks_total: -1,
            partsize: -1,
        }
    }

    /// True once `partsize` and `chunks_total` are settled.
    pub fn determined(&self) -> bool {
        self.partsize >= 0
    }

    /// Recompute the derivable fields from the known ones.
    ///
    /// Knowing either boundary size (plus the total size) pins the other
    /// boundary and therefore the whole layout. Knowing neither leaves the
    /// layout undetermined, which is fine until somebody needs to read.
    pub fn refresh(&mut self, filename: &str) -> Result<(), PartfileError> {
        refresh(self, filename)
    }

    /// Payload length of the chunk with this logical id.
    pub fn capacity_of(&self, chunk_id: i32) -> i32 {
        if chunk_id == 0 {
            return self.first_chunksize;
        }
        if self.chunks_total >= 0 && chunk_id == self.chunks_total - 1 {
            return self.last_chunksize;
        }
        self.chunksize
    }

    /// Map a logical byte position to `(chunk_id, byte_within_chunk)`.
    ///
    /// Callers must check that `first_chunksize` is known; everything after
    /// chunk 0 is addressed relative to it.
    pub fn locate(&self, pos: i64) -> (i32, i64) {
        let first = self.first_chunksize as i64;
        if pos < first {
            return (0, pos);
        }
        let chunk_id = ((pos - first) / self.chunksize as i64) + 1;
        let start_byte = (pos - first) % self.chunksize as i64;
        (chunk_id as i32, start_byte)
    }

    /// Physical offset of the payload of the chunk sitting at `ordinal`.
    ///
    /// The 4-byte id prefix of that record sits at the returned offset
    /// minus 4. Slots below `ordinal` are middle-sized unless one of them
    /// is a known boundary slot.
    pub fn chunk_offset(&self, ordinal: i32) -> i64 {
        let mut file_pos: i64 = self.headers_size + 4;
        let mut chunks_left: i64 = ordinal as i64;

        if self.first_chunkpos >= 0 && ordinal > self.first_chunkpos {
            file_pos += 4 + self.first_chunksize as i64;
            chunks_left -= 1;
        }
        if self.last_chunkpos >= 0 && ordinal > self.last_chunkpos {
            file_pos += 4 + self.last_chunksize as i64;
            chunks_left -= 1;
        }

        file_pos + chunks_left * (self.chunksize as i64 + 4)
    }
}

// Functions

fn refresh(geometry: &mut Geometry, filename: &str) -> Result<(), PartfileError> {
    let bad_geometry = |reason: String| PartfileError::InvalidGeometry {
        filename: filename.to_string(),
        reason,
    };

    // Nothing to pin the layout down with yet.
    if geometry.size < 0 || (geometry.first_chunksize < 0 && geometry.last_chunksize < 0) {
        geometry.partsize = -1;
        geometry.chunks_total = -1;
        return Ok(());
    }

    let size = geometry.size;
    let chunksize = geometry.chunksize as i64;
    let headers_size = geometry.headers_size;

    // Only the last boundary is known: the first takes whatever the tiling
    // leaves over, a full chunk if it leaves nothing.
    if geometry.first_chunksize < 0 {
        let mut first = (size - geometry.last_chunksize as i64) % chunksize;
        if first == 0 {
            first = chunksize;
        }
        if first < 0 {
            return Err(bad_geometry(format!(
                "last chunk of {} bytes does not fit a {size} byte file",
                geometry.last_chunksize
            )));
        }
        geometry.first_chunksize = first as i32;
    }
    let first = geometry.first_chunksize as i64;

    // A single-chunk file: the first chunk is the whole thing.
    if first == size {
        geometry.chunks_total = 1;
        geometry.partsize = headers_size + 4 + first;
        trace!("Geometry of `{filename}` settled: single chunk of {first} bytes");
        return Ok(());
    }

    // Only the first boundary is known: same leftover rule for the last.
    if geometry.last_chunksize < 0 {
        let mut last = (size - first) % chunksize;
        if last == 0 {
            last = chunksize;
        }
        geometry.last_chunksize = last as i32;
    }
    let last = geometry.last_chunksize as i64;

    // Two chunks and nothing between them.
    if size == first + last {
        geometry.chunks_total = 2;
        geometry.partsize = headers_size + 8 + first + last;
        trace!("Geometry of `{filename}` settled: two chunks, {first}+{last} bytes");
        return Ok(());
    }

    // The middle span has to tile exactly with full chunks.
    let sz_left = size - (first + last);
    if sz_left <= 0 || sz_left % chunksize != 0 {
        return Err(bad_geometry(format!(
            "boundary chunks of {first} and {last} bytes leave {sz_left} bytes, \
             which {chunksize} byte chunks cannot tile"
        )));
    }
    let middle_chunks = sz_left / chunksize;

    geometry.chunks_total = (2 + middle_chunks) as i32;
    geometry.partsize = headers_size + 8 + first + last + middle_chunks * (4 + chunksize);
    trace!(
        "Geometry of `{filename}` settled: {} chunks, partsize {}",
        geometry.chunks_total,
        geometry.partsize
    );
    Ok(())
}
