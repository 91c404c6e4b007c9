// Layout arithmetic over the container.

/// Everything needed to turn a logical byte position into a physical
/// container offset.
///
/// The container holds `headers_size` bytes of header, then one record per
/// appended chunk: a 4-byte little-endian chunk id followed by the payload.
/// Payload lengths are uniform except for the first and last logical
/// chunks, which may be shorter. `-1` marks a value that is not known yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Geometry {
    /// Total length of the logical file, or -1.
    pub size: i64,
    /// Length of a middle chunk. Immutable, always >= 1.
    pub chunksize: i32,
    /// On-disk length of the header block.
    pub headers_size: i64,
    /// Ordinal slot of logical chunk 0, or -1.
    pub first_chunkpos: i32,
    /// Length of logical chunk 0, or -1.
    pub first_chunksize: i32,
    /// Ordinal slot of the final logical chunk, or -1.
    pub last_chunkpos: i32,
    /// Length of the final logical chunk, or -1.
    pub last_chunksize: i32,
    /// Number of chunks the logical file divides into, or -1 while the
    /// boundary sizes leave the layout undetermined.
    pub chunks_total: i32,
    /// Byte length the container will have once every chunk is present,
    /// or -1 while undetermined.
    pub partsize: i64,
}
