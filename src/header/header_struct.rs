// The container header.

/// Tag at offset 0 of every container.
pub const MAGIC: &[u8; 3] = b"APF";

/// Format version pair written into every new container. The reader records
/// but does not act on these; the layout has been stable since the format
/// was introduced.
pub const FORMAT_MAJOR: i32 = 1;
pub const FORMAT_MINOR: i32 = 0;

// Fixed field offsets. The boundary pos/size fields get patched in place
// when a boundary chunk arrives, so their offsets are part of the contract.
pub const SIZE_OFFSET: u64 = 11;
pub const FIRST_CHUNKPOS_OFFSET: u64 = 19;
pub const FIRST_CHUNKSIZE_OFFSET: u64 = 23;
pub const LAST_CHUNKPOS_OFFSET: u64 = 27;
pub const LAST_CHUNKSIZE_OFFSET: u64 = 31;
pub const CHUNKSIZE_OFFSET: u64 = 35;

/// End of the fixed prefix; the three length-prefixed strings start here.
pub const FIXED_PREFIX_LEN: u64 = 39;

/// Everything stored ahead of the chunk records.
///
/// All integers are little-endian on disk. `-1` marks a value that is not
/// known yet; the boundary fields are rewritten in place once the matching
/// chunk shows up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub major: i32,
    pub minor: i32,
    /// Total length of the logical file, or -1 if unknown.
    pub size: i64,
    /// Ordinal slot holding logical chunk 0, or -1.
    pub first_chunkpos: i32,
    /// Length of logical chunk 0, or -1.
    pub first_chunksize: i32,
    /// Ordinal slot holding the final logical chunk, or -1.
    pub last_chunkpos: i32,
    /// Length of the final logical chunk, or -1.
    pub last_chunksize: i32,
    /// Length of every other chunk.
    pub chunksize: i32,
    pub filename: String,
    pub folder: String,
    pub part_folder: String,
}
