// Where did that chunk land?

use std::collections::HashMap;
use std::sync::RwLock;

/// Maps a logical chunk id to the ordinal slot it was appended at.
///
/// One writer inserts, many readers look up. A reader either sees a fully
/// published entry or no entry at all; the writer publishes only after the
/// payload bytes are on disk.
#[derive(Debug, Default)]
pub struct ChunkIndex {
    pub(super) map: RwLock<HashMap<i32, i32>>,
}
