// Lookups and the single-writer insert path.

use crate::chunk_index::index_struct::ChunkIndex;

impl ChunkIndex {
    pub fn new() -> Self {
        ChunkIndex::default()
    }

    /// Ordinal slot of a chunk, if it has been written.
    pub fn get(&self, chunk_id: i32) -> Option<i32> {
        self.map
            .read()
            .expect("Other lock holders should not panic.")
            .get(&chunk_id)
            .copied()
    }

    /// Is this chunk already in the container?
    pub fn contains(&self, chunk_id: i32) -> bool {
        self.get(chunk_id).is_some()
    }

    /// Publish a freshly appended chunk. Only the write path calls this,
    /// and only after the payload bytes are durable.
    pub fn insert(&self, chunk_id: i32, ordinal: i32) {
        let previous = self
            .map
            .write()
            .expect("Other lock holders should not panic.")
            .insert(chunk_id, ordinal);
        assert!(
            previous.is_none(),
            "chunk {chunk_id} was published twice; duplicates must be filtered before the append"
        );
    }

    /// Number of chunks in the container.
    pub fn len(&self) -> usize {
        self.map
            .read()
            .expect("Other lock holders should not panic.")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A point-in-time copy of the mapping, sorted by chunk id.
    pub fn snapshot(&self) -> Vec<(i32, i32)> {
        let mut pairs: Vec<(i32, i32)> = self
            .map
            .read()
            .expect("Other lock holders should not panic.")
            .iter()
            .map(|(id, ordinal)| (*id, *ordinal))
            .collect();
        pairs.sort_unstable();
        pairs
    }
}
