// The partfile itself.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering::SeqCst};
use std::sync::{Mutex, RwLock};

use log::warn;

use crate::chunk_index::index_struct::ChunkIndex;
use crate::error_types::partfile::PartfileError;
use crate::geometry::geometry_struct::Geometry;
use crate::options::options_struct::PartfileOptions;
use crate::store::store_struct::{ReadSource, WriterState};

/// A resumable partial-file container.
///
/// One on-disk file accumulates fixed-size chunks of some logical target
/// file in whatever order they arrive, serves reads at arbitrary logical
/// byte positions while still incomplete, and is materialized into the
/// final contiguous file once every chunk is present.
///
/// One writer appends (callers serialize their `write*` calls per
/// instance); any number of threads may read concurrently through
/// `read_at`, `read_chunk`, or a [`crate::read_stream`] adapter.
pub struct Partfile {
    /// Logical name; both on-disk paths derive from it.
    pub(crate) filename: String,
    /// Length of every non-boundary chunk. Immutable.
    pub(crate) chunksize: i32,
    /// Total logical length, or -1 if unknown.
    pub(crate) size: i64,
    pub(crate) options: PartfileOptions,
    /// Container path (`part_folder/filename + part_extension`).
    pub(crate) part_path: PathBuf,
    /// Completed-file path (`folder/filename`).
    pub(crate) full_path: PathBuf,
    /// Mutable layout state. Writers settle it, readers snapshot it.
    pub(crate) geometry: RwLock<Geometry>,
    /// Logical chunk id -> ordinal container slot.
    pub(crate) index: ChunkIndex,
    /// Append handle plus cursor; the mutex is also the create-gate.
    pub(crate) writer: Mutex<WriterState>,
    /// Read handle; swapped under the exclusive side during create/dispose.
    pub(crate) reader: RwLock<ReadSource>,
    pub(crate) created: AtomicBool,
    pub(crate) disposed: AtomicBool,
}

impl Partfile {
    /// Logical filename.
    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Length of a middle chunk.
    pub fn chunksize(&self) -> i32 {
        self.chunksize
    }

    /// Total length of the logical file, or -1 if unknown.
    pub fn size(&self) -> i64 {
        self.size
    }

    /// The configuration snapshot this partfile was built with.
    pub fn options(&self) -> &PartfileOptions {
        &self.options
    }

    /// Path of the container file.
    pub fn part_path(&self) -> &Path {
        &self.part_path
    }

    /// Path the completed file lands at.
    pub fn full_path(&self) -> &Path {
        &self.full_path
    }

    /// Has the completed file been materialized?
    pub fn created(&self) -> bool {
        self.created.load(SeqCst)
    }

    /// Has this partfile been torn down?
    pub fn disposed(&self) -> bool {
        self.disposed.load(SeqCst)
    }

    /// Byte length the container will have once complete, or -1 while the
    /// layout is undetermined.
    pub fn partsize(&self) -> i64 {
        self.geometry_snapshot().partsize
    }

    /// Number of chunks the logical file divides into, or -1.
    pub fn chunks_total(&self) -> i32 {
        self.geometry_snapshot().chunks_total
    }

    /// Ordinal slot of logical chunk 0, or -1 until it is written.
    pub fn first_chunkpos(&self) -> i32 {
        self.geometry_snapshot().first_chunkpos
    }

    /// Ordinal slot of the final logical chunk, or -1 until it is written.
    pub fn last_chunkpos(&self) -> i32 {
        self.geometry_snapshot().last_chunkpos
    }

    /// Length of logical chunk 0, or -1 while unknown.
    pub fn first_chunksize(&self) -> i32 {
        self.geometry_snapshot().first_chunksize
    }

    /// Length of the final logical chunk, or -1 while unknown.
    pub fn last_chunksize(&self) -> i32 {
        self.geometry_snapshot().last_chunksize
    }

    /// How many chunks have been appended so far.
    pub fn chunks_written(&self) -> i32 {
        self.index.len() as i32
    }

    /// Is a particular chunk already in the container?
    pub fn has_chunk(&self, chunk_id: i32) -> bool {
        self.index.contains(chunk_id)
    }

    /// Point-in-time copy of the chunk index, sorted by logical id.
    pub fn chunk_positions(&self) -> Vec<(i32, i32)> {
        self.index.snapshot()
    }

    /// Every chunk is present (trivially true once created).
    pub fn is_complete(&self) -> bool {
        if self.created() {
            return true;
        }
        let chunks_total = self.chunks_total();
        chunks_total >= 0 && self.index.len() == chunks_total as usize
    }

    /// Logical ids not yet written. Only meaningful once the layout is
    /// determined; undetermined layouts report an empty list.
    pub fn missing_chunks(&self) -> Vec<i32> {
        if self.created() {
            return Vec::new();
        }
        let chunks_total = self.chunks_total();
        if chunks_total < 0 {
            return Vec::new();
        }
        (0..chunks_total)
            .filter(|chunk_id| !self.index.contains(*chunk_id))
            .collect()
    }

    // Internal helpers

    pub(crate) fn geometry_snapshot(&self) -> Geometry {
        *self
            .geometry
            .read()
            .expect("Other lock holders should not panic.")
    }

    pub(crate) fn guard_not_disposed(&self) -> Result<(), PartfileError> {
        if self.disposed() {
            return Err(PartfileError::Disposed(self.filename.clone()));
        }
        Ok(())
    }

    /// Soft-failure path: log it, tell the observers, change nothing.
    /// Callers must not hold the writer lock here; the callback may want to
    /// inspect the partfile.
    pub(crate) fn soft_warn(&self, message: &str) {
        warn!("{message}");
        self.options.events.notify_warning(self, message);
    }
}

// The file handles have no useful Debug output; show the bookkeeping.
impl fmt::Debug for Partfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Partfile")
            .field("filename", &self.filename)
            .field("chunksize", &self.chunksize)
            .field("size", &self.size)
            .field("chunks_written", &self.chunks_written())
            .field("chunks_total", &self.chunks_total())
            .field("created", &self.created())
            .field("disposed", &self.disposed())
            .finish()
    }
}
