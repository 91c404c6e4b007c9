// The two sides of the container.

use std::fs::File;

/// Where positional reads are served from right now.
///
/// Readers grab this behind a shared lock; `create()` and `dispose()` take
/// the exclusive side to swap or drop the handle, so no reader can ever
/// observe it mid-swap.
#[derive(Debug)]
pub enum ReadSource {
    /// Reads resolve chunk records inside the container.
    Container(File),
    /// The completed file exists; reads are plain positional reads.
    Completed(File),
    /// Handles are gone.
    Closed,
}

/// The append side of the container.
///
/// Lives behind the partfile's writer mutex, which doubles as the
/// create-gate: auto-creation runs while it is held, so a second writer or
/// a re-entrant create can never interleave.
#[derive(Debug)]
pub struct WriterState {
    /// Write handle on the container. `None` once the partfile has been
    /// created or disposed.
    pub file: Option<File>,
    /// Ordinal of the most recently appended chunk; -1 before the first.
    pub cur_chunk_pos: i32,
}

impl WriterState {
    pub fn new(file: Option<File>, cur_chunk_pos: i32) -> Self {
        WriterState {
            file,
            cur_chunk_pos,
        }
    }
}
