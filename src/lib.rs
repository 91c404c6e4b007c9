// The library cannot use unwraps.
#![deny(clippy::unwrap_used)]

// Asserts need to have a reason.
#![deny(clippy::missing_assert_message)]

//! A resumable partial-file container.
//!
//! One on-disk container (`.apf` by default) accumulates fixed-size chunks
//! of a logical target file in whatever order a producer delivers them.
//! The container can be read at arbitrary logical byte positions while
//! still incomplete, survives process crashes, and is materialized into
//! the final contiguous file once every chunk is present.
//!
//! The container format: an `APF`-tagged little-endian header, then one
//! record per chunk in append order (`int32 id` followed by the payload).
//! There is no index on disk; the ordinal layout is the index, rebuilt on
//! open.

pub mod chunk_index;
pub mod error_types;
pub mod geometry;
pub mod header;
pub mod options;
pub mod partfile;
pub mod read_stream;
pub mod store;

pub use error_types::partfile::PartfileError;
pub use options::events::PartfileEvents;
pub use options::options_struct::PartfileOptions;
pub use partfile::partfile_struct::Partfile;
pub use read_stream::stream_struct::{PartStream, SeekOrigin};
