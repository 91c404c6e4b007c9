// Configuration for a partfile.
// This is a value type: it gets cloned on construction and never mutated
// afterwards. Layout facts learned later (boundary chunk sizes discovered by
// writes or parsed from a resumed header) live on the partfile itself, not
// here.

use std::path::PathBuf;

use crate::options::events::PartfileEvents;

/// Boundary chunk size that is not known yet.
pub const SIZE_UNKNOWN: i32 = -1;

/// Knobs for where the two files live and how their lifecycle is managed.
#[derive(Debug, Clone)]
pub struct PartfileOptions {
    /// Destination directory for the completed file.
    pub folder: PathBuf,
    /// Directory the container lives in while chunks accumulate.
    pub part_folder: PathBuf,
    /// Suffix appended to the filename to form the container name.
    pub part_extension: String,
    /// Allow deleting a pre-existing completed file.
    pub overwrite: bool,
    /// Allow deleting a pre-existing container.
    pub part_overwrite: bool,
    /// Materialize the completed file as soon as every chunk is present.
    pub auto_create: bool,
    /// Delete the completed file when the partfile is disposed.
    pub delete_on_dispose: bool,
    /// Delete the container when the partfile is disposed.
    pub delete_part_on_dispose: bool,
    /// Delete the container once the completed file exists.
    pub delete_part_on_create: bool,
    /// Keep serving reads from the completed file after creation.
    pub stay_alive: bool,
    /// Length of logical chunk 0, when the producer knows it up front.
    pub first_chunksize: i32,
    /// Length of the final logical chunk, when known up front.
    pub last_chunksize: i32,
    /// Sync the container after every chunk append.
    pub flush_on_every_chunk: bool,
    /// Lifecycle observers.
    pub events: PartfileEvents,
}

impl Default for PartfileOptions {
    fn default() -> Self {
        PartfileOptions {
            folder: PathBuf::from("."),
            part_folder: std::env::temp_dir(),
            part_extension: String::from(".apf"),
            overwrite: false,
            part_overwrite: false,
            auto_create: true,
            delete_on_dispose: false,
            delete_part_on_dispose: false,
            delete_part_on_create: true,
            stay_alive: true,
            first_chunksize: SIZE_UNKNOWN,
            last_chunksize: SIZE_UNKNOWN,
            flush_on_every_chunk: false,
            events: PartfileEvents::default(),
        }
    }
}

impl PartfileOptions {
    /// Path of the completed file for `filename`.
    pub fn full_path(&self, filename: &str) -> PathBuf {
        self.folder.join(filename)
    }

    /// Path of the container for `filename`.
    pub fn part_path(&self, filename: &str) -> PathBuf {
        let mut part_name = String::from(filename);
        part_name.push_str(&self.part_extension);
        self.part_folder.join(part_name)
    }
}
