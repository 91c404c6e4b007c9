// Construction: brand new containers and resumed ones.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::{Mutex, RwLock};

use log::debug;

use crate::chunk_index::index_struct::ChunkIndex;
use crate::error_types::partfile::PartfileError;
use crate::geometry::geometry_struct::Geometry;
use crate::header::header_struct::{Header, FIRST_CHUNKPOS_OFFSET, LAST_CHUNKPOS_OFFSET};
use crate::options::options_struct::PartfileOptions;
use crate::partfile::partfile_struct::Partfile;
use crate::store::io::read::read_record_id;
use crate::store::io::write::patch_header_field;
use crate::store::store_methods::{create_exclusive, open_read, open_write, prepare_destination};
use crate::store::store_struct::{ReadSource, WriterState};

impl Partfile {
    /// Start a fresh container for `filename`.
    ///
    /// `size` is the total length of the logical file, or -1 if the
    /// producer does not know it yet (which rules out auto-creation).
    /// A `size` of 0 skips the container entirely and materializes an
    /// empty completed file on the spot.
    pub fn open_new(
        filename: &str,
        chunksize: i32,
        size: i64,
        options: PartfileOptions,
    ) -> Result<Partfile, PartfileError> {
        open_new(filename, chunksize, size, options)
    }

    /// Resume from a container already on disk.
    ///
    /// The header is the source of truth: filename, chunk layout, and (by
    /// default) both folders come from it. Pass `force_options_folder` to
    /// keep the folders from `options` instead.
    pub fn open_existing(
        path: &Path,
        force_options_folder: bool,
        options: PartfileOptions,
    ) -> Result<Partfile, PartfileError> {
        open_existing(path, force_options_folder, options)
    }
}

// Functions

fn open_new(
    filename: &str,
    chunksize: i32,
    size: i64,
    options: PartfileOptions,
) -> Result<Partfile, PartfileError> {
    debug!("Opening new partfile `{filename}`: chunksize={chunksize}, size={size}");

    if filename.is_empty() {
        return Err(PartfileError::InvalidArgument("filename must not be empty"));
    }
    if chunksize < 1 {
        return Err(PartfileError::InvalidArgument("chunksize must be at least 1"));
    }
    if size < -1 {
        return Err(PartfileError::InvalidArgument("size must be -1 (unknown) or non-negative"));
    }
    if size == -1 && options.auto_create {
        return Err(PartfileError::InvalidArgument(
            "cannot auto-create a file of unknown size",
        ));
    }
    for boundary in [options.first_chunksize, options.last_chunksize] {
        if boundary != -1 && (boundary < 1 || boundary > chunksize) {
            return Err(PartfileError::InvalidArgument(
                "a boundary chunk size must be between 1 and chunksize",
            ));
        }
    }

    let full_path = options.full_path(filename);
    let part_path = options.part_path(filename);

    // A zero-length file has no chunks to wait for.
    if size == 0 {
        return create_empty(filename, chunksize, options, full_path, part_path);
    }

    // Settle as much of the layout as the options pin down; this also
    // validates the boundary sizes against `size` before any file exists.
    let header = Header::new(
        size,
        options.first_chunksize,
        options.last_chunksize,
        chunksize,
        filename,
        &options.folder.to_string_lossy(),
        &options.part_folder.to_string_lossy(),
    );
    let headers_size = header.headers_size();
    let mut geometry = Geometry::new(
        size,
        chunksize,
        headers_size,
        options.first_chunksize,
        options.last_chunksize,
    );
    geometry.refresh(filename)?;

    prepare_destination(&full_path, options.overwrite)?;
    prepare_destination(&part_path, options.part_overwrite)?;

    // From here on a failure must not leave a half-written container
    // behind.
    let opened = (|| -> Result<(std::fs::File, std::fs::File), PartfileError> {
        let mut write_file = create_exclusive(&part_path)?;
        write_file
            .write_all(&header.to_bytes())
            .map_err(|error| PartfileError::io_on(part_path.display(), error))?;
        write_file
            .sync_all()
            .map_err(|error| PartfileError::io_on(part_path.display(), error))?;
        let read_file = open_read(&part_path)?;
        Ok((write_file, read_file))
    })();
    let (write_file, read_file) = match opened {
        Ok(files) => files,
        Err(error) => {
            let _ = fs::remove_file(&part_path);
            return Err(error);
        }
    };

    Ok(Partfile {
        filename: filename.to_string(),
        chunksize,
        size,
        options,
        part_path,
        full_path,
        geometry: RwLock::new(geometry),
        index: ChunkIndex::new(),
        writer: Mutex::new(WriterState::new(Some(write_file), -1)),
        reader: RwLock::new(ReadSource::Container(read_file)),
        created: AtomicBool::new(false),
        disposed: AtomicBool::new(false),
    })
}

/// The `size == 0` shortcut: no container, just an empty completed file.
fn create_empty(
    filename: &str,
    chunksize: i32,
    options: PartfileOptions,
    full_path: PathBuf,
    part_path: PathBuf,
) -> Result<Partfile, PartfileError> {
    debug!("`{filename}` is zero bytes; materializing it immediately");
    prepare_destination(&full_path, options.overwrite)?;
    let target = create_exclusive(&full_path)?;
    target
        .sync_all()
        .map_err(|error| PartfileError::io_on(full_path.display(), error))?;

    let source = if options.stay_alive {
        ReadSource::Completed(open_read(&full_path)?)
    } else {
        ReadSource::Closed
    };

    let partfile = Partfile {
        filename: filename.to_string(),
        chunksize,
        size: 0,
        options,
        part_path,
        full_path,
        geometry: RwLock::new(Geometry::new(0, chunksize, 0, -1, -1)),
        index: ChunkIndex::new(),
        writer: Mutex::new(WriterState::new(None, -1)),
        reader: RwLock::new(source),
        created: AtomicBool::new(true),
        disposed: AtomicBool::new(false),
    };
    partfile.options.events.notify_file_creating(&partfile);
    partfile.options.events.notify_file_created(&partfile);
    Ok(partfile)
}

fn open_existing(
    path: &Path,
    force_options_folder: bool,
    mut options: PartfileOptions,
) -> Result<Partfile, PartfileError> {
    debug!("Resuming partfile from `{}`", path.display());
    let source_name = path.display().to_string();

    let read_file = open_read(path)?;
    let (header, headers_size) = Header::read_from(&read_file, &source_name)?;
    let filename = header.filename.clone();

    if header.chunksize < 1 {
        return Err(PartfileError::InvalidFormat {
            filename: source_name,
            reason: format!("chunksize {} is impossible", header.chunksize),
        });
    }
    let chunksize = header.chunksize;

    // The header remembers where both files belong; honor it unless the
    // caller insists on their own folders.
    if !force_options_folder {
        options.folder = PathBuf::from(&header.folder);
        options.part_folder = PathBuf::from(&header.part_folder);
    }
    // Re-derive the extension from the on-disk name, so a renamed
    // container keeps working.
    if let Some(name) = path.file_name().and_then(|name| name.to_str()) {
        if let Some(extension) = name.strip_prefix(filename.as_str()) {
            options.part_extension = extension.to_string();
        }
    }

    let full_path = options.full_path(&filename);
    let part_path = path.to_path_buf();

    prepare_destination(&full_path, options.overwrite)?;

    let mut geometry = Geometry::new(
        header.size,
        chunksize,
        headers_size,
        header.first_chunksize,
        header.last_chunksize,
    );
    geometry.first_chunkpos = header.first_chunkpos;
    geometry.last_chunkpos = header.last_chunkpos;
    geometry.refresh(&filename)?;

    // Walk the records. The ordinal layout is the index; rebuild it.
    let file_len = read_file
        .metadata()
        .map_err(|error| PartfileError::io_on(&source_name, error))?
        .len() as i64;
    let index = ChunkIndex::new();
    let mut cur_chunk_pos: i32 = -1;
    let mut offset: i64 = headers_size;
    loop {
        let ordinal = cur_chunk_pos + 1;
        let expected: i64 = if ordinal == geometry.first_chunkpos {
            geometry.first_chunksize as i64
        } else if ordinal == geometry.last_chunkpos {
            geometry.last_chunksize as i64
        } else {
            chunksize as i64
        };
        if file_len - offset < 4 + expected {
            // End of the intact records; anything further is a torn tail.
            break;
        }
        let chunk_id = read_record_id(&read_file, &source_name, offset)?;
        if index.contains(chunk_id) {
            return Err(PartfileError::InvalidFormat {
                filename: source_name,
                reason: format!("chunk {chunk_id} appears twice"),
            });
        }
        cur_chunk_pos = ordinal;
        index.insert(chunk_id, ordinal);
        offset += 4 + expected;
    }

    let write_file = open_write(path)?;

    // A boundary the header points past the intact tail was patched in but
    // never backed by a full record; forget the slot (the size may have
    // been pinned by options, so it stays).
    if geometry.first_chunkpos > cur_chunk_pos {
        debug!(
            "`{filename}`: header names first chunk slot {} but only {} records survive; resetting",
            geometry.first_chunkpos,
            cur_chunk_pos + 1
        );
        geometry.first_chunkpos = -1;
        patch_header_field(&write_file, &filename, FIRST_CHUNKPOS_OFFSET, -1)?;
    }
    if geometry.last_chunkpos > cur_chunk_pos {
        debug!(
            "`{filename}`: header names last chunk slot {} but only {} records survive; resetting",
            geometry.last_chunkpos,
            cur_chunk_pos + 1
        );
        geometry.last_chunkpos = -1;
        patch_header_field(&write_file, &filename, LAST_CHUNKPOS_OFFSET, -1)?;
    }

    // Physically drop the torn tail so the next append lands on a record
    // boundary.
    if offset < file_len {
        debug!(
            "`{filename}`: dropping {} bytes of torn tail",
            file_len - offset
        );
        write_file
            .set_len(offset as u64)
            .map_err(|error| PartfileError::io_on(&source_name, error))?;
    }

    let partsize = geometry.partsize;
    let auto_create = options.auto_create;
    let partfile = Partfile {
        filename: filename.clone(),
        chunksize,
        size: header.size,
        options,
        part_path,
        full_path,
        geometry: RwLock::new(geometry),
        index,
        writer: Mutex::new(WriterState::new(Some(write_file), cur_chunk_pos)),
        reader: RwLock::new(ReadSource::Container(read_file)),
        created: AtomicBool::new(false),
        disposed: AtomicBool::new(false),
    };
    debug!(
        "Resumed `{filename}`: {} chunks recovered",
        partfile.chunks_written()
    );

    // The container was already full; finish the job.
    if auto_create && partsize >= 0 && offset == partsize {
        partfile.create()?;
    }

    Ok(partfile)
}
