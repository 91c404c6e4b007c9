// Materializing the completed file, and tearing everything down.

use std::fs::{self, File};
use std::io::Write;
use std::sync::atomic::Ordering::SeqCst;

use log::{debug, error};

use crate::error_types::partfile::PartfileError;
use crate::partfile::partfile_struct::Partfile;
use crate::store::io::read::read_payload;
use crate::store::store_methods::{create_exclusive, ensure_parent, open_read};
use crate::store::store_struct::{ReadSource, WriterState};

impl Partfile {
    /// Drain the container into the completed file.
    ///
    /// Chunks are copied in logical id order, so every one of them must be
    /// present. Idempotent: a second call is a no-op. An I/O failure
    /// mid-drain is fatal to the call and may leave a partial target
    /// behind; the container is untouched in that case, so the operation
    /// can be retried.
    pub fn create(&self) -> Result<(), PartfileError> {
        self.guard_not_disposed()?;
        let mut writer = self
            .writer
            .lock()
            .expect("Other lock holders should not panic.");
        self.create_locked(&mut writer)
    }

    /// Tear down both handles and apply the deletion flags. Idempotent;
    /// also runs on drop.
    pub fn dispose(&self) -> Result<(), PartfileError> {
        // A poisoned lock must not stop teardown; take the state anyway.
        let mut writer = match self.writer.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        self.dispose_locked(&mut writer)
    }

    // Internal lifecycle plumbing. Both run under the writer lock, which
    // is what makes auto-creation from the write path race-free.

    pub(crate) fn create_locked(&self, writer: &mut WriterState) -> Result<(), PartfileError> {
        if self.created.load(SeqCst) {
            debug!("`{}` is already created; nothing to do", self.filename);
            return Ok(());
        }
        let geometry = self.geometry_snapshot();
        if geometry.chunks_total < 0 {
            return Err(PartfileError::NotReady("chunk layout is not determined yet"));
        }
        debug!(
            "Materializing `{}` from {} chunks",
            self.filename, geometry.chunks_total
        );
        self.options.events.notify_file_creating(self);

        ensure_parent(&self.full_path)?;
        let mut target = create_exclusive(&self.full_path)?;

        {
            // Readers are locked out until the swap below is done, so none
            // of them can catch the container handle mid-teardown.
            let mut source = self
                .reader
                .write()
                .expect("Other lock holders should not panic.");
            let container: &File = match &*source {
                ReadSource::Container(file) => file,
                _ => return Err(PartfileError::Disposed(self.filename.clone())),
            };

            let mut buffer: Vec<u8> = Vec::new();
            for chunk_id in 0..geometry.chunks_total {
                let ordinal =
                    self.index
                        .get(chunk_id)
                        .ok_or_else(|| PartfileError::MissingChunk {
                            filename: self.filename.clone(),
                            chunk_id,
                        })?;
                let capacity = geometry.capacity_of(chunk_id) as usize;
                buffer.resize(capacity, 0u8);
                read_payload(
                    container,
                    &self.filename,
                    geometry.chunk_offset(ordinal),
                    &mut buffer,
                )?;
                target
                    .write_all(&buffer)
                    .map_err(|error| PartfileError::io_on(self.full_path.display(), error))?;
            }
            target
                .sync_all()
                .map_err(|error| PartfileError::io_on(self.full_path.display(), error))?;

            // Close both container handles before touching the file.
            writer.file = None;
            *source = ReadSource::Closed;
            if self.options.delete_part_on_create {
                debug!("Deleting container `{}`", self.part_path.display());
                fs::remove_file(&self.part_path)
                    .map_err(|error| PartfileError::io_on(self.part_path.display(), error))?;
            }
            self.created.store(true, SeqCst);

            if self.options.stay_alive {
                *source = ReadSource::Completed(open_read(&self.full_path)?);
            }
        }

        debug!("`{}` created at `{}`", self.filename, self.full_path.display());
        self.options.events.notify_file_created(self);

        if !self.options.stay_alive {
            self.dispose_locked(writer)?;
        }
        Ok(())
    }

    pub(crate) fn dispose_locked(&self, writer: &mut WriterState) -> Result<(), PartfileError> {
        if self.disposed.swap(true, SeqCst) {
            return Ok(());
        }
        debug!("Disposing `{}`", self.filename);

        // Flush and close the append side.
        if let Some(file) = writer.file.take() {
            file.sync_all()
                .map_err(|error| PartfileError::io_on(&self.filename, error))?;
        }
        // Close the read side.
        {
            let mut source = match self.reader.write() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            *source = ReadSource::Closed;
        }

        if self.options.delete_part_on_dispose && self.part_path.exists() {
            debug!("Deleting container `{}`", self.part_path.display());
            fs::remove_file(&self.part_path)
                .map_err(|error| PartfileError::io_on(self.part_path.display(), error))?;
        }
        if self.options.delete_on_dispose && self.full_path.exists() {
            debug!("Deleting completed file `{}`", self.full_path.display());
            fs::remove_file(&self.full_path)
                .map_err(|error| PartfileError::io_on(self.full_path.display(), error))?;
        }
        Ok(())
    }

    /// Called at the end of every successful append, still under the
    /// writer lock: the moment the container hits its final size, finish
    /// the job.
    pub(crate) fn maybe_auto_create(
        &self,
        writer: &mut WriterState,
    ) -> Result<(), PartfileError> {
        if !self.options.auto_create || self.created.load(SeqCst) {
            return Ok(());
        }
        let partsize = self.partsize();
        if partsize < 0 {
            return Ok(());
        }
        let length = match writer.file.as_ref() {
            Some(file) => file
                .metadata()
                .map_err(|error| PartfileError::io_on(&self.filename, error))?
                .len() as i64,
            None => return Ok(()),
        };
        if length == partsize {
            return self.create_locked(writer);
        }
        Ok(())
    }
}

// The last line of defense: a partfile dropped without an explicit
// `dispose` still releases its handles and honors the deletion flags.
impl Drop for Partfile {
    fn drop(&mut self) {
        if self.disposed.load(SeqCst) {
            return;
        }
        if let Err(failure) = self.dispose() {
            error!("Failed to dispose `{}` on drop: {failure}", self.filename);
        }
    }
}
