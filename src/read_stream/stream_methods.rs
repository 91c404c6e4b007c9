// Cursor arithmetic and delegated reads.

use crate::error_types::partfile::PartfileError;
use crate::partfile::partfile_struct::Partfile;
use crate::read_stream::stream_struct::{PartStream, SeekOrigin};

impl Partfile {
    /// A fresh read cursor at position 0.
    pub fn read_stream(&self) -> PartStream<'_> {
        PartStream {
            partfile: self,
            position: 0,
        }
    }
}

impl PartStream<'_> {
    /// Total length of the logical file, or -1 if unknown.
    pub fn len(&self) -> i64 {
        self.partfile.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current cursor position.
    pub fn position(&self) -> i64 {
        self.position
    }

    /// Read from the cursor, advancing it by the number of bytes served.
    ///
    /// Returns 0 at (or past) the end of the logical file.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, PartfileError> {
        let got = self.partfile.read_at(self.position, buf)?;
        self.position += got as i64;
        Ok(got)
    }

    /// Move the cursor. Pure arithmetic: nothing is validated against the
    /// partfile, and an out-of-range position simply makes the next read
    /// fail or return 0. Returns the new position.
    ///
    /// `SeekOrigin::End` resolves to `length - offset`; a positive offset
    /// steps back from the end.
    pub fn seek(&mut self, offset: i64, origin: SeekOrigin) -> i64 {
        self.position = match origin {
            SeekOrigin::Begin => offset,
            SeekOrigin::Current => self.position + offset,
            SeekOrigin::End => self.len() - offset,
        };
        self.position
    }
}
