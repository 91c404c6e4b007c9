// Serialization back and forth for the container header.

use std::fs::File;
use std::os::unix::fs::FileExt;

use log::trace;

use crate::error_types::partfile::PartfileError;
use crate::header::header_struct::{Header, FIXED_PREFIX_LEN, FORMAT_MAJOR, FORMAT_MINOR, MAGIC};

// Anything longer than this in a string length field means we are reading
// garbage, not a header.
const MAX_STRING_LEN: i32 = 16 * 1024;

impl Header {
    /// Fill in a header for a brand new container.
    pub fn new(
        size: i64,
        first_chunksize: i32,
        last_chunksize: i32,
        chunksize: i32,
        filename: &str,
        folder: &str,
        part_folder: &str,
    ) -> Self {
        Header {
            major: FORMAT_MAJOR,
            minor: FORMAT_MINOR,
            size,
            first_chunkpos: -1,
            first_chunksize,
            last_chunkpos: -1,
            last_chunksize,
            chunksize,
            filename: filename.to_string(),
            folder: folder.to_string(),
            part_folder: part_folder.to_string(),
        }
    }

    /// Serialize to the on-disk byte layout. The returned length is the
    /// `headers_size` for this container.
    pub fn to_bytes(&self) -> Vec<u8> {
        header_to_bytes(self)
    }

    /// Total header length on disk, including the string section.
    pub fn headers_size(&self) -> i64 {
        FIXED_PREFIX_LEN as i64
            + (4 + self.filename.len() as i64)
            + (4 + self.folder.len() as i64)
            + (4 + self.part_folder.len() as i64)
    }

    /// Parse a header from the front of an open container.
    ///
    /// Returns the header and its on-disk length. `source_name` only feeds
    /// error messages.
    pub fn read_from(file: &File, source_name: &str) -> Result<(Header, i64), PartfileError> {
        read_header(file, source_name)
    }
}

// Functions

fn header_to_bytes(header: &Header) -> Vec<u8> {
    // Destructure so a new field can't silently be skipped here.
    let Header {
        major,
        minor,
        size,
        first_chunkpos,
        first_chunksize,
        last_chunkpos,
        last_chunksize,
        chunksize,
        filename,
        folder,
        part_folder,
    } = header;

    let mut buffer: Vec<u8> = Vec::with_capacity(header.headers_size() as usize);

    // Magic first, so a reader can bail out after three bytes.
    buffer.extend_from_slice(MAGIC);

    buffer.extend_from_slice(&major.to_le_bytes());
    buffer.extend_from_slice(&minor.to_le_bytes());
    buffer.extend_from_slice(&size.to_le_bytes());
    buffer.extend_from_slice(&first_chunkpos.to_le_bytes());
    buffer.extend_from_slice(&first_chunksize.to_le_bytes());
    buffer.extend_from_slice(&last_chunkpos.to_le_bytes());
    buffer.extend_from_slice(&last_chunksize.to_le_bytes());
    buffer.extend_from_slice(&chunksize.to_le_bytes());

    // The three strings, each length-prefixed.
    for text in [filename, folder, part_folder] {
        buffer.extend_from_slice(&(text.len() as i32).to_le_bytes());
        buffer.extend_from_slice(text.as_bytes());
    }

    buffer
}

fn read_header(file: &File, source_name: &str) -> Result<(Header, i64), PartfileError> {
    let bad_format = |reason: String| PartfileError::InvalidFormat {
        filename: source_name.to_string(),
        reason,
    };

    // Fixed prefix in one read.
    let mut prefix: [u8; FIXED_PREFIX_LEN as usize] = [0u8; FIXED_PREFIX_LEN as usize];
    file.read_exact_at(&mut prefix, 0)
        .map_err(|error| bad_format(format!("header too short ({error})")))?;

    if &prefix[0..3] != MAGIC {
        return Err(bad_format("bad magic".to_string()));
    }

    let major = i32::from_le_bytes(prefix[3..7].try_into().expect("static bounds"));
    let minor = i32::from_le_bytes(prefix[7..11].try_into().expect("static bounds"));
    let size = i64::from_le_bytes(prefix[11..19].try_into().expect("static bounds"));
    let first_chunkpos = i32::from_le_bytes(prefix[19..23].try_into().expect("static bounds"));
    let first_chunksize = i32::from_le_bytes(prefix[23..27].try_into().expect("static bounds"));
    let last_chunkpos = i32::from_le_bytes(prefix[27..31].try_into().expect("static bounds"));
    let last_chunksize = i32::from_le_bytes(prefix[31..35].try_into().expect("static bounds"));
    let chunksize = i32::from_le_bytes(prefix[35..39].try_into().expect("static bounds"));

    // Now the string section.
    let mut offset: u64 = FIXED_PREFIX_LEN;
    let mut strings: [String; 3] = [String::new(), String::new(), String::new()];
    for slot in strings.iter_mut() {
        let mut len_bytes: [u8; 4] = [0u8; 4];
        file.read_exact_at(&mut len_bytes, offset)
            .map_err(|error| bad_format(format!("string section truncated ({error})")))?;
        let len = i32::from_le_bytes(len_bytes);
        if !(0..=MAX_STRING_LEN).contains(&len) {
            return Err(bad_format(format!("implausible string length {len}")));
        }
        offset += 4;

        let mut text_bytes: Vec<u8> = vec![0u8; len as usize];
        file.read_exact_at(&mut text_bytes, offset)
            .map_err(|error| bad_format(format!("string section truncated ({error})")))?;
        offset += len as u64;

        *slot = String::from_utf8(text_bytes)
            .map_err(|_| bad_format("header string is not UTF-8".to_string()))?;
    }
    let [filename, folder, part_folder] = strings;

    trace!(
        "Parsed header of `{filename}`: size={size}, chunksize={chunksize}, headers_size={offset}"
    );

    Ok((
        Header {
            major,
            minor,
            size,
            first_chunkpos,
            first_chunksize,
            last_chunkpos,
            last_chunksize,
            chunksize,
            filename,
            folder,
            part_folder,
        },
        offset as i64,
    ))
}
