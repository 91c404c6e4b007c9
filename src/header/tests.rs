// Header codec tests.

use std::io::Write;

use crate::header::header_struct::{
    Header, CHUNKSIZE_OFFSET, FIRST_CHUNKPOS_OFFSET, FIRST_CHUNKSIZE_OFFSET, FIXED_PREFIX_LEN,
    LAST_CHUNKPOS_OFFSET, LAST_CHUNKSIZE_OFFSET, SIZE_OFFSET,
};

fn sample_header() -> Header {
    Header::new(
        4200,
        20,
        -1,
        100,
        "movie.mkv",
        "/downloads",
        "/tmp/parts",
    )
}

fn write_to_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile should open");
    file.write_all(bytes).expect("write should work");
    file
}

#[test]
fn round_trip() {
    let header = sample_header();
    let bytes = header.to_bytes();
    assert_eq!(
        bytes.len() as i64,
        header.headers_size(),
        "serialized length must match the computed headers_size"
    );

    let file = write_to_temp(&bytes);
    let (parsed, headers_size) =
        Header::read_from(file.as_file(), "movie.mkv").expect("round trip should parse");
    assert_eq!(parsed, header, "parse must invert serialize");
    assert_eq!(
        headers_size,
        header.headers_size(),
        "parse must report where the records start"
    );
}

#[test]
fn rejects_bad_magic() {
    let mut bytes = sample_header().to_bytes();
    bytes[0] = b'X';
    let file = write_to_temp(&bytes);
    let result = Header::read_from(file.as_file(), "movie.mkv");
    assert!(
        matches!(
            result,
            Err(crate::error_types::partfile::PartfileError::InvalidFormat { .. })
        ),
        "a clobbered magic must be rejected"
    );
}

#[test]
fn rejects_truncated_prefix() {
    let bytes = sample_header().to_bytes();
    let file = write_to_temp(&bytes[..10]);
    let result = Header::read_from(file.as_file(), "movie.mkv");
    assert!(
        matches!(
            result,
            Err(crate::error_types::partfile::PartfileError::InvalidFormat { .. })
        ),
        "ten bytes are not a header"
    );
}

#[test]
fn field_offsets_line_up() {
    // The patch offsets are part of the format contract. Check them against
    // an actual serialization instead of trusting the constants.
    let header = sample_header();
    let bytes = header.to_bytes();

    let read_i32 = |offset: u64| -> i32 {
        i32::from_le_bytes(
            bytes[offset as usize..offset as usize + 4]
                .try_into()
                .expect("static bounds"),
        )
    };
    let read_i64 = |offset: u64| -> i64 {
        i64::from_le_bytes(
            bytes[offset as usize..offset as usize + 8]
                .try_into()
                .expect("static bounds"),
        )
    };

    assert_eq!(read_i64(SIZE_OFFSET), 4200, "size field misplaced");
    assert_eq!(
        read_i32(FIRST_CHUNKPOS_OFFSET),
        -1,
        "first_chunkpos field misplaced"
    );
    assert_eq!(
        read_i32(FIRST_CHUNKSIZE_OFFSET),
        20,
        "first_chunksize field misplaced"
    );
    assert_eq!(
        read_i32(LAST_CHUNKPOS_OFFSET),
        -1,
        "last_chunkpos field misplaced"
    );
    assert_eq!(
        read_i32(LAST_CHUNKSIZE_OFFSET),
        -1,
        "last_chunksize field misplaced"
    );
    assert_eq!(read_i32(CHUNKSIZE_OFFSET), 100, "chunksize field misplaced");

    // First string starts right after the fixed prefix.
    let name_len = read_i32(FIXED_PREFIX_LEN);
    assert_eq!(name_len, 9, "filename length prefix misplaced");
    assert_eq!(
        &bytes[FIXED_PREFIX_LEN as usize + 4..FIXED_PREFIX_LEN as usize + 4 + 9],
        b"movie.mkv",
        "filename bytes misplaced"
    );
}
