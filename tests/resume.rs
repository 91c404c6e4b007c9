// Crash, reopen, carry on.

use std::os::unix::fs::FileExt;

use partfile_rs::{Partfile, PartfileError, PartfileOptions};
// We want to see logs while testing.
use test_log::test;

use crate::test_common::{random_bytes, scratch_options};

// Build a 220 byte partfile (20 + 100 + 100), write the two tail chunks,
// and abandon it without creating. Returns the container path.
fn abandoned_container(dir: &tempfile::TempDir) -> std::path::PathBuf {
    let mut options = scratch_options(dir);
    options.first_chunksize = 20;
    let partfile = Partfile::open_new("t", 100, 220, options).unwrap();
    partfile.write(2, &[0x03u8; 100]).unwrap();
    partfile.write(1, &[0x02u8; 100]).unwrap();
    let part_path = partfile.part_path().to_path_buf();
    // Dropping closes the handles but leaves both files exactly as a crash
    // would.
    drop(partfile);
    part_path
}

#[test]
// The ordinal layout is the index; reopening rebuilds it.
fn resume_recovers_the_index() {
    let dir = tempfile::TempDir::new().unwrap();
    let part_path = abandoned_container(&dir);

    let resumed =
        Partfile::open_existing(&part_path, false, PartfileOptions::default()).unwrap();
    assert_eq!(resumed.filename(), "t");
    assert_eq!(resumed.chunksize(), 100);
    assert_eq!(resumed.size(), 220);
    assert_eq!(resumed.chunks_written(), 2);
    assert_eq!(resumed.chunk_positions(), vec![(1, 1), (2, 0)]);
    assert_eq!(resumed.missing_chunks(), vec![0]);

    // Bytes 100..200 span the tail of chunk 1 and the head of chunk 2.
    let mut buf = [0u8; 100];
    assert_eq!(resumed.read_at(100, &mut buf).unwrap(), 100);
    assert_eq!(&buf[..20], &[0x02u8; 20]);
    assert_eq!(&buf[20..], &[0x03u8; 80]);

    // Chunk 0 is still missing; its size is known from the header, so this
    // is MissingChunk, not NotReady.
    let mut buf = [0u8; 20];
    let result = resumed.read_at(0, &mut buf);
    assert!(matches!(
        result,
        Err(PartfileError::MissingChunk { chunk_id: 0, .. })
    ));
}

#[test]
// Finishing the job after a resume.
fn resume_then_complete() {
    let dir = tempfile::TempDir::new().unwrap();
    let part_path = abandoned_container(&dir);

    let resumed =
        Partfile::open_existing(&part_path, false, PartfileOptions::default()).unwrap();
    resumed.write_first(&[0x01u8; 20]).unwrap();

    assert!(resumed.created(), "the missing chunk completed the container");
    let completed = std::fs::read(resumed.full_path()).unwrap();
    assert_eq!(completed.len(), 220);
    assert_eq!(&completed[..20], &[0x01u8; 20]);
    assert_eq!(&completed[20..120], &[0x02u8; 100]);
    assert_eq!(&completed[120..], &[0x03u8; 100]);
}

#[test]
// A container that was already full springs straight to creation on open.
fn resume_of_a_full_container_creates() {
    let dir = tempfile::TempDir::new().unwrap();
    let mut options = scratch_options(&dir);
    options.auto_create = false;

    let canonical = random_bytes(25);
    let partfile = Partfile::open_new("full", 10, 25, options).unwrap();
    partfile.write_first(&canonical[..5]).unwrap();
    partfile.write(1, &canonical[5..15]).unwrap();
    partfile.write_last(2, &canonical[15..]).unwrap();
    let part_path = partfile.part_path().to_path_buf();
    drop(partfile);

    // auto_create is back on for the resume.
    let resumed =
        Partfile::open_existing(&part_path, false, PartfileOptions::default()).unwrap();
    assert!(resumed.created(), "a full container needs no more writes");
    assert_eq!(std::fs::read(resumed.full_path()).unwrap(), canonical);
}

#[test]
// A record cut short by a crash is dropped on reopen.
fn truncated_tail_is_dropped() {
    let dir = tempfile::TempDir::new().unwrap();
    let part_path = abandoned_container(&dir);

    // Cut 5 bytes out of the second record.
    let full_len = std::fs::metadata(&part_path).unwrap().len();
    let file = std::fs::OpenOptions::new()
        .write(true)
        .open(&part_path)
        .unwrap();
    file.set_len(full_len - 5).unwrap();
    drop(file);

    let resumed =
        Partfile::open_existing(&part_path, false, PartfileOptions::default()).unwrap();
    assert_eq!(resumed.chunks_written(), 1, "only the intact record counts");
    assert_eq!(resumed.chunk_positions(), vec![(2, 0)]);

    // The torn bytes are physically gone, so the re-write of chunk 1 lands
    // on a clean record boundary and the file still completes correctly.
    resumed.write(1, &[0x02u8; 100]).unwrap();
    resumed.write_first(&[0x01u8; 20]).unwrap();
    assert!(resumed.created());
    let completed = std::fs::read(resumed.full_path()).unwrap();
    assert_eq!(&completed[..20], &[0x01u8; 20]);
    assert_eq!(&completed[20..120], &[0x02u8; 100]);
    assert_eq!(&completed[120..], &[0x03u8; 100]);
}

#[test]
// A header that names a boundary slot the body never got is reset.
fn tentative_boundary_slot_is_reset() {
    let dir = tempfile::TempDir::new().unwrap();
    let part_path = abandoned_container(&dir);

    // Forge the crash window: the header claims chunk 0 sits at slot 2,
    // but no record was ever appended there.
    let file = std::fs::OpenOptions::new()
        .write(true)
        .open(&part_path)
        .unwrap();
    file.write_all_at(&2i32.to_le_bytes(), 19).unwrap();
    drop(file);

    let resumed =
        Partfile::open_existing(&part_path, false, PartfileOptions::default()).unwrap();
    assert_eq!(resumed.chunks_written(), 2, "both real records survive");
    assert_eq!(resumed.first_chunkpos(), -1, "the phantom slot was forgotten");
    assert_eq!(resumed.first_chunksize(), 20, "the pinned size is kept");

    // The boundary write goes through again and everything completes.
    resumed.write_first(&[0x01u8; 20]).unwrap();
    assert!(resumed.created());
    assert_eq!(
        std::fs::metadata(resumed.full_path()).unwrap().len(),
        220
    );
}

#[test]
// The header remembers its folders; forcing keeps the caller's.
fn folder_override_on_resume() {
    let dir = tempfile::TempDir::new().unwrap();
    let part_path = abandoned_container(&dir);
    let elsewhere = tempfile::TempDir::new().unwrap();

    // By default the header wins.
    let mut options = PartfileOptions::default();
    options.folder = elsewhere.path().to_path_buf();
    let resumed = Partfile::open_existing(&part_path, false, options.clone()).unwrap();
    assert_eq!(
        resumed.full_path(),
        dir.path().join("completed").join("t"),
        "the header's folder is honored"
    );
    drop(resumed);

    // Forced, the caller's folder wins.
    let resumed = Partfile::open_existing(&part_path, true, options).unwrap();
    assert_eq!(
        resumed.full_path(),
        elsewhere.path().join("t"),
        "force_options_folder keeps the caller's folder"
    );
}

#[test]
// Garbage is rejected up front.
fn refuses_non_partfiles() {
    let dir = tempfile::TempDir::new().unwrap();
    let bogus = dir.path().join("bogus.apf");
    std::fs::write(&bogus, b"this is not a container at all").unwrap();

    let result = Partfile::open_existing(&bogus, false, PartfileOptions::default());
    assert!(matches!(result, Err(PartfileError::InvalidFormat { .. })));
}
