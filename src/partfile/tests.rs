// Partfile unit tests: validation, soft failures, events.
// The full end-to-end scenarios live in the integration suite.

use std::sync::atomic::{AtomicUsize, Ordering::SeqCst};
use std::sync::{Arc, Mutex};

use crate::error_types::partfile::PartfileError;
use crate::options::options_struct::PartfileOptions;
use crate::partfile::partfile_struct::Partfile;

fn options_in(dir: &tempfile::TempDir) -> PartfileOptions {
    PartfileOptions {
        folder: dir.path().join("out"),
        part_folder: dir.path().join("parts"),
        ..PartfileOptions::default()
    }
}

#[test]
fn rejects_bad_arguments() {
    let dir = tempfile::TempDir::new().expect("tempdir should open");

    let result = Partfile::open_new("bad", 0, 100, options_in(&dir));
    assert!(
        matches!(result, Err(PartfileError::InvalidArgument(_))),
        "chunksize 0 is impossible"
    );

    let result = Partfile::open_new("bad", 10, -1, options_in(&dir));
    assert!(
        matches!(result, Err(PartfileError::InvalidArgument(_))),
        "unknown size cannot be combined with auto_create"
    );

    let mut options = options_in(&dir);
    options.first_chunksize = 11;
    let result = Partfile::open_new("bad", 10, 100, options);
    assert!(
        matches!(result, Err(PartfileError::InvalidArgument(_))),
        "a boundary chunk cannot exceed chunksize"
    );

    // Unknown size is fine once auto_create is off.
    let mut options = options_in(&dir);
    options.auto_create = false;
    let partfile = Partfile::open_new("open-ended", 10, -1, options)
        .expect("unknown size without auto_create should open");
    assert_eq!(partfile.size(), -1, "size stays unknown");
    assert_eq!(partfile.chunks_total(), -1, "layout stays undetermined");
}

#[test]
fn refuses_to_clobber_without_overwrite() {
    let dir = tempfile::TempDir::new().expect("tempdir should open");
    let options = options_in(&dir);
    std::fs::create_dir_all(&options.folder).expect("mkdir should work");
    std::fs::write(options.folder.join("taken"), b"occupied").expect("write should work");

    let result = Partfile::open_new("taken", 10, 100, options.clone());
    assert!(
        matches!(result, Err(PartfileError::AlreadyExists(_))),
        "the completed path is occupied"
    );

    // With overwrite the stale file is removed.
    let mut permissive = options;
    permissive.overwrite = true;
    let partfile = Partfile::open_new("taken", 10, 100, permissive)
        .expect("overwrite should clear the way");
    assert!(!partfile.created(), "nothing has been written yet");
}

#[test]
fn duplicate_write_warns_and_keeps_the_original() {
    let dir = tempfile::TempDir::new().expect("tempdir should open");
    let warnings: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
    let sink = warnings.clone();

    let mut options = options_in(&dir);
    options.auto_create = false;
    options.events.warning = Some(Arc::new(move |_partfile, message| {
        sink.lock()
            .expect("Other lock holders should not panic.")
            .push(message.to_string());
    }));

    let partfile =
        Partfile::open_new("dup", 10, 30, options).expect("open_new should work");
    partfile.write(1, &[7u8; 10]).expect("first copy should append");
    partfile.write(1, &[9u8; 10]).expect("duplicate must fail soft");

    assert_eq!(partfile.chunks_written(), 1, "the duplicate appended nothing");
    let captured = warnings
        .lock()
        .expect("Other lock holders should not panic.");
    assert_eq!(captured.len(), 1, "exactly one warning fired");
    assert!(
        captured[0].contains("already written"),
        "the warning names the problem"
    );
}

#[test]
fn write_after_create_warns() {
    let dir = tempfile::TempDir::new().expect("tempdir should open");
    let warnings = Arc::new(AtomicUsize::new(0));
    let sink = warnings.clone();

    let mut options = options_in(&dir);
    options.events.warning = Some(Arc::new(move |_partfile, _message| {
        let _ = sink.fetch_add(1, SeqCst);
    }));

    // A single-chunk file completes on the first write.
    let partfile = Partfile::open_new("tiny", 10, 10, options).expect("open_new should work");
    partfile.write_first(&[5u8; 10]).expect("the only chunk should append");
    assert!(partfile.created(), "auto-creation fired");

    partfile.write(1, &[5u8; 10]).expect("late chunk must fail soft");
    assert_eq!(warnings.load(SeqCst), 1, "the late write warned");
}

#[test]
fn lifecycle_events_fire_in_order() {
    let dir = tempfile::TempDir::new().expect("tempdir should open");
    let stages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));

    let mut options = options_in(&dir);
    let sink = stages.clone();
    options.events.file_creating = Some(Arc::new(move |partfile| {
        sink.lock()
            .expect("Other lock holders should not panic.")
            .push(format!("creating:{}", partfile.created()));
    }));
    let sink = stages.clone();
    options.events.file_created = Some(Arc::new(move |partfile| {
        sink.lock()
            .expect("Other lock holders should not panic.")
            .push(format!("created:{}", partfile.created()));
    }));

    let partfile = Partfile::open_new("evt", 10, 10, options).expect("open_new should work");
    partfile.write_first(&[1u8; 10]).expect("the only chunk should append");

    let captured = stages
        .lock()
        .expect("Other lock holders should not panic.");
    assert_eq!(
        *captured,
        vec!["creating:false".to_string(), "created:true".to_string()],
        "FileCreating fires before the flip, FileCreated after"
    );
}

#[test]
fn zero_size_shortcut() {
    let dir = tempfile::TempDir::new().expect("tempdir should open");
    let partfile =
        Partfile::open_new("empty", 4, 0, options_in(&dir)).expect("open_new should work");

    assert!(partfile.created(), "a zero byte file needs no chunks");
    let completed = std::fs::metadata(partfile.full_path()).expect("completed file exists");
    assert_eq!(completed.len(), 0, "and it is empty");
    assert!(
        !partfile.part_path().exists(),
        "no container was ever made"
    );

    let mut buf = [0u8; 4];
    assert_eq!(
        partfile.read_at(0, &mut buf).expect("read should work"),
        0,
        "there is nothing to read"
    );
}

#[test]
fn dispose_is_idempotent_and_blocks_further_use() {
    let dir = tempfile::TempDir::new().expect("tempdir should open");
    let mut options = options_in(&dir);
    options.auto_create = false;

    let partfile = Partfile::open_new("gone", 10, 30, options).expect("open_new should work");
    partfile.write(1, &[1u8; 10]).expect("chunk should append");

    partfile.dispose().expect("dispose should work");
    partfile.dispose().expect("second dispose is a no-op");
    assert!(partfile.disposed(), "terminal state reached");

    let result = partfile.write(2, &[1u8; 10]);
    assert!(
        matches!(result, Err(PartfileError::Disposed(_))),
        "writes after dispose are refused"
    );
    let mut buf = [0u8; 4];
    let result = partfile.read_at(0, &mut buf);
    assert!(
        matches!(result, Err(PartfileError::Disposed(_))),
        "reads after dispose are refused"
    );
}
