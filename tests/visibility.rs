use slotboard::core::{init, BoardView, Monitor, Status, Worker};
use tempfile::tempdir;

#[test]
fn local_changes_are_invisible_until_written() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("status");
    init(&path, 2).expect("init");

    let mut writer = Worker::open(0, &path, 2).expect("writer");
    let mut observer = Worker::open(1, &path, 2).expect("observer");

    writer.set_name("ingest");
    writer.set_time(1234);
    writer.set_data(b"shard-7");
    observer.read().expect("read");
    let seen = observer.records()[0];
    assert_eq!(seen.name(), "");
    assert_eq!(seen.time, 0);
    assert!(!seen.has_value());

    writer.write().expect("write");
    observer.read().expect("read");
    let seen = observer.records()[0];
    assert_eq!(seen.name(), "ingest");
    assert_eq!(seen.time, 1234);
    assert_eq!(seen.value(), "shard-7");
    assert_eq!(seen.status, Status::Ready);
}

#[test]
fn write_only_touches_own_slot() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("status");
    init(&path, 2).expect("init");

    let mut first = Worker::open(0, &path, 2).expect("first");
    let mut second = Worker::open(1, &path, 2).expect("second");
    second.set_data(b"from-second");
    second.write().expect("write second");

    // first's snapshot of slot 1 is stale, but writing slot 0 must not clobber it.
    first.set_data(b"from-first");
    first.write().expect("write first");

    let mut monitor = Monitor::open(&path, 2).expect("monitor");
    assert_eq!(
        monitor.values().expect("values"),
        vec!["from-first".to_string(), "from-second".to_string()]
    );
}

#[test]
fn values_skip_empty_slots_in_slot_order() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("status");
    init(&path, 5).expect("init");

    let mut workers: Vec<Worker> = (0..5)
        .map(|index| Worker::open(index, &path, 5).expect("worker"))
        .collect();
    for (index, payload) in [(4, "d"), (1, "b"), (3, "c")] {
        workers[index].set_data(payload.as_bytes());
        workers[index].write().expect("write");
    }

    let mut monitor = Monitor::open(&path, 5).expect("monitor");
    assert_eq!(monitor.values().expect("values"), vec!["b", "c", "d"]);
}

#[test]
fn oversized_payload_is_truncated_on_file() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("status");
    init(&path, 1).expect("init");

    let mut worker = Worker::open(0, &path, 1).expect("worker");
    worker.set_name("a-name-well-beyond-sixteen-bytes");
    worker.set_data(&[b'v'; 80]);
    worker.write().expect("write");

    let mut monitor = Monitor::open(&path, 1).expect("monitor");
    monitor.read().expect("read");
    assert_eq!(monitor.records()[0].name(), "a-name-well-beyo");
    assert_eq!(monitor.values().expect("values"), vec!["v".repeat(64)]);
}

#[test]
fn status_table_lists_every_slot() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("status");
    init(&path, 3).expect("init");

    let mut worker = Worker::open(2, &path, 3).expect("worker");
    worker.set_name("new_worker");
    worker.set_time(10);
    worker.write().expect("write");

    let mut monitor = Monitor::open(&path, 3).expect("monitor");
    let mut out = Vec::new();
    monitor.status(&mut out).expect("status");
    let text = String::from_utf8(out).expect("utf8");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 4);
    assert!(lines[1].contains("None"));
    assert!(lines[3].contains("new_worker"));
    assert!(lines[3].contains("Ready"));
    assert!(lines[3].contains(" 10 |"));
}
