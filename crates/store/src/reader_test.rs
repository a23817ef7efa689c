use std::time::Duration;

use tempfile::tempdir;
use tokio::time::timeout;

use crate::index::OffsetIndex;
use crate::log::RecordLog;

use super::*;

const TEST_POLL: Duration = Duration::from_millis(5);

async fn log_in(dir: &tempfile::TempDir) -> RecordLog {
    RecordLog::create(dir.path().join("data.bin"), OffsetIndex::new_shared())
        .await
        .expect("create log")
}

#[tokio::test]
async fn replays_existing_records_in_append_order() {
    let dir = tempdir().expect("create temp dir");
    let mut log = log_in(&dir).await;
    for payload in [b"r0".as_slice(), b"r1", b"r2"] {
        log.append(payload).await.expect("append");
    }

    let mut reader = TailingReader::new(log.path()).with_poll_interval(TEST_POLL);

    assert_eq!(&reader.next().await.expect("next")[..], b"r0");
    assert_eq!(&reader.next().await.expect("next")[..], b"r1");
    assert_eq!(&reader.next().await.expect("next")[..], b"r2");
}

#[tokio::test]
async fn interleaved_append_and_read_preserves_order() {
    let dir = tempdir().expect("create temp dir");
    let mut log = log_in(&dir).await;
    let mut reader = TailingReader::new(log.path()).with_poll_interval(TEST_POLL);

    log.append(b"a").await.expect("append");
    assert_eq!(&reader.next().await.expect("next")[..], b"a");

    log.append(b"b").await.expect("append");
    log.append(b"c").await.expect("append");
    assert_eq!(&reader.next().await.expect("next")[..], b"b");
    assert_eq!(&reader.next().await.expect("next")[..], b"c");
}

#[tokio::test]
async fn tailing_reader_observes_record_appended_while_waiting() {
    let dir = tempdir().expect("create temp dir");
    let mut log = log_in(&dir).await;
    log.append(b"old").await.expect("append");

    let mut reader = TailingReader::new(log.path()).with_poll_interval(TEST_POLL);
    assert_eq!(&reader.next().await.expect("next")[..], b"old");

    // Reader is now at end-of-log; append from another task while it polls.
    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        log.append(b"new").await.expect("append");
    });

    let payload = timeout(Duration::from_secs(1), reader.next())
        .await
        .expect("reader should wake up")
        .expect("next");
    assert_eq!(&payload[..], b"new");

    writer.await.expect("writer task");
}

#[tokio::test]
async fn deleted_log_terminates_polling_reader_with_source_gone() {
    let dir = tempdir().expect("create temp dir");
    let mut log = log_in(&dir).await;
    log.append(b"only").await.expect("append");

    let mut reader = TailingReader::new(log.path()).with_poll_interval(TEST_POLL);
    assert_eq!(&reader.next().await.expect("next")[..], b"only");

    log.remove().await.expect("remove log");

    let err = timeout(Duration::from_secs(1), reader.next())
        .await
        .expect("reader should terminate, not block")
        .expect_err("source gone");
    assert!(matches!(err, StoreError::SourceGone));
}

#[tokio::test]
async fn missing_log_is_source_gone_immediately() {
    let dir = tempdir().expect("create temp dir");
    let mut reader = TailingReader::new(dir.path().join("nope.bin"));

    let err = reader.read_once().await.expect_err("source gone");

    assert!(matches!(err, StoreError::SourceGone));
}

#[tokio::test]
async fn reader_can_start_at_an_indexed_offset() {
    let dir = tempdir().expect("create temp dir");
    let mut log = log_in(&dir).await;
    for payload in [b"zero".as_slice(), b"one", b"two"] {
        log.append(payload).await.expect("append");
    }

    let offset = log.index().read().offset_of(2).expect("offset of 2");
    let mut reader = TailingReader::new(log.path()).with_start_offset(offset);

    let payload = reader.read_once().await.expect("read").expect("record");
    assert_eq!(&payload[..], b"two");
    // One-shot reader at the end of the log has nothing further.
    assert!(reader.read_once().await.expect("read").is_none());
}

#[tokio::test]
async fn incomplete_trailing_frame_stays_invisible() {
    use std::io::Write;

    let dir = tempdir().expect("create temp dir");
    let path = dir.path().join("data.bin");
    let mut raw = std::fs::File::create(&path).expect("create file");
    raw.write_all(&crate::frame::encode_frame(b"done"))
        .expect("write");
    // Prefix for a 6-byte payload with only half of it on disk
    raw.write_all(&6u64.to_le_bytes()).expect("write");
    raw.write_all(b"hal").expect("write");
    raw.flush().expect("flush");

    let mut reader = TailingReader::new(&path).with_poll_interval(TEST_POLL);
    assert_eq!(&reader.next().await.expect("next")[..], b"done");
    assert!(reader.read_once().await.expect("read").is_none());

    // Completing the payload makes the frame visible at the same cursor.
    raw.write_all(b"f-6").expect("write");
    raw.flush().expect("flush");

    let payload = timeout(Duration::from_secs(1), reader.next())
        .await
        .expect("frame should appear")
        .expect("next");
    assert_eq!(&payload[..], b"half-6");
}
