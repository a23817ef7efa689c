use std::time::Duration;

use tempfile::tempdir;
use tokio::time::timeout;

use taplog_store::{OffsetIndex, RecordLog, StoreError};

use crate::error::QueryError;

use super::*;

const TEST_POLL: Duration = Duration::from_millis(5);

async fn log_in(dir: &tempfile::TempDir) -> RecordLog {
    RecordLog::create(dir.path().join("data.bin"), OffsetIndex::new_shared())
        .await
        .expect("create log")
}

fn reader_for(log: &RecordLog) -> TailingReader {
    TailingReader::new(log.path()).with_poll_interval(TEST_POLL)
}

#[tokio::test]
async fn malformed_expression_fails_at_open() {
    let dir = tempdir().expect("create temp dir");
    let log = log_in(&dir).await;

    let err = QuerySession::open(reader_for(&log), "age >> '30'").expect_err("bad expression");

    assert!(matches!(err, QueryError::Parse(_)));
}

#[tokio::test]
async fn yields_only_matching_records_in_log_order() {
    let dir = tempdir().expect("create temp dir");
    let mut log = log_in(&dir).await;
    log.append(br#"{"kind": "car", "id": 1}"#).await.expect("append");
    log.append(br#"{"kind": "school", "id": 2}"#).await.expect("append");
    log.append(br#"{"kind": "car", "id": 3}"#).await.expect("append");

    let mut session =
        QuerySession::open(reader_for(&log), "kind == 'car'").expect("open session");

    let first = session.next_match().await.expect("first match");
    assert_eq!(&first[..], br#"{"kind": "car", "id": 1}"#);
    let second = session.next_match().await.expect("second match");
    assert_eq!(&second[..], br#"{"kind": "car", "id": 3}"#);
}

#[tokio::test]
async fn unparseable_records_are_skipped_not_fatal() {
    let dir = tempdir().expect("create temp dir");
    let mut log = log_in(&dir).await;
    log.append(b"garbage not json").await.expect("append");
    log.append(br#"{"kind": "car"}"#).await.expect("append");

    let mut session =
        QuerySession::open(reader_for(&log), "kind == 'car'").expect("open session");

    let matched = session.next_match().await.expect("match after skip");
    assert_eq!(&matched[..], br#"{"kind": "car"}"#);
}

#[tokio::test]
async fn sees_matches_appended_after_catching_up() {
    let dir = tempdir().expect("create temp dir");
    let mut log = log_in(&dir).await;
    log.append(br#"{"kind": "school"}"#).await.expect("append");

    let mut session =
        QuerySession::open(reader_for(&log), "kind == 'car'").expect("open session");

    let writer = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        log.append(br#"{"kind": "car", "late": true}"#)
            .await
            .expect("append");
    });

    let matched = timeout(Duration::from_secs(1), session.next_match())
        .await
        .expect("session should observe the new record")
        .expect("match");
    assert_eq!(&matched[..], br#"{"kind": "car", "late": true}"#);

    writer.await.expect("writer task");
}

#[tokio::test]
async fn session_ends_with_source_gone_when_log_is_removed() {
    let dir = tempdir().expect("create temp dir");
    let mut log = log_in(&dir).await;
    log.append(br#"{"kind": "car"}"#).await.expect("append");

    let mut session =
        QuerySession::open(reader_for(&log), "kind == 'car'").expect("open session");
    session.next_match().await.expect("existing match");

    log.remove().await.expect("remove log");

    let err = timeout(Duration::from_secs(1), session.next_match())
        .await
        .expect("session should terminate")
        .expect_err("source gone");
    assert!(matches!(
        err,
        QueryError::Store(StoreError::SourceGone)
    ));
}
