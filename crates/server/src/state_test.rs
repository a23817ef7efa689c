use std::path::{Path, PathBuf};

use super::*;

fn base() -> PathBuf {
    PathBuf::from("data.bin")
}

#[test]
fn generation_path_appends_the_generation_number() {
    assert_eq!(
        generation_path(Path::new("data.bin"), 3),
        PathBuf::from("data.bin.3")
    );
    assert_eq!(
        generation_path(Path::new("logs/data.bin"), 0),
        PathBuf::from("logs/data.bin.0")
    );
}

#[test]
fn writer_slot_is_exclusive_while_held() {
    let state = ServerState::new();

    let (first, _) = state.claim_writer(&base()).expect("first claim");
    assert!(state.claim_writer(&base()).is_none());

    state.release(&first);
    assert!(state.claim_writer(&base()).is_some());
}

#[test]
fn each_claim_gets_a_fresh_generation_path() {
    let state = ServerState::new();

    let (first, _) = state.claim_writer(&base()).expect("first claim");
    state.release(&first);
    let (second, _) = state.claim_writer(&base()).expect("second claim");

    // A path is never reused: stale readers of a replaced generation must
    // see their own file disappear, not the next generation's bytes.
    assert_ne!(first.path(), second.path());
    assert_eq!(first.path(), Path::new("data.bin.0"));
    assert_eq!(second.path(), Path::new("data.bin.1"));
}

#[test]
fn release_clears_the_active_log() {
    let state = ServerState::new();
    let (log, _) = state.claim_writer(&base()).expect("claim");

    assert!(state.active().is_some());
    state.release(&log);
    assert!(state.active().is_none());
}

#[test]
fn claiming_over_an_adopted_log_hands_back_its_path() {
    let state = ServerState::new();
    state.adopt(
        PathBuf::from("data.bin.4"),
        taplog_store::OffsetIndex::new_shared(),
        4,
    );

    let (claimed, evicted) = state.claim_writer(&base()).expect("claim over adopted");

    assert_eq!(evicted, Some(PathBuf::from("data.bin.4")));
    // Numbered after the adopted generation, so its path is not reused.
    assert_eq!(claimed.path(), Path::new("data.bin.5"));
}

#[test]
fn release_of_a_superseded_log_is_a_no_op() {
    let state = ServerState::new();
    state.adopt(
        PathBuf::from("data.bin.0"),
        taplog_store::OffsetIndex::new_shared(),
        0,
    );
    let adopted = state.active().expect("adopted log");

    let (claimed, _) = state.claim_writer(&base()).expect("claim over adopted");
    state.release(&adopted);

    let active = state.active().expect("claimed log still active");
    assert!(Arc::ptr_eq(&active, &claimed));
}
