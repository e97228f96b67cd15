// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use relay_core::{Event, Session};

fn snapshot_with_session() -> Snapshot {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::SessionCreated { session: Session::builder().build() });
    Snapshot {
        version: CURRENT_SNAPSHOT_VERSION,
        seq: 7,
        state,
        created_at: Utc::now(),
    }
}

#[test]
fn save_and_load_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = snapshot_with_session();
    save_snapshot(dir.path(), &snapshot).unwrap();

    let loaded = load_snapshot(dir.path()).unwrap().unwrap();
    assert_eq!(loaded.seq, 7);
    assert_eq!(loaded.version, CURRENT_SNAPSHOT_VERSION);
    assert_eq!(loaded.state.sessions.len(), 1);
}

#[test]
fn load_missing_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_snapshot(dir.path()).unwrap().is_none());
}

#[test]
fn resave_rotates_backup() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = snapshot_with_session();
    save_snapshot(dir.path(), &snapshot).unwrap();
    save_snapshot(dir.path(), &snapshot).unwrap();
    assert!(dir.path().join("state.bak").exists());
    save_snapshot(dir.path(), &snapshot).unwrap();
    assert!(dir.path().join("state.bak.2").exists());
}

#[test]
fn future_version_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let mut snapshot = snapshot_with_session();
    snapshot.version = CURRENT_SNAPSHOT_VERSION + 1;
    save_snapshot(dir.path(), &snapshot).unwrap();
    assert!(matches!(
        load_snapshot(dir.path()),
        Err(SnapshotError::UnsupportedVersion(_))
    ));
}
