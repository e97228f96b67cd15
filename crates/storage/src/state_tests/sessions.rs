// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::apply_all;
use crate::state::MaterializedState;
use relay_core::{AgentStatePatch, Event, Session, SessionStatus, WorkspaceExportStatus};

#[test]
fn created_then_status_changes() {
    let mut state = MaterializedState::default();
    let session = Session::builder().build();
    let id = session.id;
    apply_all(
        &mut state,
        vec![
            Event::SessionCreated { session },
            Event::SessionStatusChanged { id, status: SessionStatus::Running, at_ms: 2 },
        ],
    );
    assert_eq!(state.sessions[&id].status, SessionStatus::Running);
    assert_eq!(state.sessions[&id].updated_at_ms, 2);
}

#[test]
fn cancel_is_sticky_at_the_reducer() {
    let mut state = MaterializedState::default();
    let session = Session::builder().build();
    let id = session.id;
    apply_all(
        &mut state,
        vec![
            Event::SessionCreated { session },
            Event::SessionStatusChanged { id, status: SessionStatus::Canceled, at_ms: 2 },
            Event::SessionStatusChanged { id, status: SessionStatus::Completed, at_ms: 3 },
        ],
    );
    assert_eq!(state.sessions[&id].status, SessionStatus::Canceled);
}

#[test]
fn state_patch_replace_and_clear() {
    let mut state = MaterializedState::default();
    let session = Session::builder().build();
    let id = session.id;
    let patch = AgentStatePatch { current_step: Some("working".into()), ..Default::default() };
    apply_all(
        &mut state,
        vec![
            Event::SessionCreated { session },
            Event::SessionStateReplaced { id, state: patch.clone(), at_ms: 2 },
        ],
    );
    assert_eq!(state.sessions[&id].state_patch, Some(patch));

    apply_all(&mut state, vec![Event::SessionStateCleared { id, at_ms: 3 }]);
    assert!(state.sessions[&id].state_patch.is_none());
}

#[test]
fn sdk_link_and_export_fields() {
    let mut state = MaterializedState::default();
    let session = Session::builder().build();
    let id = session.id;
    apply_all(
        &mut state,
        vec![
            Event::SessionCreated { session },
            Event::SessionSdkLinked { id, sdk_session_id: "sdk-1".into() },
            Event::SessionExportUpdated {
                id,
                status: Some(WorkspaceExportStatus::Ready),
                files_prefix: Some("workspaces/u1/ses/files".into()),
                manifest_key: None,
                archive_key: None,
            },
        ],
    );
    let session = &state.sessions[&id];
    assert_eq!(session.sdk_session_id.as_deref(), Some("sdk-1"));
    assert_eq!(session.workspace_export_status, Some(WorkspaceExportStatus::Ready));
    assert_eq!(session.workspace_files_prefix.as_deref(), Some("workspaces/u1/ses/files"));
    // Absent fields stay untouched.
    assert!(session.workspace_manifest_key.is_none());
}

#[test]
fn soft_delete_marks_flag() {
    let mut state = MaterializedState::default();
    let session = Session::builder().build();
    let id = session.id;
    apply_all(
        &mut state,
        vec![Event::SessionCreated { session }, Event::SessionDeleted { id, at_ms: 9 }],
    );
    assert!(state.sessions[&id].is_deleted);
}

#[test]
fn events_for_unknown_sessions_are_ignored() {
    let mut state = MaterializedState::default();
    apply_all(
        &mut state,
        vec![Event::SessionStatusChanged {
            id: "ses-ghost".into(),
            status: SessionStatus::Running,
            at_ms: 1,
        }],
    );
    assert!(state.sessions.is_empty());
}
