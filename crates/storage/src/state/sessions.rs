// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session event handlers.

use super::MaterializedState;
use relay_core::Event;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::SessionCreated { session } => {
            state.sessions.insert(session.id, session.clone());
        }

        Event::SessionStatusChanged { id, status, at_ms } => {
            if let Some(session) = state.sessions.get_mut(id) {
                // transition() enforces the sticky-cancel rule even if a
                // stray event slipped past the service layer.
                session.transition(*status, *at_ms);
            }
        }

        Event::SessionConfigReplaced { id, snapshot, at_ms } => {
            if let Some(session) = state.sessions.get_mut(id) {
                session.config_snapshot = snapshot.clone();
                session.updated_at_ms = *at_ms;
            }
        }

        Event::SessionStateCleared { id, at_ms } => {
            if let Some(session) = state.sessions.get_mut(id) {
                session.state_patch = None;
                session.updated_at_ms = *at_ms;
            }
        }

        Event::SessionStateReplaced { id, state: patch, at_ms } => {
            if let Some(session) = state.sessions.get_mut(id) {
                session.state_patch = Some(patch.clone());
                session.updated_at_ms = *at_ms;
            }
        }

        Event::SessionSdkLinked { id, sdk_session_id } => {
            if let Some(session) = state.sessions.get_mut(id) {
                session.sdk_session_id = Some(sdk_session_id.clone());
            }
        }

        Event::SessionProjectChanged { id, project_id } => {
            if let Some(session) = state.sessions.get_mut(id) {
                session.project_id = *project_id;
            }
        }

        Event::SessionExportUpdated { id, status, files_prefix, manifest_key, archive_key } => {
            if let Some(session) = state.sessions.get_mut(id) {
                if status.is_some() {
                    session.workspace_export_status = *status;
                }
                if files_prefix.is_some() {
                    session.workspace_files_prefix = files_prefix.clone();
                }
                if manifest_key.is_some() {
                    session.workspace_manifest_key = manifest_key.clone();
                }
                if archive_key.is_some() {
                    session.workspace_archive_key = archive_key.clone();
                }
            }
        }

        Event::SessionDeleted { id, at_ms } => {
            if let Some(session) = state.sessions.get_mut(id) {
                session.is_deleted = true;
                session.updated_at_ms = *at_ms;
            }
        }

        _ => {}
    }
}
