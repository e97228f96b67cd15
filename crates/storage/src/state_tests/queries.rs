// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::apply_all;
use crate::state::{install_key, MaterializedState};
use relay_core::{Event, Run, RunStatus, Session, SessionId, UserMcpInstall};

#[test]
fn session_lookup_by_internal_or_sdk_id() {
    let mut state = MaterializedState::default();
    let session = Session::builder().id(SessionId::from_string("ses-a")).build();
    let id = session.id;
    apply_all(
        &mut state,
        vec![
            Event::SessionCreated { session },
            Event::SessionSdkLinked { id, sdk_session_id: "sdk-xyz".into() },
        ],
    );
    assert!(state.session_by_id_or_sdk("ses-a").is_some());
    assert!(state.session_by_id_or_sdk("sdk-xyz").is_some());
    assert!(state.session_by_id_or_sdk("nope").is_none());
}

#[test]
fn latest_nonterminal_run_prefers_newest() {
    let mut state = MaterializedState::default();
    let session_id = SessionId::from_string("ses-1");
    let old = Run::builder()
        .id(relay_core::RunId::from_string("run-old"))
        .session_id(session_id)
        .status(RunStatus::Completed)
        .created_at_ms(100)
        .build();
    let current = Run::builder()
        .id(relay_core::RunId::from_string("run-new"))
        .session_id(session_id)
        .status(RunStatus::Running)
        .created_at_ms(200)
        .build();
    let other_session = Run::builder()
        .id(relay_core::RunId::from_string("run-other"))
        .session_id(SessionId::from_string("ses-2"))
        .created_at_ms(300)
        .build();
    apply_all(
        &mut state,
        vec![
            Event::RunEnqueued { run: old },
            Event::RunEnqueued { run: current },
            Event::RunEnqueued { run: other_session },
        ],
    );
    let latest = state.latest_nonterminal_run(&session_id).unwrap();
    assert_eq!(latest.id, "run-new");
}

#[test]
fn latest_nonterminal_run_none_when_all_terminal() {
    let mut state = MaterializedState::default();
    let session_id = SessionId::from_string("ses-1");
    let run = Run::builder().session_id(session_id).status(RunStatus::Failed).build();
    apply_all(&mut state, vec![Event::RunEnqueued { run }]);
    assert!(state.latest_nonterminal_run(&session_id).is_none());
}

#[test]
fn deleting_server_drops_installs() {
    let mut state = MaterializedState::default();
    let server = relay_core::McpServer::builder().build();
    let server_id = server.id;
    apply_all(
        &mut state,
        vec![
            Event::McpServerUpserted { server },
            Event::McpInstallUpserted {
                install: UserMcpInstall {
                    user_id: "u1".into(),
                    server_id,
                    enabled: true,
                    created_at_ms: 1,
                },
            },
        ],
    );
    assert!(state.mcp_installs.contains_key(&install_key("u1", server_id.as_str())));

    apply_all(&mut state, vec![Event::McpServerDeleted { id: server_id }]);
    assert!(state.mcp_servers.is_empty());
    assert!(state.mcp_installs.is_empty());
}
