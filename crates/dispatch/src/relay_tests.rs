// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::blob::FsBlobStore;
use crate::pool::{ContainerMode, LaunchSpec};
use crate::testing::{FakeControlApi, FakeExecutor, FakeLauncher};
use chrono::{TimeZone, Utc};
use relay_core::{CallbackStatus, FakeClock};
use std::collections::HashMap;
use std::sync::atomic::Ordering;

struct Fixture {
    relay: Arc<CallbackRelay<FakeClock>>,
    api: Arc<FakeControlApi>,
    executor: Arc<FakeExecutor>,
    pool: Arc<ContainerPool>,
    workspace: Arc<WorkspaceManager>,
    _dirs: (tempfile::TempDir, tempfile::TempDir),
}

fn fixture() -> Fixture {
    let workspace_dir = tempfile::tempdir().unwrap();
    let blob_dir = tempfile::tempdir().unwrap();
    let api = Arc::new(FakeControlApi::new());
    let executor = Arc::new(FakeExecutor::new());
    let workspace = Arc::new(WorkspaceManager::new(workspace_dir.path(), true, true).unwrap());
    let pool = Arc::new(ContainerPool::new(Arc::new(FakeLauncher::new()), 4));
    let exporter = Arc::new(WorkspaceExporter::new(
        Arc::new(FsBlobStore::new(blob_dir.path())),
        FakeClock::new(),
    ));

    let relay = Arc::new(CallbackRelay::new(
        api.clone(),
        executor.clone(),
        pool.clone(),
        workspace.clone(),
        exporter,
        Duration::from_millis(200),
    ));
    Fixture { relay, api, executor, pool, workspace, _dirs: (workspace_dir, blob_dir) }
}

fn prepare_workspace(fx: &Fixture, session: &str) {
    let now = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).single().unwrap();
    let dir = fx.workspace.prepare("u1", session, "ephemeral", now).unwrap();
    std::fs::write(dir.join("workspace/out.txt"), "result").unwrap();
}

#[tokio::test]
async fn non_terminal_callbacks_forward_without_export() {
    let fx = fixture();
    let ack = fx
        .relay
        .process_callback(Callback::status_only("ses-1", CallbackStatus::Running, 30))
        .await
        .unwrap();
    assert_eq!(ack.status, "received");
    fx.relay.drain().await;
    assert_eq!(fx.api.callbacks.lock().len(), 1);
}

#[tokio::test]
async fn terminal_callback_spawns_export_and_second_callback() {
    let fx = fixture();
    prepare_workspace(&fx, "ses-1");

    fx.relay
        .process_callback(Callback::status_only("ses-1", CallbackStatus::Completed, 100))
        .await
        .unwrap();
    fx.relay.drain().await;

    let callbacks = fx.api.callbacks.lock();
    assert_eq!(callbacks.len(), 2);
    let export = &callbacks[1];
    assert_eq!(export.workspace_export_status, Some(WorkspaceExportStatus::Ready));
    assert_eq!(
        export.workspace_files_prefix.as_deref(),
        Some("workspaces/u1/ses-1/files")
    );
    assert!(export.workspace_archive_key.as_deref().unwrap().ends_with("archive.tar.gz"));
}

#[tokio::test]
async fn failed_export_reports_failed_status() {
    let fx = fixture();
    // No workspace prepared: the export cannot resolve the session.
    fx.relay
        .process_callback(Callback::status_only("ses-ghost", CallbackStatus::Failed, 100))
        .await
        .unwrap();
    fx.relay.drain().await;

    let callbacks = fx.api.callbacks.lock();
    assert_eq!(callbacks.len(), 2);
    assert_eq!(callbacks[1].workspace_export_status, Some(WorkspaceExportStatus::Failed));
}

#[tokio::test]
async fn export_result_callback_does_not_reexport() {
    let fx = fixture();
    let mut callback = Callback::status_only("ses-1", CallbackStatus::Completed, 100);
    callback.workspace_export_status = Some(WorkspaceExportStatus::Ready);
    fx.relay.process_callback(callback).await.unwrap();
    fx.relay.drain().await;
    assert_eq!(fx.api.callbacks.lock().len(), 1);
}

#[tokio::test]
async fn cancel_tells_live_executor_and_releases_container() {
    let fx = fixture();
    let session: relay_core::SessionId = "ses-1".into();
    fx.pool
        .acquire(
            LaunchSpec {
                session_id: session,
                user_id: "u1".to_string(),
                workspace_path: std::path::PathBuf::from("/tmp"),
                env: HashMap::new(),
                browser_enabled: false,
                mode: ContainerMode::Persistent,
                container_id: None,
            },
            Duration::from_millis(50),
        )
        .await
        .unwrap();

    let notified = fx.relay.cancel_executor(&session, Some("user asked")).await;
    assert!(notified);
    assert_eq!(fx.executor.canceled.lock().len(), 1);
    assert!(fx.pool.lookup(&session).is_none());
}

#[tokio::test]
async fn cancel_without_container_reports_not_notified() {
    let fx = fixture();
    let notified = fx.relay.cancel_executor(&"ses-none".into(), None).await;
    assert!(!notified);
}

#[tokio::test]
async fn cancel_survives_unreachable_executor() {
    let fx = fixture();
    let session: relay_core::SessionId = "ses-1".into();
    fx.pool
        .acquire(
            LaunchSpec {
                session_id: session,
                user_id: "u1".to_string(),
                workspace_path: std::path::PathBuf::from("/tmp"),
                env: HashMap::new(),
                browser_enabled: false,
                mode: ContainerMode::Ephemeral,
                container_id: None,
            },
            Duration::from_millis(50),
        )
        .await
        .unwrap();
    fx.executor.fail_cancel.store(true, Ordering::SeqCst);

    let notified = fx.relay.cancel_executor(&session, None).await;
    assert!(!notified);
    // The container is still torn down locally.
    assert!(fx.pool.lookup(&session).is_none());
}
