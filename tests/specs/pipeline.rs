// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The full dispatcher pipeline end to end: enqueue → pull → resolve →
//! stage → handoff → callbacks → export.

use super::support::{deployment, WORKER};
use relay_core::{Callback, CallbackStatus, RunStatus, SessionStatus, WorkspaceExportStatus};
use relay_dispatch::blob::BlobStore;
use relay_wire::{
    EnvVarCreateRequest, InstructionsSetRequest, McpServerCreateRequest, SkillCreateRequest,
    SlashCommandCreateRequest, TaskEnqueueRequest,
};
use serde_json::json;

#[tokio::test]
async fn enqueue_to_export_round_trip() {
    let deployment = deployment();
    let ctx = deployment.ctx("u1");

    // Catalogs: a secret, an MCP server, a skill, a slash command, and
    // persistent instructions.
    deployment
        .control
        .create_user_env_var(
            &ctx,
            EnvVarCreateRequest { key: "GH_TOKEN".into(), value: "tok".into(), description: None },
        )
        .unwrap();

    let server = deployment
        .control
        .create_mcp_server(
            &ctx,
            McpServerCreateRequest {
                name: "github".into(),
                server_config: json!({"mcpServers": {"github": {"command": "gh-mcp"}}}),
                scope: None,
                description: None,
            },
        )
        .unwrap();
    deployment.control.install_mcp_server(&ctx, &server.id, true).unwrap();

    let skill = deployment
        .control
        .create_skill(
            &ctx,
            SkillCreateRequest {
                name: "docs".into(),
                entry: json!({"s3_key": "skills/u1/docs/v1/", "is_prefix": true}),
                scope: None,
            },
        )
        .unwrap();
    deployment.control.install_skill(&ctx, &skill.id, true).unwrap();
    deployment
        .blob
        .put_object("skills/u1/docs/v1/SKILL.md", b"# docs skill".to_vec(), None)
        .await
        .unwrap();

    deployment
        .control
        .create_slash_command(
            &ctx,
            SlashCommandCreateRequest {
                name: "deploy".into(),
                enabled: true,
                mode: Some("raw".into()),
                content: None,
                allowed_tools: None,
                description: None,
                argument_hint: None,
                raw_markdown: Some("---\nmodel: opus\ndescription: d\n---\nGo.\n".into()),
            },
        )
        .unwrap();
    deployment
        .control
        .set_instructions(
            &ctx,
            InstructionsSetRequest { enabled: true, content: "Be concise.".into() },
        )
        .unwrap();

    // Enqueue and let the puller dispatch.
    let outcome = deployment
        .control
        .enqueue_task(
            &ctx,
            TaskEnqueueRequest {
                prompt: "build the thing".to_string(),
                permission_mode: Some("acceptEdits".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    deployment.puller.poll(None).await;
    deployment.puller.stop().await;

    // The run started and the executor got a fully staged payload.
    assert_eq!(deployment.run(&outcome.run_id).status, RunStatus::Running);
    let (executor_url, payload) = deployment.executor.executed.lock()[0].clone();
    assert!(executor_url.starts_with("fake://executor-"));
    assert_eq!(payload.prompt, "build the thing");
    assert_eq!(payload.permission_mode, relay_core::PermissionMode::AcceptEdits);
    assert_eq!(payload.config.env.get("GH_TOKEN").map(String::as_str), Some("tok"));
    assert!(payload.config.mcp_servers.contains_key("github"));

    let workspace_path = deployment.launcher.started.lock()[0].workspace_path.clone();
    assert!(workspace_path.join(".claude_data/skills/docs/SKILL.md").is_file());
    assert!(workspace_path.join(".claude_data/CLAUDE.md").is_file());
    let command = std::fs::read_to_string(workspace_path.join(".claude_data/commands/deploy.md"))
        .unwrap();
    assert!(!command.contains("model"));

    // The agent writes output, then the executor streams callbacks
    // through the relay.
    std::fs::write(workspace_path.join("result.txt"), "42").unwrap();

    let mut running =
        Callback::status_only(outcome.session_id.as_str(), CallbackStatus::Running, 50);
    running.sdk_session_id = Some("sdk-run-1".into());
    deployment.relay.process_callback(running).await.unwrap();

    deployment
        .relay
        .process_callback(Callback::status_only(
            "sdk-run-1",
            CallbackStatus::Completed,
            100,
        ))
        .await
        .unwrap();
    deployment.relay.drain().await;

    // Terminal state plus a finished export.
    let session = deployment.session(&outcome.session_id);
    assert_eq!(session.status, SessionStatus::Completed);
    assert_eq!(session.sdk_session_id.as_deref(), Some("sdk-run-1"));
    assert_eq!(session.workspace_export_status, Some(WorkspaceExportStatus::Ready));
    let manifest_key = session.workspace_manifest_key.clone().unwrap();

    // The manifest references keys whose bytes match the workspace.
    let manifest: serde_json::Value =
        serde_json::from_slice(&deployment.blob.get_object(&manifest_key).await.unwrap())
            .unwrap();
    let files = manifest["files"].as_array().unwrap();
    assert!(files.iter().any(|f| f["path"] == "result.txt"));
    for entry in files {
        let exported =
            deployment.blob.get_object(entry["key"].as_str().unwrap()).await.unwrap();
        let original =
            std::fs::read(workspace_path.join(entry["path"].as_str().unwrap())).unwrap();
        assert_eq!(exported, original);
    }

    let archive_key = session.workspace_archive_key.unwrap();
    assert!(deployment.blob.get_object(&archive_key).await.is_ok());
}

#[tokio::test]
async fn executor_rejection_fails_the_run_and_session() {
    let deployment = deployment();
    let outcome = deployment.enqueue("u1", "doomed");
    deployment
        .executor
        .fail_execute
        .store(true, std::sync::atomic::Ordering::SeqCst);

    deployment.puller.poll(None).await;
    deployment.puller.stop().await;

    let run = deployment.run(&outcome.run_id);
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.last_error.as_deref().unwrap_or("").contains("handoff"));
    assert_eq!(deployment.session(&outcome.session_id).status, SessionStatus::Failed);

    // The run is terminal; lease recovery does not resurrect it.
    deployment.clock.advance(std::time::Duration::from_secs(60));
    assert!(deployment.claim(WORKER, 30).is_none());
}
