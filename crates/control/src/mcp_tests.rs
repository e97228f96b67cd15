// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_support::{ctx, fixture, Fixture};
use crate::ControlError;
use relay_core::{McpServerId, Scope};
use relay_wire::{McpConfigResolveRequest, McpServerCreateRequest};
use serde_json::json;

fn create_server(fx: &Fixture, user: &str, name: &str, config: serde_json::Value) -> McpServerId {
    fx.control
        .create_mcp_server(
            &ctx(user),
            McpServerCreateRequest {
                name: name.into(),
                server_config: config,
                scope: None,
                description: None,
            },
        )
        .unwrap()
        .id
}

fn create_system_server(fx: &Fixture, name: &str) -> McpServerId {
    fx.control
        .create_mcp_server(
            &ctx("admin"),
            McpServerCreateRequest {
                name: name.into(),
                server_config: json!({"mcpServers": {}}),
                scope: Some(Scope::System),
                description: None,
            },
        )
        .unwrap()
        .id
}

#[test]
fn user_record_shadows_system_record() {
    let fx = fixture();
    create_system_server(&fx, "github");
    create_system_server(&fx, "jira");
    let own = create_server(&fx, "u1", "github", json!({"mcpServers": {}}));

    let visible = fx.control.list_mcp_servers(&ctx("u1")).unwrap();
    let names: Vec<_> = visible.iter().map(|s| (s.name.as_str(), s.scope)).collect();
    assert!(names.contains(&("jira", Scope::System)));
    assert!(names.contains(&("github", Scope::User)));
    assert_eq!(names.iter().filter(|(n, _)| *n == "github").count(), 1);
    assert!(visible.iter().any(|s| s.id == own));

    // Another user still sees the system github.
    let other = fx.control.list_mcp_servers(&ctx("u2")).unwrap();
    assert!(other.iter().any(|s| s.name == "github" && s.scope == Scope::System));
}

#[test]
fn duplicate_name_conflicts() {
    let fx = fixture();
    create_server(&fx, "u1", "github", json!({}));
    let err = fx
        .control
        .create_mcp_server(
            &ctx("u1"),
            McpServerCreateRequest {
                name: "github".into(),
                server_config: json!({}),
                scope: None,
                description: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ControlError::Conflict(_)));
}

#[test]
fn invalid_name_rejected() {
    let fx = fixture();
    let err = fx
        .control
        .create_mcp_server(
            &ctx("u1"),
            McpServerCreateRequest {
                name: "../etc".into(),
                server_config: json!({}),
                scope: None,
                description: None,
            },
        )
        .unwrap_err();
    assert!(matches!(err, ControlError::BadRequest(_)));
}

#[test]
fn install_is_idempotent_and_resurrectable() {
    let fx = fixture();
    let ctx = ctx("u1");
    let id = create_server(&fx, "u1", "github", json!({"mcpServers": {}}));

    let first = fx.control.install_mcp_server(&ctx, &id, true).unwrap();
    let second = fx.control.install_mcp_server(&ctx, &id, false).unwrap();
    assert_eq!(first.created_at_ms, second.created_at_ms);
    assert!(!second.enabled);

    fx.control.uninstall_mcp_server(&ctx, &id).unwrap();
    assert!(fx.control.list_mcp_installs(&ctx).unwrap().is_empty());

    // Resurrect after delete.
    let revived = fx.control.install_mcp_server(&ctx, &id, true).unwrap();
    assert!(revived.enabled);
}

#[test]
fn resolve_merges_in_caller_order() {
    let fx = fixture();
    let ctx = ctx("u1");
    let a = create_server(
        &fx,
        "u1",
        "alpha",
        json!({"mcpServers": {"search": {"command": "alpha-bin"}, "alpha": {"command": "a"}}}),
    );
    let b = create_server(
        &fx,
        "u1",
        "beta",
        json!({"mcpServers": {"search": {"command": "beta-bin"}}}),
    );
    fx.control.install_mcp_server(&ctx, &a, true).unwrap();
    fx.control.install_mcp_server(&ctx, &b, true).unwrap();

    let resolved = fx
        .control
        .resolve_mcp_config(
            &ctx,
            McpConfigResolveRequest {
                server_ids: vec![a.to_string(), b.to_string(), a.to_string()],
            },
        )
        .unwrap();
    // Later entries win on duplicate names; duplicate ids are ignored.
    assert_eq!(resolved["search"], json!({"command": "beta-bin"}));
    assert_eq!(resolved["alpha"], json!({"command": "a"}));
}

#[test]
fn resolve_skips_uninstalled_and_unknown_ids() {
    let fx = fixture();
    let ctx = ctx("u1");
    let installed =
        create_server(&fx, "u1", "alpha", json!({"mcpServers": {"alpha": {"command": "a"}}}));
    let not_installed =
        create_server(&fx, "u1", "beta", json!({"mcpServers": {"beta": {"command": "b"}}}));
    fx.control.install_mcp_server(&ctx, &installed, true).unwrap();

    let resolved = fx
        .control
        .resolve_mcp_config(
            &ctx,
            McpConfigResolveRequest {
                server_ids: vec![
                    installed.to_string(),
                    not_installed.to_string(),
                    "mcp-deleted-long-ago".to_string(),
                ],
            },
        )
        .unwrap();
    assert_eq!(resolved.len(), 1);
    assert!(resolved.contains_key("alpha"));
}

#[test]
fn resolve_empty_ids_is_empty() {
    let fx = fixture();
    let resolved = fx
        .control
        .resolve_mcp_config(&ctx("u1"), McpConfigResolveRequest { server_ids: vec![] })
        .unwrap();
    assert!(resolved.is_empty());
}

#[test]
fn deleting_server_cascades_installs() {
    let fx = fixture();
    let ctx = ctx("u1");
    let id = create_server(&fx, "u1", "github", json!({"mcpServers": {}}));
    fx.control.install_mcp_server(&ctx, &id, true).unwrap();
    fx.control.delete_mcp_server(&ctx, &id).unwrap();
    assert!(fx.control.list_mcp_installs(&ctx).unwrap().is_empty());
}
