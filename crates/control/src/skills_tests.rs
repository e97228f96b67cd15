// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_support::{ctx, fixture, Fixture};
use crate::ControlError;
use relay_core::{Scope, SkillId};
use relay_wire::{SkillConfigResolveRequest, SkillCreateRequest, SkillUpdateRequest};
use serde_json::json;

fn create_skill(fx: &Fixture, user: &str, name: &str, entry: serde_json::Value) -> SkillId {
    fx.control
        .create_skill(
            &ctx(user),
            SkillCreateRequest { name: name.into(), entry, scope: None },
        )
        .unwrap()
        .id
}

#[test]
fn visibility_shadows_system_by_name() {
    let fx = fixture();
    fx.control
        .create_skill(
            &ctx("admin"),
            SkillCreateRequest {
                name: "summarize".into(),
                entry: json!({"s3_key": "skills/system/summarize/"}),
                scope: Some(Scope::System),
            },
        )
        .unwrap();
    create_skill(&fx, "u1", "summarize", json!({"s3_key": "skills/u1/summarize/"}));

    let visible = fx.control.list_skills(&ctx("u1")).unwrap();
    assert_eq!(visible.iter().filter(|s| s.name == "summarize").count(), 1);
    assert_eq!(
        visible.iter().find(|s| s.name == "summarize").map(|s| s.scope),
        Some(Scope::User)
    );
}

#[test]
fn system_skills_cannot_be_modified() {
    let fx = fixture();
    let system = fx
        .control
        .create_skill(
            &ctx("admin"),
            SkillCreateRequest {
                name: "shared".into(),
                entry: json!({}),
                scope: Some(Scope::System),
            },
        )
        .unwrap();

    let err = fx
        .control
        .update_skill(
            &ctx("u1"),
            &system.id,
            SkillUpdateRequest { name: None, entry: Some(json!({"s3_key": "x"})) },
        )
        .unwrap_err();
    assert!(matches!(err, ControlError::Forbidden(_)));

    let err = fx.control.delete_skill(&ctx("u1"), &system.id).unwrap_err();
    assert!(matches!(err, ControlError::Forbidden(_)));
}

#[test]
fn resolve_returns_stageable_entries_for_installed_skills() {
    let fx = fixture();
    let ctx = ctx("u1");
    let prefix_skill =
        create_skill(&fx, "u1", "docs", json!({"s3_key": "skills/u1/docs/v1/", "is_prefix": true}));
    let file_skill = create_skill(&fx, "u1", "single", json!({"s3_key": "skills/u1/single/tool.md"}));
    let uninstalled = create_skill(&fx, "u1", "ghost", json!({"s3_key": "skills/u1/ghost/"}));

    fx.control.install_skill(&ctx, &prefix_skill, true).unwrap();
    fx.control.install_skill(&ctx, &file_skill, true).unwrap();

    let resolved = fx
        .control
        .resolve_skill_config(
            &ctx,
            SkillConfigResolveRequest {
                skill_ids: vec![
                    prefix_skill.to_string(),
                    file_skill.to_string(),
                    uninstalled.to_string(),
                ],
            },
        )
        .unwrap();

    assert_eq!(resolved.len(), 2);
    assert!(resolved["docs"].is_prefix);
    assert_eq!(resolved["docs"].s3_key.as_deref(), Some("skills/u1/docs/v1/"));
    assert!(!resolved["single"].is_prefix);
    assert!(!resolved.contains_key("ghost"));
}

#[test]
fn trailing_slash_key_counts_as_prefix() {
    let fx = fixture();
    let ctx = ctx("u1");
    let skill = create_skill(&fx, "u1", "docs", json!({"s3_key": "skills/u1/docs/v1/"}));
    fx.control.install_skill(&ctx, &skill, true).unwrap();

    let resolved = fx
        .control
        .resolve_skill_config(
            &ctx,
            SkillConfigResolveRequest { skill_ids: vec![skill.to_string()] },
        )
        .unwrap();
    assert!(resolved["docs"].is_prefix);
}

#[test]
fn rename_checks_conflicts() {
    let fx = fixture();
    create_skill(&fx, "u1", "one", json!({}));
    let two = create_skill(&fx, "u1", "two", json!({}));
    let err = fx
        .control
        .update_skill(
            &ctx("u1"),
            &two,
            SkillUpdateRequest { name: Some("one".into()), entry: None },
        )
        .unwrap_err();
    assert!(matches!(err, ControlError::Conflict(_)));
}
