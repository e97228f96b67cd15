// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_support::{ctx, fixture};
use crate::ControlError;
use relay_wire::{SubAgentCreateRequest, SubAgentResolveRequest, SubAgentUpdateRequest};

fn structured_request(name: &str) -> SubAgentCreateRequest {
    SubAgentCreateRequest {
        name: name.into(),
        enabled: true,
        mode: Some("structured".into()),
        description: Some("finds things".into()),
        prompt: Some("You research.".into()),
        tools: Some(vec!["Read".into(), "Grep".into()]),
        model: Some("sonnet".into()),
        raw_markdown: None,
    }
}

fn raw_request(name: &str, front_matter_name: &str) -> SubAgentCreateRequest {
    SubAgentCreateRequest {
        name: name.into(),
        enabled: true,
        mode: Some("raw".into()),
        description: None,
        prompt: None,
        tools: None,
        model: None,
        raw_markdown: Some(format!("---\nname: {front_matter_name}\n---\nYou are raw.\n")),
    }
}

#[test]
fn structured_create_requires_description_and_prompt() {
    let fx = fixture();
    let mut request = structured_request("helper");
    request.prompt = Some("   ".into());
    let err = fx.control.create_subagent(&ctx("u1"), request).unwrap_err();
    assert!(matches!(err, ControlError::BadRequest(_)));
}

#[test]
fn raw_create_validates_front_matter_name() {
    let fx = fixture();
    let err = fx
        .control
        .create_subagent(&ctx("u1"), raw_request("helper", "other-name"))
        .unwrap_err();
    assert!(matches!(err, ControlError::BadRequest(_)));

    let view = fx.control.create_subagent(&ctx("u1"), raw_request("helper", "helper")).unwrap();
    assert_eq!(view.mode, relay_core::SubAgentMode::Raw);
}

#[test]
fn raw_create_without_front_matter_rejected() {
    let fx = fixture();
    let mut request = raw_request("helper", "helper");
    request.raw_markdown = Some("no front matter here".into());
    let err = fx.control.create_subagent(&ctx("u1"), request).unwrap_err();
    assert!(matches!(err, ControlError::BadRequest(_)));
}

#[test]
fn unknown_model_is_dropped() {
    let fx = fixture();
    let mut request = structured_request("helper");
    request.model = Some("gpt-9".into());
    let view = fx.control.create_subagent(&ctx("u1"), request).unwrap();
    assert!(view.model.is_none());
}

#[test]
fn mode_switch_revalidates() {
    let fx = fixture();
    let ctx = ctx("u1");
    let view = fx.control.create_subagent(&ctx, structured_request("helper")).unwrap();

    // Switching to raw without a document must fail.
    let err = fx
        .control
        .update_subagent(
            &ctx,
            &view.id,
            SubAgentUpdateRequest { mode: Some("raw".into()), ..Default::default() },
        )
        .unwrap_err();
    assert!(matches!(err, ControlError::BadRequest(_)));

    // With a matching document it succeeds and drops the prompt.
    let updated = fx
        .control
        .update_subagent(
            &ctx,
            &view.id,
            SubAgentUpdateRequest {
                mode: Some("raw".into()),
                raw_markdown: Some("---\nname: helper\n---\nbody\n".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(updated.mode, relay_core::SubAgentMode::Raw);
    assert!(updated.prompt.is_none());
}

#[test]
fn resolve_defaults_to_all_enabled() {
    let fx = fixture();
    let ctx = ctx("u1");
    fx.control.create_subagent(&ctx, structured_request("one")).unwrap();
    let mut disabled = structured_request("two");
    disabled.enabled = false;
    fx.control.create_subagent(&ctx, disabled).unwrap();
    fx.control.create_subagent(&ctx, raw_request("three", "three")).unwrap();

    let resolution =
        fx.control.resolve_subagents(&ctx, SubAgentResolveRequest::default()).unwrap();
    assert!(resolution.structured_agents.contains_key("one"));
    assert!(!resolution.structured_agents.contains_key("two"));
    assert!(resolution.raw_agents.contains_key("three"));

    let definition = &resolution.structured_agents["one"];
    assert_eq!(definition.model.as_deref(), Some("sonnet"));
    assert_eq!(definition.tools.as_deref(), Some(&["Read".to_string(), "Grep".to_string()][..]));
}

#[test]
fn resolve_explicit_ids_are_verbatim() {
    let fx = fixture();
    let ctx = ctx("u1");
    let one = fx.control.create_subagent(&ctx, structured_request("one")).unwrap();
    fx.control.create_subagent(&ctx, structured_request("other")).unwrap();

    let resolution = fx
        .control
        .resolve_subagents(
            &ctx,
            SubAgentResolveRequest {
                subagent_ids: Some(vec![one.id.to_string(), "sub-unknown".to_string()]),
            },
        )
        .unwrap();
    assert_eq!(resolution.structured_agents.len(), 1);
    assert!(resolution.structured_agents.contains_key("one"));
}

#[test]
fn resolve_empty_list_resolves_nothing() {
    let fx = fixture();
    let ctx = ctx("u1");
    fx.control.create_subagent(&ctx, structured_request("one")).unwrap();
    let resolution = fx
        .control
        .resolve_subagents(&ctx, SubAgentResolveRequest { subagent_ids: Some(vec![]) })
        .unwrap();
    assert!(resolution.structured_agents.is_empty());
    assert!(resolution.raw_agents.is_empty());
}

#[test]
fn duplicate_names_conflict() {
    let fx = fixture();
    let ctx = ctx("u1");
    fx.control.create_subagent(&ctx, structured_request("helper")).unwrap();
    let err = fx.control.create_subagent(&ctx, structured_request("helper")).unwrap_err();
    assert!(matches!(err, ControlError::Conflict(_)));
}
