// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The executor's default model must be unoverridable via slash-command
//! front matter: every rendered command is free of `model:` keys.

use super::support::deployment;
use relay_wire::{SlashCommandCreateRequest, SlashCommandResolveRequest};

#[test]
fn raw_command_model_keys_are_stripped_on_resolve() {
    let deployment = deployment();
    let ctx = deployment.ctx("u1");
    deployment
        .control
        .create_slash_command(
            &ctx,
            SlashCommandCreateRequest {
                name: "review".into(),
                enabled: true,
                mode: Some("raw".into()),
                content: None,
                allowed_tools: None,
                description: None,
                argument_hint: None,
                raw_markdown: Some(
                    "---\nmodel: opus\nallowed-tools: Read\nmodel: |\n  opus-2024\n  fallback\ndescription: Reviews code\n---\nReview the diff.\n"
                        .into(),
                ),
            },
        )
        .unwrap();

    let rendered = deployment
        .control
        .resolve_slash_commands(&ctx, SlashCommandResolveRequest::default())
        .unwrap();
    let markdown = &rendered["review"];

    assert!(!markdown.contains("model:"));
    assert!(!markdown.contains("opus-2024"));
    assert!(!markdown.contains("fallback"));
    assert!(markdown.contains("allowed-tools: Read"));
    assert!(markdown.contains("description: Reviews code"));
    assert!(markdown.contains("Review the diff."));
}

#[test]
fn structured_commands_never_emit_model_keys() {
    let deployment = deployment();
    let ctx = deployment.ctx("u1");
    deployment
        .control
        .create_slash_command(
            &ctx,
            SlashCommandCreateRequest {
                name: "ship".into(),
                enabled: true,
                mode: Some("structured".into()),
                content: Some("Ship it.".into()),
                allowed_tools: Some("Bash".into()),
                description: Some("ships".into()),
                argument_hint: None,
                raw_markdown: None,
            },
        )
        .unwrap();

    let rendered = deployment
        .control
        .resolve_slash_commands(&ctx, SlashCommandResolveRequest::default())
        .unwrap();
    assert!(!rendered["ship"].contains("model"));
}
