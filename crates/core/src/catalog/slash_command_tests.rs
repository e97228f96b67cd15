// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn structured_render_builds_front_matter() {
    let cmd = SlashCommand::builder()
        .allowed_tools("Bash(git:*)")
        .description("Deploy \"prod\"")
        .argument_hint("[env]")
        .content("Do the thing.")
        .build();
    let rendered = cmd.render();
    assert_eq!(
        rendered,
        "---\nallowed-tools: \"Bash(git:*)\"\ndescription: \"Deploy \\\"prod\\\"\"\nargument-hint: \"[env]\"\n---\n\nDo the thing.\n"
    );
}

#[test]
fn structured_render_without_front_matter_is_bare_body() {
    let cmd = SlashCommand::builder().content("Just body.\n\n").build();
    assert_eq!(cmd.render(), "Just body.\n");
}

#[test]
fn raw_render_strips_model_key() {
    let cmd = SlashCommand::builder()
        .mode(SlashCommandMode::Raw)
        .raw_markdown("---\nmodel: opus\ndescription: keep\n---\nbody\n")
        .build();
    let rendered = cmd.render();
    assert!(!rendered.contains("model"));
    assert!(rendered.contains("description: keep"));
}

#[test]
fn raw_render_with_no_markdown_is_empty() {
    let cmd = SlashCommand::builder().mode(SlashCommandMode::Raw).build();
    assert_eq!(cmd.render(), "");
}
