// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn effective_model_filters_unknown_values() {
    let mut agent = SubAgent::builder().model("opus").build();
    assert_eq!(agent.effective_model(), Some("opus"));
    agent.model = Some("gpt-5".to_string());
    assert_eq!(agent.effective_model(), None);
    agent.model = None;
    assert_eq!(agent.effective_model(), None);
}

#[test]
fn normalize_tools_dedups_and_trims() {
    let tools = vec![
        " Read ".to_string(),
        "Read".to_string(),
        "".to_string(),
        "Bash".to_string(),
    ];
    assert_eq!(
        normalize_tools(Some(&tools)),
        Some(vec!["Read".to_string(), "Bash".to_string()])
    );
}

#[test]
fn normalize_tools_caps_length() {
    let tools: Vec<String> = (0..100).map(|i| format!("tool{i}")).collect();
    let normalized = normalize_tools(Some(&tools)).unwrap();
    assert_eq!(normalized.len(), MAX_SUBAGENT_TOOLS);
}

#[test]
fn normalize_tools_empty_is_none() {
    assert_eq!(normalize_tools(None), None);
    assert_eq!(normalize_tools(Some(&[])), None);
    assert_eq!(normalize_tools(Some(&["  ".to_string()])), None);
}
