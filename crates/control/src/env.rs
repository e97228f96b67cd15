// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the control plane.

use std::path::PathBuf;

/// Resolve the state directory: RELAY_STATE_DIR > XDG_STATE_HOME/relay >
/// ~/.local/state/relay.
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("RELAY_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("relay"));
    }
    std::env::var("HOME").ok().map(|home| PathBuf::from(home).join(".local/state/relay"))
}

/// Shared token guarding the internal resolution surface. Empty means
/// the guard is disabled (local development).
pub fn internal_api_token() -> Option<String> {
    std::env::var("RELAY_INTERNAL_API_TOKEN").ok().filter(|s| !s.is_empty())
}

pub(crate) fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

pub(crate) fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}
