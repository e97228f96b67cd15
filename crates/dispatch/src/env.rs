// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the dispatcher.

use std::path::PathBuf;
use std::time::Duration;

/// Dispatcher settings, read once at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub worker_id: String,
    pub workspace_root: PathBuf,
    pub max_concurrent_tasks: usize,
    pub max_executor_containers: usize,
    pub task_claim_lease_seconds: u32,
    pub task_pull_immediate_enabled: bool,
    pub task_pull_scheduled_enabled: bool,
    pub task_pull_nightly_enabled: bool,
    pub task_pull_interval: Duration,
    pub nightly_start_hour: u32,
    pub nightly_start_minute: u32,
    pub nightly_window_minutes: u32,
    pub default_model: String,
    pub callback_base_url: String,
    pub callback_token: String,
    pub internal_api_token: String,
    pub workspace_max_age_hours: u64,
    pub workspace_archive_enabled: bool,
    pub workspace_ignore_dot_files: bool,
    /// Bounded timeouts for external calls.
    pub executor_handoff_timeout: Duration,
    pub executor_cancel_timeout: Duration,
    pub catalog_fetch_timeout: Duration,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            worker_id: default_worker_id(),
            workspace_root: PathBuf::from("/var/lib/relay/workspaces"),
            max_concurrent_tasks: 5,
            max_executor_containers: 10,
            task_claim_lease_seconds: 30,
            task_pull_immediate_enabled: true,
            task_pull_scheduled_enabled: true,
            task_pull_nightly_enabled: true,
            task_pull_interval: Duration::from_secs(2),
            nightly_start_hour: 2,
            nightly_start_minute: 0,
            nightly_window_minutes: 360,
            default_model: String::new(),
            callback_base_url: "http://localhost:8001".to_string(),
            callback_token: String::new(),
            internal_api_token: String::new(),
            workspace_max_age_hours: 24,
            workspace_archive_enabled: true,
            workspace_ignore_dot_files: true,
            executor_handoff_timeout: Duration::from_secs(300),
            executor_cancel_timeout: Duration::from_secs(3),
            catalog_fetch_timeout: Duration::from_secs(30),
        }
    }
}

impl Settings {
    /// Read from `RELAY_*` environment variables, with defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            worker_id: env_string("RELAY_WORKER_ID", &defaults.worker_id),
            workspace_root: PathBuf::from(env_string(
                "RELAY_WORKSPACE_ROOT",
                &defaults.workspace_root.display().to_string(),
            )),
            max_concurrent_tasks: env_usize(
                "RELAY_MAX_CONCURRENT_TASKS",
                defaults.max_concurrent_tasks,
            ),
            max_executor_containers: env_usize(
                "RELAY_MAX_EXECUTOR_CONTAINERS",
                defaults.max_executor_containers,
            ),
            task_claim_lease_seconds: env_u32(
                "RELAY_TASK_CLAIM_LEASE_SECONDS",
                defaults.task_claim_lease_seconds,
            ),
            task_pull_immediate_enabled: env_bool("RELAY_TASK_PULL_IMMEDIATE_ENABLED", true),
            task_pull_scheduled_enabled: env_bool("RELAY_TASK_PULL_SCHEDULED_ENABLED", true),
            task_pull_nightly_enabled: env_bool("RELAY_TASK_PULL_NIGHTLY_ENABLED", true),
            task_pull_interval: Duration::from_secs(
                env_u32("RELAY_TASK_PULL_INTERVAL_SECONDS", 2) as u64
            ),
            nightly_start_hour: env_u32("RELAY_TASK_PULL_NIGHTLY_START_HOUR", 2),
            nightly_start_minute: env_u32("RELAY_TASK_PULL_NIGHTLY_START_MINUTE", 0),
            nightly_window_minutes: env_u32(
                "RELAY_TASK_PULL_NIGHTLY_WINDOW_MINUTES",
                defaults.nightly_window_minutes,
            ),
            default_model: env_string("RELAY_DEFAULT_MODEL", ""),
            callback_base_url: env_string("RELAY_CALLBACK_BASE_URL", &defaults.callback_base_url),
            callback_token: env_string("RELAY_CALLBACK_TOKEN", ""),
            internal_api_token: env_string("RELAY_INTERNAL_API_TOKEN", ""),
            workspace_max_age_hours: env_u32("RELAY_WORKSPACE_MAX_AGE_HOURS", 24) as u64,
            workspace_archive_enabled: env_bool("RELAY_WORKSPACE_ARCHIVE_ENABLED", true),
            workspace_ignore_dot_files: env_bool("RELAY_WORKSPACE_IGNORE_DOT_FILES", true),
            executor_handoff_timeout: defaults.executor_handoff_timeout,
            executor_cancel_timeout: defaults.executor_cancel_timeout,
            catalog_fetch_timeout: defaults.catalog_fetch_timeout,
        }
    }

    /// Callback endpoint handed to executors.
    pub fn callback_url(&self) -> String {
        format!("{}/api/v1/callback", self.callback_base_url.trim_end_matches('/'))
    }

    relay_core::setters! {
        into {
            worker_id: String,
            workspace_root: PathBuf,
            default_model: String,
        }
        set {
            max_concurrent_tasks: usize,
            max_executor_containers: usize,
            task_claim_lease_seconds: u32,
            workspace_ignore_dot_files: bool,
            workspace_archive_enabled: bool,
        }
    }
}

fn default_worker_id() -> String {
    let host = std::env::var("HOSTNAME").unwrap_or_else(|_| "relay".to_string());
    format!("{host}:{}", std::process::id())
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key).ok().filter(|s| !s.is_empty()).unwrap_or_else(|| default.to_string())
}

fn env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|s| s.parse().ok()).unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"),
        Err(_) => default,
    }
}
