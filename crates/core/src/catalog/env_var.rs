// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment variable records.
//!
//! System-scoped vars may be declared-but-unset (empty value); user vars
//! always carry a non-empty value. Values never appear in public DTOs,
//! only the derived `is_set` flag.

use super::Scope;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for an environment variable record.
    pub struct EnvVarId("env-");
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvVar {
    pub id: EnvVarId,
    pub user_id: String,
    pub key: String,
    /// Stored through the deployment's value codec; empty means
    /// declared-but-unset.
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub scope: Scope,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl EnvVar {
    /// Whether the variable resolves to a usable value. Unset vars are
    /// excluded from env maps so missing secrets fail loudly downstream.
    pub fn is_set(&self) -> bool {
        !self.value.trim().is_empty()
    }
}

crate::builder! {
    pub struct EnvVarBuilder => EnvVar {
        into {
            id: EnvVarId = "env-test",
            user_id: String = "u1",
            key: String = "API_KEY",
            value: String = "secret",
        }
        set {
            scope: Scope = Scope::User,
            created_at_ms: u64 = 1_000_000,
            updated_at_ms: u64 = 1_000_000,
        }
        option {
            description: String = None,
        }
    }
}
