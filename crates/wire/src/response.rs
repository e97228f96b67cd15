// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The shared response envelope.

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};

/// `{code, message, data}` wrapper shared by every response. `code = 0`
/// is success; error codes come from [`ErrorKind::code`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub code: u32,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self { code: 0, message: "ok".to_string(), data: Some(data) }
    }

    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self { code: kind.code(), message: message.into(), data: None }
    }

    pub fn is_ok(&self) -> bool {
        self.code == 0
    }
}

impl Envelope<()> {
    pub fn ok_empty() -> Self {
        Self { code: 0, message: "ok".to_string(), data: None }
    }
}
