// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Token/cost usage records, emitted from executor result messages.

use crate::run::RunId;
use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Unique identifier for a usage log entry.
    pub struct UsageLogId("usg-");
}

/// One append-only usage record. Cost aggregation lives elsewhere.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageLog {
    pub id: UsageLogId,
    pub session_id: SessionId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<RunId>,
    #[serde(default)]
    pub total_cost_usd: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Raw usage payload from the result message (token counts etc.).
    pub usage: Value,
    pub created_at_ms: u64,
}

impl UsageLog {
    /// Build a usage record from a `ResultMessage` payload. Returns None
    /// when the message carries no usage object.
    pub fn from_result_message(
        session_id: SessionId,
        run_id: Option<RunId>,
        message: &Value,
        epoch_ms: u64,
    ) -> Option<Self> {
        let usage = message.get("usage").filter(|v| v.is_object())?;
        let total_cost_usd = message
            .get("total_cost_usd")
            .and_then(Value::as_f64)
            .or_else(|| usage.get("total_cost_usd").and_then(Value::as_f64))
            .unwrap_or(0.0);
        let duration_ms = message
            .get("duration_ms")
            .and_then(Value::as_u64)
            .or_else(|| usage.get("duration_ms").and_then(Value::as_u64));
        Some(Self {
            id: UsageLogId::new(),
            session_id,
            run_id,
            total_cost_usd,
            duration_ms,
            usage: usage.clone(),
            created_at_ms: epoch_ms,
        })
    }
}

#[cfg(test)]
#[path = "usage_tests.rs"]
mod tests;
