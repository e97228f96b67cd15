// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronous agent-to-user prompts.
//!
//! Created by the executor via the dispatcher, answered by the user,
//! expired on timeout or session cancel.

use crate::session::SessionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Unique identifier for a user input request.
    pub struct UserInputRequestId("uir-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputRequestStatus {
    Pending,
    Answered,
    Expired,
}

crate::simple_display! {
    InputRequestStatus {
        Pending => "pending",
        Answered => "answered",
        Expired => "expired",
    }
}

/// A blocking prompt from the agent to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInputRequest {
    pub id: UserInputRequestId,
    pub session_id: SessionId,
    pub status: InputRequestStatus,
    pub expires_at_ms: u64,
    /// Opaque prompt payload (question text, options, ...).
    pub payload: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Value>,
    pub created_at_ms: u64,
}

impl UserInputRequest {
    pub fn new(session_id: SessionId, payload: Value, expires_at_ms: u64, epoch_ms: u64) -> Self {
        Self {
            id: UserInputRequestId::new(),
            session_id,
            status: InputRequestStatus::Pending,
            expires_at_ms,
            payload,
            answer: None,
            created_at_ms: epoch_ms,
        }
    }

    /// Whether the request still accepts an answer at `now`.
    pub fn is_open(&self, now_ms: u64) -> bool {
        self.status == InputRequestStatus::Pending && now_ms < self.expires_at_ms
    }

    pub fn answer(&mut self, answer: Value) {
        self.status = InputRequestStatus::Answered;
        self.answer = Some(answer);
    }

    /// Expire immediately (timeout sweep or session cancel).
    pub fn expire(&mut self, epoch_ms: u64) {
        self.status = InputRequestStatus::Expired;
        self.expires_at_ms = epoch_ms;
    }
}

crate::builder! {
    pub struct UserInputRequestBuilder => UserInputRequest {
        into {
            id: UserInputRequestId = "uir-test",
            session_id: SessionId = "ses-test",
        }
        set {
            status: InputRequestStatus = InputRequestStatus::Pending,
            expires_at_ms: u64 = 2_000_000,
            payload: Value = serde_json::json!({"question": "continue?"}),
            created_at_ms: u64 = 1_000_000,
        }
        option {
            answer: Value = None,
        }
    }
}

#[cfg(test)]
#[path = "input_request_tests.rs"]
mod tests;
