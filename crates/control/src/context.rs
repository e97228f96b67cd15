// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request-scoped context: the authenticated principal plus tracing ids.
//!
//! Transport middleware fills this from `X-User-Id` / `X-Request-ID` /
//! `X-Trace-ID`; in-process callers build it directly.

/// Principal assumed when no user header is present.
pub const DEFAULT_USER_ID: &str = "default";

#[derive(Debug, Clone)]
pub struct RequestCtx {
    pub user_id: String,
    pub request_id: String,
    pub trace_id: String,
}

impl RequestCtx {
    pub fn new(user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        let user_id =
            if user_id.trim().is_empty() { DEFAULT_USER_ID.to_string() } else { user_id };
        Self {
            user_id,
            request_id: format!("req-{}", nanoid::nanoid!(12)),
            trace_id: format!("trc-{}", nanoid::nanoid!(12)),
        }
    }

    /// Attach transport-provided tracing ids.
    pub fn with_tracing(
        mut self,
        request_id: impl Into<String>,
        trace_id: impl Into<String>,
    ) -> Self {
        self.request_id = request_id.into();
        self.trace_id = trace_id.into();
        self
    }
}

impl Default for RequestCtx {
    fn default() -> Self {
        Self::new(DEFAULT_USER_ID)
    }
}
