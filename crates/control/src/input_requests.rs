// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User input requests: blocking agent-to-user prompts.
//!
//! Created through the internal surface (executor → dispatcher → here),
//! answered by the user, expired by timeout or session cancel.

use crate::context::RequestCtx;
use crate::error::ControlError;
use crate::Control;
use relay_core::{Clock, Event, UserInputRequest, UserInputRequestId};
use relay_wire::{InputRequestAnswerRequest, InputRequestCreateRequest, InputRequestView};

/// Default time a pending request stays answerable.
pub const DEFAULT_INPUT_TTL_SECONDS: u64 = 300;

impl<C: Clock> Control<C> {
    /// Create a pending request for a session (internal surface; the
    /// session id may be the executor's SDK id).
    pub fn create_input_request(
        &self,
        request: InputRequestCreateRequest,
    ) -> Result<InputRequestView, ControlError> {
        let now = self.epoch_ms();
        let ttl = request.ttl_seconds.unwrap_or(DEFAULT_INPUT_TTL_SECONDS).max(1);
        self.store.transact(now, |state| {
            let session = state.session_by_id_or_sdk(&request.session_id).ok_or_else(|| {
                ControlError::not_found(format!("Session not found: {}", request.session_id))
            })?;
            if session.status.is_canceled() {
                return Err(ControlError::conflict("Session is canceled"));
            }
            let record = UserInputRequest::new(
                session.id,
                request.payload.clone(),
                now + ttl * 1_000,
                now,
            );
            let view = InputRequestView::from(&record);
            Ok((vec![Event::InputRequestCreated { request: record }], view))
        })
    }

    /// Fetch a request, lazily expiring it when past its deadline.
    pub fn get_input_request(
        &self,
        request_id: &UserInputRequestId,
    ) -> Result<InputRequestView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let record = state.input_requests.get(request_id).ok_or_else(|| {
                ControlError::not_found(format!("Input request not found: {request_id}"))
            })?;

            if record.status == relay_core::InputRequestStatus::Pending
                && now >= record.expires_at_ms
            {
                let mut expired = record.clone();
                expired.expire(now);
                let view = InputRequestView::from(&expired);
                return Ok((vec![Event::InputRequestExpired { id: record.id, at_ms: now }], view));
            }
            Ok((Vec::new(), InputRequestView::from(record)))
        })
    }

    /// Answer a pending request (public surface; caller must own the
    /// session).
    pub fn answer_input_request(
        &self,
        ctx: &RequestCtx,
        request_id: &UserInputRequestId,
        request: InputRequestAnswerRequest,
    ) -> Result<InputRequestView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let record = state.input_requests.get(request_id).ok_or_else(|| {
                ControlError::not_found(format!("Input request not found: {request_id}"))
            })?;
            let owns = state
                .sessions
                .get(&record.session_id)
                .is_some_and(|s| s.user_id == ctx.user_id);
            if !owns {
                return Err(ControlError::forbidden("Session does not belong to the user"));
            }
            if !record.is_open(now) {
                return Err(ControlError::conflict(format!(
                    "Input request is {}",
                    record.status
                )));
            }

            let mut answered = record.clone();
            answered.answer(request.answer.clone());
            let view = InputRequestView::from(&answered);
            Ok((
                vec![Event::InputRequestAnswered { id: record.id, answer: request.answer.clone() }],
                view,
            ))
        })
    }

    /// Pending requests for a session (UI polling).
    pub fn list_pending_input_requests(
        &self,
        _ctx: &RequestCtx,
        session_id: &relay_core::SessionId,
    ) -> Result<Vec<InputRequestView>, ControlError> {
        Ok(self.store.read(|state| {
            let mut pending = state.pending_inputs_for_session(session_id);
            pending.sort_by_key(|r| r.created_at_ms);
            pending.into_iter().map(InputRequestView::from).collect()
        }))
    }
}

#[cfg(test)]
#[path = "input_requests_tests.rs"]
mod tests;
