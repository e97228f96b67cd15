// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Transcript, tool execution, usage, and input-request event handlers.

use super::MaterializedState;
use relay_core::{tool_key, Event, ToolExecution};

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::MessageAppended { message } => {
            state.messages.entry(message.session_id).or_default().push(message.clone());
        }

        Event::ToolUseRecorded {
            id,
            session_id,
            message_id,
            tool_use_id,
            tool_name,
            tool_input,
            at_ms,
        } => {
            let key = tool_key(session_id, tool_use_id);
            match state.tool_executions.get_mut(&key) {
                Some(existing) => {
                    // A placeholder created by an early result; fill in
                    // the real name and input.
                    existing.tool_name = tool_name.clone();
                    existing.tool_input = tool_input.clone();
                    existing.message_id = Some(*message_id);
                }
                None => {
                    let mut execution = ToolExecution::from_use(
                        *session_id,
                        *message_id,
                        tool_use_id.clone(),
                        tool_name.clone(),
                        tool_input.clone(),
                        *at_ms,
                    );
                    execution.id = *id;
                    state.tool_executions.insert(key, execution);
                }
            }
        }

        Event::ToolResultRecorded {
            id,
            session_id,
            result_message_id,
            tool_use_id,
            content,
            is_error,
            at_ms,
        } => {
            let key = tool_key(session_id, tool_use_id);
            match state.tool_executions.get_mut(&key) {
                Some(existing) => {
                    existing.complete(*result_message_id, content.clone(), *is_error, *at_ms);
                }
                None => {
                    let mut execution = ToolExecution::placeholder_from_result(
                        *session_id,
                        *result_message_id,
                        tool_use_id.clone(),
                        content.clone(),
                        *is_error,
                        *at_ms,
                    );
                    execution.id = *id;
                    state.tool_executions.insert(key, execution);
                }
            }
        }

        Event::ToolCanceled { session_id, tool_use_id, reason, at_ms } => {
            let key = tool_key(session_id, tool_use_id);
            if let Some(execution) = state.tool_executions.get_mut(&key) {
                if !execution.is_finished() {
                    execution.cancel(reason.as_deref(), *at_ms);
                }
            }
        }

        Event::UsageRecorded { usage } => {
            state.usage_logs.entry(usage.session_id).or_default().push(usage.clone());
        }

        Event::InputRequestCreated { request } => {
            state.input_requests.insert(request.id, request.clone());
        }

        Event::InputRequestAnswered { id, answer } => {
            if let Some(request) = state.input_requests.get_mut(id) {
                request.answer(answer.clone());
            }
        }

        Event::InputRequestExpired { id, at_ms } => {
            if let Some(request) = state.input_requests.get_mut(id) {
                request.expire(*at_ms);
            }
        }

        _ => {}
    }
}
