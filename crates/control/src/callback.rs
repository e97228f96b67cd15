// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The callback processor: applies one streaming executor update to the
//! session/run/transcript/usage state graph in a single commit.

use crate::error::ControlError;
use crate::Control;
use relay_core::{
    is_result_message, parse_blocks, AgentMessage, Callback, CallbackStatus, Clock, ContentBlock,
    Event, RunStatus, SessionStatus, ToolExecutionId, UsageLog, WorkspaceExportStatus,
};
use relay_wire::CallbackAck;
use serde_json::Value;

impl<C: Clock> Control<C> {
    /// Process a callback from the executor (relayed by the dispatcher).
    ///
    /// Unknown sessions are acknowledged without side effects: the
    /// executor may emit before the session row is visible here. Canceled
    /// sessions discard everything: cancel is a fence.
    pub fn process_callback(&self, callback: Callback) -> Result<CallbackAck, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |state| {
            let Some(session) = state.session_by_id_or_sdk(&callback.session_id) else {
                tracing::warn!(session = %callback.session_id, "session not found for callback");
                return Ok((Vec::new(), CallbackAck::received(callback.session_id.clone())));
            };

            if session.status.is_canceled() {
                tracing::info!(
                    session = %session.id,
                    status = %callback.status,
                    "discarding callback for canceled session"
                );
                return Ok((
                    Vec::new(),
                    CallbackAck {
                        status: "discarded".to_string(),
                        session_id: session.id.to_string(),
                        callback_status: Some(callback.status),
                        progress: Some(callback.progress.min(100)),
                    },
                ));
            }

            let session_id = session.id;
            let mut events = Vec::new();

            // Write through the SDK session id as soon as we learn it.
            if let Some(sdk_id) = incoming_sdk_session_id(&callback) {
                if session.sdk_session_id.as_deref() != Some(sdk_id) {
                    events.push(Event::SessionSdkLinked {
                        id: session_id,
                        sdk_session_id: sdk_id.to_string(),
                    });
                }
            }

            if callback.status.is_terminal() {
                let status = match callback.status {
                    CallbackStatus::Completed => SessionStatus::Completed,
                    _ => SessionStatus::Failed,
                };
                events.push(Event::SessionStatusChanged { id: session_id, status, at_ms: now });
                // The async export starts right after; show the spinner
                // unless this callback already carries an export result.
                if callback.workspace_export_status.is_none() {
                    events.push(Event::SessionExportUpdated {
                        id: session_id,
                        status: Some(WorkspaceExportStatus::Pending),
                        files_prefix: None,
                        manifest_key: None,
                        archive_key: None,
                    });
                }
            }

            if let Some(patch) = &callback.state_patch {
                events.push(Event::SessionStateReplaced {
                    id: session_id,
                    state: patch.clone(),
                    at_ms: now,
                });
            }

            if callback.workspace_export_status.is_some()
                || callback.workspace_files_prefix.is_some()
                || callback.workspace_manifest_key.is_some()
                || callback.workspace_archive_key.is_some()
            {
                events.push(Event::SessionExportUpdated {
                    id: session_id,
                    status: callback.workspace_export_status,
                    files_prefix: callback.workspace_files_prefix.clone(),
                    manifest_key: callback.workspace_manifest_key.clone(),
                    archive_key: callback.workspace_archive_key.clone(),
                });
            }

            let active_run = state.latest_nonterminal_run(&session_id).map(|r| r.clone());

            if let Some(payload) = &callback.new_message {
                let message = AgentMessage::from_payload(session_id, payload.clone(), now);
                let message_id = message.id;

                for block in parse_blocks(&message.content) {
                    match block {
                        ContentBlock::ToolUse { id, name, input } => {
                            events.push(Event::ToolUseRecorded {
                                id: ToolExecutionId::new(),
                                session_id,
                                message_id,
                                tool_use_id: id,
                                tool_name: name,
                                tool_input: input,
                                at_ms: now,
                            });
                        }
                        ContentBlock::ToolResult { tool_use_id, content, is_error } => {
                            events.push(Event::ToolResultRecorded {
                                id: ToolExecutionId::new(),
                                session_id,
                                result_message_id: message_id,
                                tool_use_id,
                                content,
                                is_error,
                                at_ms: now,
                            });
                        }
                        ContentBlock::Text { .. } => {}
                    }
                }

                if is_result_message(&message.content) {
                    if let Some(usage) = UsageLog::from_result_message(
                        session_id,
                        active_run.as_ref().map(|r| r.id),
                        &message.content,
                        now,
                    ) {
                        events.push(Event::UsageRecorded { usage });
                    }
                }

                events.push(Event::MessageAppended { message });
            }

            // Run transitions ride on the newest non-terminal run.
            if let Some(run) = &active_run {
                events.push(Event::RunProgress { id: run.id, progress: callback.progress.min(100) });
                match callback.status {
                    CallbackStatus::Running => {
                        events.push(Event::RunStarted { id: run.id, at_ms: now });
                    }
                    CallbackStatus::Completed | CallbackStatus::Failed => {
                        let status = if callback.status == CallbackStatus::Completed {
                            RunStatus::Completed
                        } else {
                            RunStatus::Failed
                        };
                        events.push(Event::RunFinished {
                            id: run.id,
                            status,
                            error: None,
                            at_ms: now,
                        });
                        if let Some(task_id) = run.scheduled_task_id {
                            events.push(Event::ScheduledTaskRunMirrored {
                                id: task_id,
                                run_id: run.id,
                                status,
                                error: None,
                            });
                        }
                    }
                    CallbackStatus::Accepted => {}
                }
            }

            tracing::debug!(
                session = %session_id,
                status = %callback.status,
                progress = callback.progress,
                events = events.len(),
                "callback processed"
            );

            Ok((
                events,
                CallbackAck {
                    status: "received".to_string(),
                    session_id: session_id.to_string(),
                    callback_status: Some(callback.status),
                    progress: Some(callback.progress.min(100)),
                },
            ))
        })
    }
}

/// The SDK session id carried directly on the callback, or inside an
/// init-style system message.
fn incoming_sdk_session_id(callback: &Callback) -> Option<&str> {
    if let Some(id) = callback.sdk_session_id.as_deref() {
        if !id.trim().is_empty() {
            return Some(id);
        }
    }
    let message = callback.new_message.as_ref()?;
    let tag = message.get("_type").and_then(Value::as_str).unwrap_or("");
    if !tag.contains("SystemMessage") {
        return None;
    }
    message
        .get("session_id")
        .or_else(|| message.get("data").and_then(|d| d.get("session_id")))
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
#[path = "callback_tests.rs"]
mod tests;
