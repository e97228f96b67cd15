// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-user persistent instructions, served to the dispatcher for
//! staging as the user-level CLAUDE.md.

use crate::context::RequestCtx;
use crate::error::ControlError;
use crate::Control;
use relay_core::{Clock, Event, UserInstructions};
use relay_wire::{InstructionsSetRequest, InstructionsView};

impl<C: Clock> Control<C> {
    pub fn get_instructions(&self, ctx: &RequestCtx) -> Result<InstructionsView, ControlError> {
        Ok(self.store.read(|state| {
            state
                .instructions
                .get(&ctx.user_id)
                .map(InstructionsView::from)
                .unwrap_or(InstructionsView { enabled: false, content: String::new() })
        }))
    }

    pub fn set_instructions(
        &self,
        ctx: &RequestCtx,
        request: InstructionsSetRequest,
    ) -> Result<InstructionsView, ControlError> {
        let now = self.epoch_ms();
        self.store.transact(now, |_state| {
            let record = UserInstructions {
                user_id: ctx.user_id.clone(),
                enabled: request.enabled,
                content: request.content.clone(),
                updated_at_ms: now,
            };
            let view = InstructionsView::from(&record);
            Ok((vec![Event::InstructionsSet { record }], view))
        })
    }
}
