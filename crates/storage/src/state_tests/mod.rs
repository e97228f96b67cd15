// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::MaterializedState;
use relay_core::Event;

mod queries;
mod runs;
mod sessions;
mod transcript;

pub(crate) fn apply_all(state: &mut MaterializedState, events: Vec<Event>) {
    for event in events {
        state.apply_event(&event);
    }
}
