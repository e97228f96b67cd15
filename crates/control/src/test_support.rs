// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for control-plane tests.

use crate::{Control, QueueConfig, RequestCtx};
use relay_core::FakeClock;
use relay_storage::Store;
use std::sync::Arc;

pub(crate) struct Fixture {
    pub control: Control<FakeClock>,
    pub clock: FakeClock,
    // Held for the lifetime of the store directory.
    _dir: tempfile::TempDir,
}

pub(crate) fn fixture() -> Fixture {
    fixture_with_queue(QueueConfig::default())
}

pub(crate) fn fixture_with_queue(queue: QueueConfig) -> Fixture {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(Store::open(dir.path()).expect("store"));
    let clock = FakeClock::new();
    Fixture { control: Control::new(store, clock.clone(), queue), clock, _dir: dir }
}

pub(crate) fn ctx(user: &str) -> RequestCtx {
    RequestCtx::new(user)
}
