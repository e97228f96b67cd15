// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-storage: durable state for the control plane.
//!
//! Events are facts; state is derived from them. A JSON-lines WAL records
//! every committed event batch, zstd snapshots bound recovery time, and
//! [`Store`] serializes all mutations behind one lock, the claim query's
//! `FOR UPDATE SKIP LOCKED` equivalent.

mod snapshot;
mod state;
mod store;
mod wal;

pub use snapshot::{load_snapshot, save_snapshot, Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
pub use state::{install_key, MaterializedState};
pub use store::{Store, StoreError};
pub use wal::{Wal, WalEntry, WalError};
