// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The store: one lock, one WAL, one materialized state.
//!
//! [`Store::transact`] is the system's single serialization point. A
//! transaction reads state, decides on a batch of events, and commits
//! them (WAL append, then apply) without releasing the lock, which is
//! what makes run claims and per-session callback processing atomic.

use crate::snapshot::{load_snapshot, save_snapshot, Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};
use crate::state::MaterializedState;
use crate::wal::{Wal, WalError};
use chrono::{TimeZone, Utc};
use parking_lot::Mutex;
use relay_core::Event;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Wal(#[from] WalError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
}

struct Inner {
    state: MaterializedState,
    wal: Wal,
}

/// Durable state with serialized mutations.
pub struct Store {
    dir: PathBuf,
    inner: Mutex<Inner>,
}

impl Store {
    /// Open the store in `dir`: load the latest snapshot (if any) and
    /// replay WAL entries committed after it.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        let snapshot = load_snapshot(dir)?;
        let (wal, entries) = Wal::open(dir)?;

        let (mut state, snapshot_seq) = match snapshot {
            Some(snap) => (snap.state, snap.seq),
            None => (MaterializedState::default(), 0),
        };

        let mut replayed = 0usize;
        for entry in &entries {
            if entry.seq > snapshot_seq {
                state.apply_event(&entry.event);
                replayed += 1;
            }
        }
        tracing::info!(
            dir = %dir.display(),
            snapshot_seq,
            replayed,
            "store opened"
        );

        Ok(Self { dir: dir.to_path_buf(), inner: Mutex::new(Inner { state, wal }) })
    }

    /// Read from the materialized state under the lock.
    pub fn read<R>(&self, f: impl FnOnce(&MaterializedState) -> R) -> R {
        let inner = self.inner.lock();
        f(&inner.state)
    }

    /// Run a transaction: decide a batch of events from a consistent view
    /// of state, then commit it atomically. Returning an error from the
    /// closure aborts with no effects.
    pub fn transact<R, E>(
        &self,
        at_ms: u64,
        f: impl FnOnce(&MaterializedState) -> Result<(Vec<Event>, R), E>,
    ) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut inner = self.inner.lock();
        let (events, result) = f(&inner.state)?;
        if events.is_empty() {
            return Ok(result);
        }

        inner.wal.append(at_ms, &events).map_err(StoreError::from)?;
        for event in &events {
            tracing::debug!(event = %event.summary(), "commit");
            inner.state.apply_event(event);
        }
        Ok(result)
    }

    /// Commit a pre-decided batch of events.
    pub fn commit(&self, at_ms: u64, events: Vec<Event>) -> Result<(), StoreError> {
        self.transact::<(), StoreError>(at_ms, |_| Ok((events, ())))
    }

    /// Write a snapshot of the current state and truncate the WAL.
    /// `at_ms` comes from the caller's clock, like [`Store::transact`].
    pub fn checkpoint(&self, at_ms: u64) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        let snapshot = Snapshot {
            version: CURRENT_SNAPSHOT_VERSION,
            seq: inner.wal.last_seq(),
            state: inner.state.clone(),
            created_at: Utc.timestamp_millis_opt(at_ms as i64).single().unwrap_or_default(),
        };
        save_snapshot(&self.dir, &snapshot)?;
        inner.wal.truncate()?;
        tracing::info!(seq = snapshot.seq, "checkpoint written");
        Ok(())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
