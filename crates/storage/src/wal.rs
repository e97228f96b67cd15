// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only write-ahead log.
//!
//! One JSON object per line: `{"seq": N, "at_ms": T, "event": {...}}`.
//! Appends are flushed and fsynced before the commit is acknowledged.
//! A torn trailing line (crash mid-write) is tolerated on replay.

use relay_core::Event;
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const WAL_FILE: &str = "events.wal";

#[derive(Debug, Error)]
pub enum WalError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One committed event with its sequence number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub at_ms: u64,
    pub event: Event,
}

/// Append handle over the log file.
pub struct Wal {
    path: PathBuf,
    file: File,
    next_seq: u64,
}

impl Wal {
    /// Open (creating if absent) the WAL in `dir` and return the handle
    /// plus all previously committed entries in order.
    pub fn open(dir: &Path) -> Result<(Self, Vec<WalEntry>), WalError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(WAL_FILE);
        let entries = read_entries(&path)?;
        let next_seq = entries.last().map(|e| e.seq + 1).unwrap_or(1);

        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok((Self { path, file, next_seq }, entries))
    }

    /// Sequence number the next append will receive.
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }

    /// Sequence number of the last committed entry (0 when empty).
    pub fn last_seq(&self) -> u64 {
        self.next_seq - 1
    }

    /// Append a batch of events as consecutive entries, flushing and
    /// fsyncing once per batch. Returns the last assigned sequence.
    pub fn append(&mut self, at_ms: u64, events: &[Event]) -> Result<u64, WalError> {
        let mut buf = Vec::new();
        for event in events {
            let entry = WalEntry { seq: self.next_seq, at_ms, event: event.clone() };
            serde_json::to_writer(&mut buf, &entry)?;
            buf.push(b'\n');
            self.next_seq += 1;
        }
        self.file.write_all(&buf)?;
        self.file.flush()?;
        self.file.sync_data()?;
        Ok(self.last_seq())
    }

    /// Drop all entries after a checkpoint. Sequence numbers keep
    /// increasing monotonically across truncations.
    pub fn truncate(&mut self) -> Result<(), WalError> {
        self.file.set_len(0)?;
        self.file.seek(SeekFrom::Start(0))?;
        self.file.sync_data()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn read_entries(path: &Path) -> Result<Vec<WalEntry>, WalError> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut entries = Vec::new();
    let reader = BufReader::new(file);
    let mut lines = reader.lines().peekable();
    while let Some(line) = lines.next() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<WalEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(err) if lines.peek().is_none() => {
                // Torn trailing write from a crash; recover what we have.
                tracing::warn!(error = %err, "dropping torn trailing WAL entry");
                break;
            }
            Err(err) => return Err(err.into()),
        }
    }
    Ok(entries)
}

#[cfg(test)]
#[path = "wal_tests.rs"]
mod tests;
