// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::{TimeZone, Timelike};
use std::time::Duration;

#[test]
fn system_clock_epoch_ms_is_nonzero() {
    let clock = SystemClock;
    assert!(clock.epoch_ms() > 0);
}

#[test]
fn fake_clock_starts_at_known_epoch() {
    let clock = FakeClock::new();
    assert_eq!(clock.epoch_ms(), 1_000_000);
}

#[test]
fn fake_clock_advance_moves_epoch() {
    let clock = FakeClock::new();
    clock.advance(Duration::from_secs(30));
    assert_eq!(clock.epoch_ms(), 1_000_000 + 30_000);
}

#[test]
fn fake_clock_set_epoch_ms() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(42);
    assert_eq!(clock.epoch_ms(), 42);
}

#[test]
fn now_utc_tracks_epoch_ms() {
    let clock = FakeClock::new();
    // 1970-01-02 03:00:00 UTC
    clock.set_epoch_ms((27 * 3600) * 1000);
    let now = clock.now_utc();
    assert_eq!(now.hour(), 3);
    assert_eq!(now.minute(), 0);
}

#[test]
fn at_utc_round_trips() {
    let at = chrono::Utc.with_ymd_and_hms(2024, 6, 1, 2, 30, 0).single().unwrap();
    let clock = FakeClock::at_utc(at);
    assert_eq!(clock.now_utc(), at);
}

#[test]
fn clones_share_time() {
    let clock = FakeClock::new();
    let other = clock.clone();
    clock.advance(Duration::from_millis(500));
    assert_eq!(other.epoch_ms(), clock.epoch_ms());
}
