// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Nightly scheduling: runs are claimable only inside the configured
//! UTC window.

use super::support::{deployment_with_queue, WORKER};
use chrono::TimeZone;
use relay_control::{NightlyWindow, QueueConfig};
use relay_wire::TaskEnqueueRequest;

fn at(h: u32, m: u32) -> u64 {
    chrono::Utc.with_ymd_and_hms(2024, 6, 1, h, m, 0).single().unwrap().timestamp_millis() as u64
}

#[test]
fn nightly_runs_claim_only_inside_the_window() {
    // 02:00 UTC start, 360 minute window.
    let deployment = deployment_with_queue(QueueConfig::with_nightly_window(NightlyWindow {
        start_hour: 2,
        start_minute: 0,
        window_minutes: 360,
    }));

    deployment
        .control
        .enqueue_task(
            &deployment.ctx("u1"),
            TaskEnqueueRequest {
                prompt: "nightly report".to_string(),
                schedule_mode: Some("nightly".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    // 01:59 UTC: the window is closed even though nightly runs exist.
    deployment.clock.set_epoch_ms(at(1, 59));
    assert!(deployment.claim(WORKER, 30).is_none());

    // 02:01 UTC: open.
    deployment.clock.set_epoch_ms(at(2, 1));
    let grant = deployment.claim(WORKER, 30);
    assert!(grant.is_some());
    assert_eq!(grant.unwrap().prompt, "nightly report");

    // A second nightly run, checked at 08:01 UTC: closed again.
    deployment
        .control
        .enqueue_task(
            &deployment.ctx("u1"),
            TaskEnqueueRequest {
                prompt: "another".to_string(),
                schedule_mode: Some("nightly".to_string()),
                ..Default::default()
            },
        )
        .unwrap();
    deployment.clock.set_epoch_ms(at(8, 1));
    assert!(deployment.claim("w2", 30).is_none());
}

#[tokio::test]
async fn dispatcher_nightly_puller_respects_its_window_state() {
    let deployment = deployment_with_queue(QueueConfig::with_nightly_window(
        NightlyWindow::default(),
    ));
    deployment
        .control
        .enqueue_task(
            &deployment.ctx("u1"),
            TaskEnqueueRequest {
                prompt: "nightly".to_string(),
                schedule_mode: Some("nightly".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

    deployment.clock.set_epoch_ms(at(2, 30));

    // Without an open window the nightly puller does not even poll.
    deployment
        .puller
        .poll_window("nightly", Some(vec![relay_core::ScheduleMode::Nightly]))
        .await;
    assert!(deployment.executor.executed.lock().is_empty());

    // Opening the window polls immediately and dispatches.
    deployment
        .puller
        .open_window("nightly", Some(vec![relay_core::ScheduleMode::Nightly]), 330)
        .await;
    deployment.puller.stop().await;
    assert_eq!(deployment.executor.executed.lock().len(), 1);
}
