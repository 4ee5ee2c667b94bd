mod common;

use std::time::Duration;

use pulsemon_common::UPDATE_STATS_EVENT;
use tokio::time::timeout;

#[tokio::test(flavor = "multi_thread")]
async fn construction_leaves_the_scheduler_idle() {
    let ctx = common::build_test_context(Duration::from_millis(100));
    assert!(!ctx.broadcaster.is_active());

    // With nobody attached, no frames may flow either.
    let mut rx = ctx.broadcaster.subscribe();
    let received = timeout(Duration::from_millis(400), rx.recv()).await;
    assert!(received.is_err(), "idle broadcaster must not emit frames");
}

#[tokio::test(flavor = "multi_thread")]
async fn first_attach_starts_the_cycle_exactly_once() {
    let ctx = common::build_test_context(Duration::from_millis(150));

    assert!(ctx.broadcaster.ensure_active());
    assert!(ctx.broadcaster.is_active());
    // Later viewers reuse the running cycle.
    assert!(!ctx.broadcaster.ensure_active());
    assert!(!ctx.broadcaster.ensure_active());
}

#[tokio::test(flavor = "multi_thread")]
async fn connect_snapshot_is_on_demand_and_complete() {
    // Interval long enough that no cycle frame can interfere.
    let ctx = common::build_test_context(Duration::from_secs(60));

    let frame = ctx.broadcaster.collect_event().await.unwrap();
    let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
    assert_eq!(json["event"], UPDATE_STATS_EVENT);
    assert!(json["data"]["timestamp"].is_string());
    assert!(json["data"]["cpu"].is_object());
    assert!(json["data"]["uptime"].is_string());
    assert!(json["data"].get("gpu_amd").is_some());
}

#[tokio::test(flavor = "multi_thread")]
async fn every_subscriber_receives_each_cycle_frame() {
    let ctx = common::build_test_context(Duration::from_millis(150));

    let mut early = ctx.broadcaster.subscribe();
    ctx.broadcaster.ensure_active();

    // A second viewer joins mid-stream and still sees full frames.
    tokio::time::sleep(Duration::from_millis(300)).await;
    let mut late = ctx.broadcaster.subscribe();
    assert_eq!(ctx.broadcaster.subscriber_count(), 2);

    for _ in 0..2 {
        let frame = timeout(Duration::from_secs(30), late.recv())
            .await
            .expect("cycle frame within the deadline")
            .unwrap();
        let json: serde_json::Value = serde_json::from_str(&frame).unwrap();
        assert_eq!(json["event"], UPDATE_STATS_EVENT);
        assert!(json["data"]["network"].is_array() || json["data"]["network"].is_object());
    }
    for _ in 0..2 {
        timeout(Duration::from_secs(30), early.recv())
            .await
            .expect("early subscriber keeps receiving")
            .unwrap();
    }

    drop(late);
    assert_eq!(ctx.broadcaster.subscriber_count(), 1);
}
