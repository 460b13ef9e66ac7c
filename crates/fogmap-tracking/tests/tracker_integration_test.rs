//! Tracker driven through the manual fix source end to end

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use fogmap_core::models::{
    BackgroundProfile, LocationFix, PermissionStatus, Precision, TrackingMode, TrackingProfile,
};
use fogmap_store::{ExploredAreaStore, MemoryBlobStore};
use fogmap_tracking::{ManualFixSource, StartOutcome, TimeSource, Tracker};

fn t0() -> DateTime<Utc> {
    Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()
}

fn setup(source: &ManualFixSource) -> (Tracker, ExploredAreaStore) {
    let store = ExploredAreaStore::with_default_key(Arc::new(MemoryBlobStore::new()));
    let tracker = Tracker::new(Arc::new(source.clone()), store.clone(), Precision::DEFAULT)
        .with_time_source(TimeSource::FixTimestamp);
    (tracker, store)
}

#[tokio::test]
async fn test_highway_speed_resubscribes_with_low_profile() {
    let source = ManualFixSource::new();
    let (mut tracker, _store) = setup(&source);
    assert_eq!(tracker.start().await, StartOutcome::Started);
    assert_eq!(tracker.mode(), TrackingMode::Balanced);

    // 60 km/h
    source.push(LocationFix::new(49.2827, -123.1207, t0()).with_speed(60.0 / 3.6));
    assert!(tracker.pump().await);

    assert_eq!(tracker.mode(), TrackingMode::Low);
    let profiles = source.subscribed_profiles();
    let active = profiles.last().unwrap();
    assert_eq!(*active, TrackingProfile::LOW);
    assert_eq!(active.time_interval_ms, 10_000);
    assert_eq!(active.distance_interval_m, 50.0);
    assert_eq!(source.active_streams(), 1);
}

#[tokio::test]
async fn test_close_recent_fix_is_skipped() {
    let source = ManualFixSource::new();
    let (mut tracker, store) = setup(&source);

    let first = LocationFix::new(49.2827, -123.1207, t0());
    // ~3 m north, 2 s later
    let second = LocationFix::new(49.2827 + 3.0 / 111_194.93, -123.1207, t0() + Duration::seconds(2));

    assert!(tracker.process_fix(first.clone()).await.accepted);
    assert!(!tracker.process_fix(second).await.accepted);

    assert_eq!(tracker.location().current, Some(first));
    assert_eq!(tracker.location().stats.update_count, 1);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_permission_denied_opens_nothing() {
    let source = ManualFixSource::new().with_permission(PermissionStatus::Denied);
    let (mut tracker, store) = setup(&source);

    assert_eq!(tracker.start().await, StartOutcome::PermissionDenied);

    assert_eq!(tracker.status().permission, PermissionStatus::Denied);
    assert_eq!(
        tracker.status().last_error.as_deref(),
        Some("Location permission not granted")
    );
    assert!(!tracker.status().is_tracking);
    assert!(source.subscribed_profiles().is_empty());
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_provider_error_is_recorded_and_tracking_continues() {
    let source = ManualFixSource::new();
    let (mut tracker, _store) = setup(&source);
    tracker.start().await;

    source.push_error("GPS signal lost");
    assert!(tracker.pump().await);
    assert_eq!(tracker.status().last_error.as_deref(), Some("GPS signal lost"));
    assert!(tracker.status().is_tracking);

    source.push(LocationFix::new(49.2827, -123.1207, t0()));
    assert!(tracker.pump().await);
    assert!(tracker.status().last_error.is_none());
}

#[tokio::test]
async fn test_background_batches_use_the_same_accept_path() {
    let source = ManualFixSource::new();
    let (mut tracker, store) = setup(&source);
    tracker.start().await;
    assert_eq!(tracker.start_background().await, StartOutcome::Started);
    assert_eq!(source.background_profiles(), vec![BackgroundProfile::default()]);

    let batch = vec![
        LocationFix::new(49.2827, -123.1207, t0()),
        // Too close and too soon: skipped like any foreground fix
        LocationFix::new(49.2827, -123.1207, t0() + Duration::seconds(1)),
        LocationFix::new(49.2900, -123.1207, t0() + Duration::seconds(60)),
    ];
    assert_eq!(source.push_batch(batch), 1);
    assert!(tracker.pump().await);

    assert_eq!(tracker.location().stats.update_count, 2);
    assert_eq!(store.len(), 2);

    tracker.stop().await;
    assert_eq!(source.active_streams(), 0);
}

#[tokio::test]
async fn test_background_denied() {
    let source =
        ManualFixSource::new().with_background_permission(PermissionStatus::Denied);
    let (mut tracker, _store) = setup(&source);

    assert_eq!(tracker.start().await, StartOutcome::Started);
    assert_eq!(tracker.status().background_permission, PermissionStatus::Denied);
    assert_eq!(tracker.start_background().await, StartOutcome::PermissionDenied);
}

#[tokio::test]
async fn test_ingest_batch_counts_accepted() {
    let source = ManualFixSource::new();
    let (mut tracker, _store) = setup(&source);

    let fixes = (0..5)
        .map(|i| LocationFix::new(49.2827 + i as f64 * 0.001, -123.1207, t0() + Duration::seconds(i * 5)))
        .collect();
    assert_eq!(tracker.ingest_batch(fixes).await, 5);

    let travelled = tracker.location().stats.distance_traveled_m;
    assert!(travelled > 440.0 && travelled < 450.0, "travelled {}", travelled);
}
