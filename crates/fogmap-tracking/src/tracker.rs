//! Async tracking driver
//!
//! Owns the fix-source subscriptions and a [`TrackingMachine`], executing the
//! machine's effects: resubscribing when the mode changes and recording
//! explored cells in the store. Every fix, whether it comes from the one-shot
//! request at start, a foreground stream, a background batch or
//! [`Tracker::ingest_batch`], goes through [`Tracker::process_fix`].

use chrono::Utc;
use fogmap_core::models::{
    BackgroundProfile, LocationFix, LocationState, PermissionStatus, Precision, TrackerStatus,
    TrackingMode,
};
use fogmap_store::ExploredAreaStore;
use std::sync::Arc;

use crate::machine::{Effect, FixOutcome, TrackingMachine};
use crate::ports::{FixEvent, FixSource, FixSubscription};

/// Clock used to timestamp fixes for throttling and stats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeSource {
    /// Wall clock at processing time
    #[default]
    System,
    /// The fix's own timestamp (track replay)
    FixTimestamp,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started,
    PermissionDenied,
    /// The fix source refused to open a stream
    Failed(String),
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Foreground,
    Background,
}

pub struct Tracker {
    source: Arc<dyn FixSource>,
    store: ExploredAreaStore,
    machine: TrackingMachine,
    foreground: Option<FixSubscription>,
    background: Option<FixSubscription>,
    background_profile: BackgroundProfile,
    time_source: TimeSource,
}

impl Tracker {
    pub fn new(source: Arc<dyn FixSource>, store: ExploredAreaStore, precision: Precision) -> Self {
        Self {
            source,
            store,
            machine: TrackingMachine::new(precision),
            foreground: None,
            background: None,
            background_profile: BackgroundProfile::default(),
            time_source: TimeSource::default(),
        }
    }

    pub fn with_time_source(mut self, time_source: TimeSource) -> Self {
        self.time_source = time_source;
        self
    }

    pub fn with_background_profile(mut self, profile: BackgroundProfile) -> Self {
        self.background_profile = profile;
        self
    }

    pub fn status(&self) -> &TrackerStatus {
        self.machine.status()
    }

    pub fn location(&self) -> &LocationState {
        self.machine.location()
    }

    pub fn mode(&self) -> TrackingMode {
        self.machine.mode()
    }

    pub fn store(&self) -> &ExploredAreaStore {
        &self.store
    }

    pub fn is_subscribed(&self) -> bool {
        self.foreground.is_some() || self.background.is_some()
    }

    pub fn reset_stats(&mut self) {
        self.machine.reset_stats();
    }

    /// Request permissions, take an initial fix, and open the foreground stream
    pub async fn start(&mut self) -> StartOutcome {
        if self.foreground.is_some() {
            return StartOutcome::Started;
        }

        let permission = match self.source.request_permission().await {
            Ok(permission) => permission,
            Err(e) => {
                self.machine.record_error(e.to_string());
                PermissionStatus::Denied
            }
        };
        self.machine.set_permission(permission);
        if !permission.is_granted() {
            tracing::warn!(permission = ?permission, "Location permission not granted");
            self.machine.record_error("Location permission not granted");
            return StartOutcome::PermissionDenied;
        }

        match self.source.request_background_permission().await {
            Ok(status) => {
                self.machine.set_background_permission(status);
                if !status.is_granted() {
                    tracing::warn!(permission = ?status, "Background location permission not granted");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Background permission request failed");
                self.machine.record_error(e.to_string());
            }
        }

        match self.source.current_fix(&self.machine.profile()).await {
            Ok(fix) => {
                self.process_fix(fix).await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Initial fix unavailable");
                self.machine.record_error(e.to_string());
            }
        }

        let profile = self.machine.profile();
        match self.source.subscribe(&profile).await {
            Ok(subscription) => {
                self.foreground = Some(subscription);
                self.machine.set_tracking(true);
                tracing::info!(mode = %self.machine.mode(), "Started tracking");
                StartOutcome::Started
            }
            Err(e) => {
                self.machine.record_error(e.to_string());
                tracing::error!(error = %e, "Failed to subscribe to fixes");
                StartOutcome::Failed(e.to_string())
            }
        }
    }

    /// The single accept path for fixes from every delivery channel
    pub async fn process_fix(&mut self, fix: LocationFix) -> FixOutcome {
        let now = match self.time_source {
            TimeSource::System => Utc::now(),
            TimeSource::FixTimestamp => fix.timestamp,
        };

        let outcome = self.machine.process_fix(&fix, now);

        if let Some((from, to)) = outcome.mode_change {
            tracing::info!(
                from = %from,
                to = %to,
                speed_kmh = fix.speed_kmh().unwrap_or_default(),
                "Tracking mode changed"
            );
        }

        for effect in &outcome.effects {
            match effect {
                Effect::RestartSubscription(_) => {
                    if self.foreground.is_some() {
                        self.restart().await;
                    }
                }
                Effect::Explore { latitude, longitude, precision, timestamp } => {
                    self.store.try_insert_at(*latitude, *longitude, *precision, *timestamp).await;
                }
            }
        }

        outcome
    }

    /// Close the foreground stream and reopen it with the current profile.
    ///
    /// Returns whether a stream is open afterwards.
    pub async fn restart(&mut self) -> bool {
        self.unsubscribe(Stream::Foreground).await;

        let profile = self.machine.profile();
        match self.source.subscribe(&profile).await {
            Ok(subscription) => {
                tracing::debug!(
                    time_interval_ms = profile.time_interval_ms,
                    distance_interval_m = profile.distance_interval_m,
                    "Resubscribed with new profile"
                );
                self.foreground = Some(subscription);
                self.machine.set_tracking(true);
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to resubscribe");
                self.machine.record_error(e.to_string());
                self.machine.set_tracking(false);
                false
            }
        }
    }

    /// Close every stream. Safe to call when nothing is open.
    pub async fn stop(&mut self) {
        let was_subscribed = self.is_subscribed();
        self.unsubscribe(Stream::Foreground).await;
        self.unsubscribe(Stream::Background).await;
        self.machine.set_tracking(false);

        if was_subscribed {
            tracing::info!("Stopped tracking");
        }
    }

    /// Open the deferred background stream; needs background permission
    pub async fn start_background(&mut self) -> StartOutcome {
        if self.background.is_some() {
            return StartOutcome::Started;
        }

        if !self.machine.status().background_permission.is_granted() {
            match self.source.request_background_permission().await {
                Ok(status) => self.machine.set_background_permission(status),
                Err(e) => self.machine.record_error(e.to_string()),
            }
        }
        let permission = self.machine.status().background_permission;
        if !permission.is_granted() {
            tracing::warn!(permission = ?permission, "Background tracking not permitted");
            return StartOutcome::PermissionDenied;
        }

        match self.source.subscribe_background(&self.background_profile).await {
            Ok(subscription) => {
                self.background = Some(subscription);
                tracing::info!(
                    deferred_interval_ms = self.background_profile.deferred_interval_ms,
                    "Started background tracking"
                );
                StartOutcome::Started
            }
            Err(e) => {
                self.machine.record_error(e.to_string());
                tracing::error!(error = %e, "Failed to start background tracking");
                StartOutcome::Failed(e.to_string())
            }
        }
    }

    /// Feed a batch of fixes in order; returns how many were accepted
    pub async fn ingest_batch(&mut self, fixes: Vec<LocationFix>) -> usize {
        let mut accepted = 0;
        for fix in fixes {
            if self.process_fix(fix).await.accepted {
                accepted += 1;
            }
        }
        accepted
    }

    /// Wait for the next event on any open stream and handle it.
    ///
    /// Returns `false` once no stream is open. A stream whose sender goes
    /// away is dropped; the foreground one ending also ends tracking.
    pub async fn pump(&mut self) -> bool {
        loop {
            if !self.is_subscribed() {
                return false;
            }

            let (event, stream) = tokio::select! {
                event = next_event(&mut self.foreground) => (event, Stream::Foreground),
                event = next_event(&mut self.background) => (event, Stream::Background),
            };

            match event {
                Some(event) => {
                    self.handle_event(event).await;
                    return true;
                }
                None => {
                    tracing::info!(stream = ?stream, "Fix stream ended");
                    match stream {
                        Stream::Foreground => {
                            self.foreground = None;
                            self.machine.set_tracking(false);
                        }
                        Stream::Background => self.background = None,
                    }
                }
            }
        }
    }

    async fn handle_event(&mut self, event: FixEvent) {
        match event {
            FixEvent::Fix(fix) => {
                self.process_fix(fix).await;
            }
            FixEvent::Batch(fixes) => {
                let count = fixes.len();
                let accepted = self.ingest_batch(fixes).await;
                tracing::debug!(count, accepted, "Processed fix batch");
            }
            FixEvent::Error(message) => {
                tracing::warn!(error = %message, "Fix source reported an error");
                self.machine.record_error(message);
            }
        }
    }

    async fn unsubscribe(&mut self, stream: Stream) {
        let subscription = match stream {
            Stream::Foreground => self.foreground.take(),
            Stream::Background => self.background.take(),
        };

        if let Some(subscription) = subscription {
            if let Err(e) = self.source.unsubscribe(subscription.id).await {
                tracing::warn!(id = subscription.id, error = %e, "Failed to unsubscribe");
            }
        }
    }
}

async fn next_event(subscription: &mut Option<FixSubscription>) -> Option<FixEvent> {
    match subscription {
        Some(subscription) => subscription.events.recv().await,
        None => std::future::pending().await,
    }
}
