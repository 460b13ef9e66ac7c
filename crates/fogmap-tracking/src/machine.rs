//! Tracking state machine
//!
//! Pure decision logic for incoming fixes: no I/O, no clock. The caller
//! supplies the processing time and executes the returned [`Effect`]s.
//!
//! # Per-fix pipeline
//!
//! ```text
//! 1. Speed present?  pick mode from km/h; on change emit RestartSubscription
//! 2. Skip if the last accepted fix is both too recent and too close
//!    (thresholds from the profile of the possibly-new mode)
//! 3. Accept: update stats and current fix, clear last error, emit Explore
//! ```

use chrono::{DateTime, Utc};
use fogmap_core::models::{
    LocationFix, LocationState, PermissionStatus, Precision, TrackerStatus, TrackingMode,
    TrackingProfile,
};
use fogmap_geo::haversine_distance;

/// Work the driver must perform after a fix is processed
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Resubscribe with a new sampling profile
    RestartSubscription(TrackingProfile),

    /// Mark the cell containing this point as explored
    Explore {
        latitude: f64,
        longitude: f64,
        precision: Precision,
        timestamp: DateTime<Utc>,
    },
}

/// Result of feeding one fix to the machine
#[derive(Debug, Clone, PartialEq)]
pub struct FixOutcome {
    pub accepted: bool,
    /// (from, to) when the fix changed the tracking mode
    pub mode_change: Option<(TrackingMode, TrackingMode)>,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone)]
struct LastAccepted {
    latitude: f64,
    longitude: f64,
    at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct TrackingMachine {
    precision: Precision,
    status: TrackerStatus,
    location: LocationState,
    last_accepted: Option<LastAccepted>,
}

impl Default for TrackingMachine {
    fn default() -> Self {
        Self::new(Precision::DEFAULT)
    }
}

impl TrackingMachine {
    /// Machine in Balanced mode that explores cells at `precision`
    pub fn new(precision: Precision) -> Self {
        Self {
            precision,
            status: TrackerStatus::default(),
            location: LocationState::default(),
            last_accepted: None,
        }
    }

    pub fn mode(&self) -> TrackingMode {
        self.status.mode
    }

    /// Sampling profile of the current mode
    pub fn profile(&self) -> TrackingProfile {
        self.status.mode.profile()
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn status(&self) -> &TrackerStatus {
        &self.status
    }

    pub fn location(&self) -> &LocationState {
        &self.location
    }

    /// Run one fix through mode selection, throttling and acceptance
    pub fn process_fix(&mut self, fix: &LocationFix, now: DateTime<Utc>) -> FixOutcome {
        let mut effects = Vec::new();
        let mut mode_change = None;

        if let Some(speed_kmh) = fix.speed_kmh() {
            let desired = TrackingMode::for_speed_kmh(speed_kmh);
            if desired != self.status.mode {
                mode_change = Some((self.status.mode, desired));
                self.status.mode = desired;
                effects.push(Effect::RestartSubscription(desired.profile()));
            }
        }

        let profile = self.profile();
        let mut step_m = 0.0;
        if let Some(last) = &self.last_accepted {
            let elapsed_ms = (now - last.at).num_milliseconds();
            step_m = haversine_distance(last.latitude, last.longitude, fix.latitude, fix.longitude);

            if elapsed_ms < profile.time_interval_ms as i64 && step_m < profile.distance_interval_m
            {
                tracing::debug!(
                    elapsed_ms,
                    distance_m = step_m,
                    mode = %self.status.mode,
                    "Skipping fix below sampling thresholds"
                );
                return FixOutcome { accepted: false, mode_change, effects };
            }
        }

        let stats = &mut self.location.stats;
        stats.distance_traveled_m += step_m;
        stats.update_count += 1;
        stats.last_update_time = Some(now);

        self.location.current = Some(fix.clone());
        self.status.last_error = None;
        self.last_accepted = Some(LastAccepted {
            latitude: fix.latitude,
            longitude: fix.longitude,
            at: now,
        });

        effects.push(Effect::Explore {
            latitude: fix.latitude,
            longitude: fix.longitude,
            precision: self.precision,
            timestamp: now,
        });

        FixOutcome { accepted: true, mode_change, effects }
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.status.last_error = Some(message.into());
    }

    pub fn set_permission(&mut self, permission: PermissionStatus) {
        self.status.permission = permission;
    }

    pub fn set_background_permission(&mut self, permission: PermissionStatus) {
        self.status.background_permission = permission;
    }

    pub fn set_tracking(&mut self, is_tracking: bool) {
        self.status.is_tracking = is_tracking;
    }

    /// Zero the cumulative stats; the current fix is kept
    pub fn reset_stats(&mut self) {
        self.location.stats = Default::default();
    }
}
