use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kilometres per hour in one metre per second
pub const MS_TO_KMH: f64 = 3.6;

/// A raw position fix from the platform location service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub altitude: Option<f64>,
    #[serde(default)]
    pub accuracy: Option<f64>,
    /// Ground speed in metres per second
    #[serde(default)]
    pub speed: Option<f64>,
    #[serde(default)]
    pub heading: Option<f64>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
}

impl LocationFix {
    pub fn new(latitude: f64, longitude: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            altitude: None,
            accuracy: None,
            speed: None,
            heading: None,
            timestamp,
        }
    }

    pub fn with_speed(mut self, speed_ms: f64) -> Self {
        self.speed = Some(speed_ms);
        self
    }

    /// Speed converted to km/h, if the fix reports one
    pub fn speed_kmh(&self) -> Option<f64> {
        self.speed.map(|s| s * MS_TO_KMH)
    }
}

/// Cumulative tracking statistics
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationStats {
    pub last_update_time: Option<DateTime<Utc>>,
    pub update_count: u64,
    pub distance_traveled_m: f64,
}

/// Latest accepted fix plus cumulative stats
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationState {
    pub current: Option<LocationFix>,
    pub stats: LocationStats,
}

/// Requested fix accuracy class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accuracy {
    BestForNavigation,
    High,
    Balanced,
    Low,
}

/// Sampling profile handed to the fix source when subscribing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackingProfile {
    pub accuracy: Accuracy,
    /// Minimum time between delivered fixes (milliseconds)
    pub time_interval_ms: u64,
    /// Minimum movement between delivered fixes (metres)
    pub distance_interval_m: f64,
}

impl TrackingProfile {
    pub const HIGH: TrackingProfile = TrackingProfile {
        accuracy: Accuracy::BestForNavigation,
        time_interval_ms: 1_000,
        distance_interval_m: 5.0,
    };

    pub const BALANCED: TrackingProfile = TrackingProfile {
        accuracy: Accuracy::Balanced,
        time_interval_ms: 3_000,
        distance_interval_m: 10.0,
    };

    pub const LOW: TrackingProfile = TrackingProfile {
        accuracy: Accuracy::Low,
        time_interval_ms: 10_000,
        distance_interval_m: 50.0,
    };
}

/// Profile for deferred delivery while the host app is backgrounded
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BackgroundProfile {
    pub profile: TrackingProfile,
    /// Batch window for deferred updates (milliseconds)
    pub deferred_interval_ms: u64,
    pub show_indicator: bool,
}

impl Default for BackgroundProfile {
    fn default() -> Self {
        Self {
            profile: TrackingProfile {
                accuracy: Accuracy::Balanced,
                time_interval_ms: 5_000,
                distance_interval_m: 10.0,
            },
            deferred_interval_ms: 60_000,
            show_indicator: true,
        }
    }
}

/// Speed-selected sampling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TrackingMode {
    /// Walking pace: frequent, precise fixes
    High,
    #[default]
    Balanced,
    /// Driving pace: sparse fixes
    Low,
}

impl TrackingMode {
    /// Select a mode from ground speed in km/h.
    ///
    /// ```text
    /// speed > 50 km/h  => Low
    /// speed > 10 km/h  => Balanced
    /// otherwise        => High
    /// ```
    pub fn for_speed_kmh(speed_kmh: f64) -> Self {
        if speed_kmh > 50.0 {
            TrackingMode::Low
        } else if speed_kmh > 10.0 {
            TrackingMode::Balanced
        } else {
            TrackingMode::High
        }
    }

    pub fn profile(&self) -> TrackingProfile {
        match self {
            TrackingMode::High => TrackingProfile::HIGH,
            TrackingMode::Balanced => TrackingProfile::BALANCED,
            TrackingMode::Low => TrackingProfile::LOW,
        }
    }
}

impl fmt::Display for TrackingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackingMode::High => write!(f, "high"),
            TrackingMode::Balanced => write!(f, "balanced"),
            TrackingMode::Low => write!(f, "low"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PermissionStatus {
    #[default]
    Undetermined,
    Granted,
    Denied,
}

impl PermissionStatus {
    pub fn is_granted(&self) -> bool {
        matches!(self, PermissionStatus::Granted)
    }
}

/// User-visible tracking flags
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrackerStatus {
    pub permission: PermissionStatus,
    pub background_permission: PermissionStatus,
    pub is_tracking: bool,
    pub mode: TrackingMode,
    pub last_error: Option<String>,
}
