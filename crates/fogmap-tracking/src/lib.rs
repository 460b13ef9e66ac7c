//! FogMap Tracking - Adaptive location sampling
//!
//! This crate defines the fix-source port, the pure tracking state machine
//! that filters fixes and selects a sampling mode from speed, and the async
//! tracker that drives subscriptions and feeds accepted fixes into the
//! explored-area store.

pub mod machine;
pub mod manual;
pub mod ports;
pub mod tracker;

pub use machine::{Effect, FixOutcome, TrackingMachine};
pub use manual::ManualFixSource;
pub use ports::{FixEvent, FixSource, FixSubscription, SubscriptionId};
pub use tracker::{StartOutcome, TimeSource, Tracker};
