use async_trait::async_trait;
use fogmap_core::error::Result;
use fogmap_core::models::{BackgroundProfile, LocationFix, PermissionStatus, TrackingProfile};
use tokio::sync::mpsc;

pub type SubscriptionId = u64;

/// Something delivered by an active subscription
#[derive(Debug, Clone, PartialEq)]
pub enum FixEvent {
    Fix(LocationFix),
    /// Deferred delivery of several fixes at once
    Batch(Vec<LocationFix>),
    Error(String),
}

/// Handle to a live fix stream
#[derive(Debug)]
pub struct FixSubscription {
    pub id: SubscriptionId,
    pub events: mpsc::UnboundedReceiver<FixEvent>,
}

/// Port for a positioning provider
#[async_trait]
pub trait FixSource: Send + Sync {
    /// Ask for foreground location permission
    async fn request_permission(&self) -> Result<PermissionStatus>;

    /// Ask for permission to keep receiving fixes in the background
    async fn request_background_permission(&self) -> Result<PermissionStatus>;

    /// One-shot fix at the given accuracy
    async fn current_fix(&self, profile: &TrackingProfile) -> Result<LocationFix>;

    /// Start a foreground fix stream with the given sampling profile
    async fn subscribe(&self, profile: &TrackingProfile) -> Result<FixSubscription>;

    /// Start a background fix stream with deferred batch delivery
    async fn subscribe_background(&self, profile: &BackgroundProfile) -> Result<FixSubscription>;

    /// Stop a stream. Unknown ids are ignored.
    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()>;
}
