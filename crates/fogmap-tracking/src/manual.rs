//! In-process fix source.
//!
//! Hosts (and tests) push fixes, batches or errors by hand instead of reading
//! a positioning device. Permission answers and the one-shot fix are
//! configurable, and every subscription profile is recorded so callers can
//! check what sampling the tracker asked for.
//!
//! State lives behind a `Mutex` that is locked with `unwrap()`: poisoning
//! means a pushing thread panicked, which is unrecoverable.

use async_trait::async_trait;
use fogmap_core::error::{FogmapError, Result};
use fogmap_core::models::{BackgroundProfile, LocationFix, PermissionStatus, TrackingProfile};
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

use crate::ports::{FixEvent, FixSource, FixSubscription, SubscriptionId};

#[derive(Debug)]
struct Stream {
    id: SubscriptionId,
    background: bool,
    sender: mpsc::UnboundedSender<FixEvent>,
}

#[derive(Debug)]
struct State {
    permission: PermissionStatus,
    background_permission: PermissionStatus,
    current_fix: Option<LocationFix>,
    next_id: SubscriptionId,
    streams: Vec<Stream>,
    profiles: Vec<TrackingProfile>,
    background_profiles: Vec<BackgroundProfile>,
}

#[derive(Debug, Clone)]
pub struct ManualFixSource {
    state: Arc<Mutex<State>>,
}

impl Default for ManualFixSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualFixSource {
    /// Source that grants both permissions and has no one-shot fix
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                permission: PermissionStatus::Granted,
                background_permission: PermissionStatus::Granted,
                current_fix: None,
                next_id: 1,
                streams: Vec::new(),
                profiles: Vec::new(),
                background_profiles: Vec::new(),
            })),
        }
    }

    pub fn with_permission(self, permission: PermissionStatus) -> Self {
        self.state.lock().unwrap().permission = permission;
        self
    }

    pub fn with_background_permission(self, permission: PermissionStatus) -> Self {
        self.state.lock().unwrap().background_permission = permission;
        self
    }

    /// Fix returned by `current_fix`; `None` makes that call fail
    pub fn set_current_fix(&self, fix: Option<LocationFix>) {
        self.state.lock().unwrap().current_fix = fix;
    }

    /// Deliver a fix to every foreground stream; returns the number reached
    pub fn push(&self, fix: LocationFix) -> usize {
        self.send(false, FixEvent::Fix(fix))
    }

    /// Deliver a batch to every background stream, falling back to the
    /// foreground streams when no background stream is open
    pub fn push_batch(&self, fixes: Vec<LocationFix>) -> usize {
        let has_background = self.state.lock().unwrap().streams.iter().any(|s| s.background);
        self.send(has_background, FixEvent::Batch(fixes))
    }

    /// Deliver a provider error to every open stream
    pub fn push_error(&self, message: impl Into<String>) -> usize {
        let event = FixEvent::Error(message.into());
        let state = self.state.lock().unwrap();
        state.streams.iter().filter(|s| s.sender.send(event.clone()).is_ok()).count()
    }

    /// End every open stream once its queued events are drained
    pub fn close(&self) {
        self.state.lock().unwrap().streams.clear();
    }

    /// Foreground profiles requested so far, oldest first
    pub fn subscribed_profiles(&self) -> Vec<TrackingProfile> {
        self.state.lock().unwrap().profiles.clone()
    }

    pub fn background_profiles(&self) -> Vec<BackgroundProfile> {
        self.state.lock().unwrap().background_profiles.clone()
    }

    /// Number of streams not yet unsubscribed or closed
    pub fn active_streams(&self) -> usize {
        self.state.lock().unwrap().streams.len()
    }

    fn send(&self, background: bool, event: FixEvent) -> usize {
        let state = self.state.lock().unwrap();
        state
            .streams
            .iter()
            .filter(|s| s.background == background)
            .filter(|s| s.sender.send(event.clone()).is_ok())
            .count()
    }

    fn open(&self, background: bool) -> FixSubscription {
        let (sender, events) = mpsc::unbounded_channel();
        let mut state = self.state.lock().unwrap();
        let id = state.next_id;
        state.next_id += 1;
        state.streams.push(Stream { id, background, sender });
        FixSubscription { id, events }
    }
}

#[async_trait]
impl FixSource for ManualFixSource {
    async fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(self.state.lock().unwrap().permission)
    }

    async fn request_background_permission(&self) -> Result<PermissionStatus> {
        Ok(self.state.lock().unwrap().background_permission)
    }

    async fn current_fix(&self, _profile: &TrackingProfile) -> Result<LocationFix> {
        self.state
            .lock()
            .unwrap()
            .current_fix
            .clone()
            .ok_or_else(|| FogmapError::FixSource("no fix available".to_string()))
    }

    async fn subscribe(&self, profile: &TrackingProfile) -> Result<FixSubscription> {
        if !self.state.lock().unwrap().permission.is_granted() {
            return Err(FogmapError::PermissionDenied);
        }
        self.state.lock().unwrap().profiles.push(*profile);
        Ok(self.open(false))
    }

    async fn subscribe_background(&self, profile: &BackgroundProfile) -> Result<FixSubscription> {
        if !self.state.lock().unwrap().background_permission.is_granted() {
            return Err(FogmapError::PermissionDenied);
        }
        self.state.lock().unwrap().background_profiles.push(*profile);
        Ok(self.open(true))
    }

    async fn unsubscribe(&self, id: SubscriptionId) -> Result<()> {
        self.state.lock().unwrap().streams.retain(|s| s.id != id);
        Ok(())
    }
}
