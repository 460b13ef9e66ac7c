pub mod explored;
pub mod fog;
pub mod geometry;
pub mod location;

pub use explored::{ExploredArea, Precision};
pub use fog::{FogConfig, FogGeometry, FogStyle, RingWinding};
pub use geometry::{BoundingBox, LatLng, Viewport};
pub use location::{
    Accuracy, BackgroundProfile, LocationFix, LocationState, LocationStats, PermissionStatus,
    TrackerStatus, TrackingMode, TrackingProfile,
};
