//! FogMap Geo - Geohash cells, distances, and fog geometry
//!
//! This crate handles the pure geospatial computations: the geohash codec,
//! great-circle distance, and the viewport-bounded fog geometry generator.

pub mod distance;
pub mod export;
pub mod fog;
pub mod geohash;

pub use distance::{haversine_distance, EARTH_RADIUS_M};
pub use export::FogGeometryExt;
pub use fog::FogGenerator;
