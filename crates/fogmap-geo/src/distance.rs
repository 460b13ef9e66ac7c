use geo::{Distance, HaversineMeasure, Point};

/// Sphere radius used for every distance in fogmap (metres)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance between two coordinates in metres (haversine).
///
/// Both fix throttling and the distance-travelled statistic go through this
/// function so the two always agree.
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    HaversineMeasure::new(EARTH_RADIUS_M).distance(Point::new(lon1, lat1), Point::new(lon2, lat2))
}
