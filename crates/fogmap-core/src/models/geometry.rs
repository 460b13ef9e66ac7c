//! Geographic primitives shared across the fogmap crates.
//!
//! All coordinates are WGS 84 degrees on a spherical-earth approximation.
//! Longitude is treated as the x axis and latitude as the y axis.

use serde::{Deserialize, Serialize};

pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;
pub const MIN_LNG: f64 = -180.0;
pub const MAX_LNG: f64 = 180.0;

/// A single polygon vertex as consumed by map renderers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

impl LatLng {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Closed axis-aligned latitude/longitude rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lng: f64,
    pub max_lat: f64,
    pub max_lng: f64,
}

impl BoundingBox {
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Self {
        Self { min_lat, min_lng, max_lat, max_lng }
    }

    /// Rectangle overlap test. Touching edges count as intersecting.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        !(self.max_lat < other.min_lat
            || self.min_lat > other.max_lat
            || self.max_lng < other.min_lng
            || self.min_lng > other.max_lng)
    }

    pub fn contains_point(&self, lat: f64, lng: f64) -> bool {
        lat >= self.min_lat && lat <= self.max_lat && lng >= self.min_lng && lng <= self.max_lng
    }

    /// Whether `other` lies entirely inside this box (boundaries included)
    pub fn contains(&self, other: &BoundingBox) -> bool {
        other.min_lat >= self.min_lat
            && other.max_lat <= self.max_lat
            && other.min_lng >= self.min_lng
            && other.max_lng <= self.max_lng
    }

    /// Midpoint as (lat, lng)
    pub fn center(&self) -> (f64, f64) {
        ((self.min_lat + self.max_lat) / 2.0, (self.min_lng + self.max_lng) / 2.0)
    }

    pub fn lat_span(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn lng_span(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    /// Grow the box by the given margins on every side
    pub fn expand(&self, lat_margin: f64, lng_margin: f64) -> Self {
        Self::new(
            self.min_lat - lat_margin,
            self.min_lng - lng_margin,
            self.max_lat + lat_margin,
            self.max_lng + lng_margin,
        )
    }

    /// Clamp latitudes to the poles. Longitudes are left untouched so that
    /// antimeridian crossings stay detectable.
    pub fn clamp_latitude(&self) -> Self {
        Self::new(
            self.min_lat.clamp(MIN_LAT, MAX_LAT),
            self.min_lng,
            self.max_lat.clamp(MIN_LAT, MAX_LAT),
            self.max_lng,
        )
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.min_lng < MIN_LNG || self.max_lng > MAX_LNG
    }

    /// Same box moved east by `offset` degrees of longitude
    pub fn shift_lng(&self, offset: f64) -> Self {
        Self::new(self.min_lat, self.min_lng + offset, self.max_lat, self.max_lng + offset)
    }

    /// Split a box that extends past ±180° into boxes inside the canonical
    /// longitude range. Boxes already inside the range are returned as-is.
    pub fn split_antimeridian(&self) -> Vec<BoundingBox> {
        self.split_antimeridian_with_offsets()
            .into_iter()
            .map(|(part, _)| part)
            .collect()
    }

    /// Like [`split_antimeridian`](Self::split_antimeridian), pairing each part
    /// with the longitude offset that maps it back into this box's frame
    /// (`part.shift_lng(offset)` lies inside `self`).
    pub fn split_antimeridian_with_offsets(&self) -> Vec<(BoundingBox, f64)> {
        if self.lng_span() >= MAX_LNG - MIN_LNG {
            let offset = self.min_lng - MIN_LNG;
            return vec![(Self::new(self.min_lat, MIN_LNG, self.max_lat, MAX_LNG), offset)];
        }

        if self.min_lng < MIN_LNG {
            vec![
                (Self::new(self.min_lat, self.min_lng + 360.0, self.max_lat, MAX_LNG), -360.0),
                (Self::new(self.min_lat, MIN_LNG, self.max_lat, self.max_lng), 0.0),
            ]
        } else if self.max_lng > MAX_LNG {
            vec![
                (Self::new(self.min_lat, self.min_lng, self.max_lat, MAX_LNG), 0.0),
                (Self::new(self.min_lat, MIN_LNG, self.max_lat, self.max_lng - 360.0), 360.0),
            ]
        } else {
            vec![(*self, 0.0)]
        }
    }
}

/// Map region of interest, as reported by the rendering surface
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center_lat: f64,
    pub center_lon: f64,
    pub lat_delta: f64,
    pub lon_delta: f64,
}

impl Viewport {
    pub fn new(center_lat: f64, center_lon: f64, lat_delta: f64, lon_delta: f64) -> Self {
        Self { center_lat, center_lon, lat_delta, lon_delta }
    }

    /// Copy with every field finite: a NaN centre becomes 0 and infinite
    /// values are clamped to the coordinate range. Non-finite deltas
    /// become 0 (NaN) or the full span (infinite).
    pub fn normalized(&self) -> Self {
        Self {
            center_lat: finite_or_clamped(self.center_lat, MIN_LAT, MAX_LAT),
            center_lon: finite_or_clamped(self.center_lon, MIN_LNG, MAX_LNG),
            lat_delta: finite_or_clamped(self.lat_delta, 0.0, MAX_LAT - MIN_LAT),
            lon_delta: finite_or_clamped(self.lon_delta, 0.0, MAX_LNG - MIN_LNG),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.center_lat.is_finite()
            && self.center_lon.is_finite()
            && self.lat_delta.is_finite()
            && self.lon_delta.is_finite()
    }

    /// The visible rectangle
    pub fn bounds(&self) -> BoundingBox {
        self.buffered(0.0)
    }

    /// The visible rectangle grown by `buffer` viewport-sizes on every side
    pub fn buffered(&self, buffer: f64) -> BoundingBox {
        let half_lat = self.lat_delta.abs() * (0.5 + buffer);
        let half_lon = self.lon_delta.abs() * (0.5 + buffer);
        BoundingBox::new(
            self.center_lat - half_lat,
            self.center_lon - half_lon,
            self.center_lat + half_lat,
            self.center_lon + half_lon,
        )
    }
}

fn finite_or_clamped(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else if value.is_infinite() {
        value.clamp(min, max)
    } else {
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(11.0, 11.0, 12.0, 12.0);
        let edge = BoundingBox::new(10.0, 10.0, 20.0, 20.0);

        assert!(a.intersects(&b));
        assert!(b.intersects(&a));
        assert!(!a.intersects(&c));
        assert!(a.intersects(&edge), "touching edges should intersect");
    }

    #[test]
    fn test_contains() {
        let outer = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        assert!(outer.contains(&BoundingBox::new(1.0, 1.0, 2.0, 2.0)));
        assert!(outer.contains(&outer));
        assert!(!outer.contains(&BoundingBox::new(-1.0, 1.0, 2.0, 2.0)));
        assert!(outer.contains_point(10.0, 0.0));
        assert!(!outer.contains_point(10.1, 0.0));
    }

    #[test]
    fn test_viewport_buffered() {
        let viewport = Viewport::new(49.2827, -123.1207, 0.01, 0.02);

        let visible = viewport.bounds();
        assert!((visible.lat_span() - 0.01).abs() < 1e-12);
        assert!((visible.lng_span() - 0.02).abs() < 1e-12);

        // 0.5 + 1.5 on each side => 4x the viewport span
        let window = viewport.buffered(1.5);
        assert!((window.lat_span() - 0.04).abs() < 1e-12);
        assert!((window.lng_span() - 0.08).abs() < 1e-12);
        assert!(window.contains(&visible));
    }

    #[test]
    fn test_split_antimeridian_east() {
        let bbox = BoundingBox::new(-1.0, 179.0, 1.0, 181.0);
        assert!(bbox.crosses_antimeridian());

        let parts = bbox.split_antimeridian();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], BoundingBox::new(-1.0, 179.0, 1.0, 180.0));
        assert_eq!(parts[1], BoundingBox::new(-1.0, -180.0, 1.0, -179.0));
    }

    #[test]
    fn test_split_antimeridian_west() {
        let parts = BoundingBox::new(-1.0, -182.0, 1.0, -178.0).split_antimeridian();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0], BoundingBox::new(-1.0, 178.0, 1.0, 180.0));
        assert_eq!(parts[1], BoundingBox::new(-1.0, -180.0, 1.0, -178.0));
    }

    #[test]
    fn test_split_inside_range_is_identity() {
        let bbox = BoundingBox::new(0.0, 10.0, 1.0, 11.0);
        assert_eq!(bbox.split_antimeridian(), vec![bbox]);
    }

    #[test]
    fn test_clamp_latitude() {
        let clamped = BoundingBox::new(-95.0, 0.0, 91.0, 1.0).clamp_latitude();
        assert_eq!(clamped.min_lat, -90.0);
        assert_eq!(clamped.max_lat, 90.0);
    }

    #[test]
    fn test_split_offsets_map_parts_back_into_window() {
        let east = BoundingBox::new(-1.0, 179.0, 1.0, 181.0);
        let west = BoundingBox::new(-1.0, -182.0, 1.0, -178.0);

        for bbox in [east, west] {
            for (part, offset) in bbox.split_antimeridian_with_offsets() {
                assert!(part.min_lng >= MIN_LNG && part.max_lng <= MAX_LNG);
                assert!(bbox.contains(&part.shift_lng(offset)), "{:?} + {}", part, offset);
            }
        }
    }

    #[test]
    fn test_normalized_viewport_replaces_non_finite_values() {
        let viewport = Viewport::new(f64::NAN, f64::INFINITY, f64::NAN, f64::INFINITY);
        assert!(!viewport.is_finite());

        let normalized = viewport.normalized();
        assert!(normalized.is_finite());
        assert_eq!(normalized, Viewport::new(0.0, 180.0, 0.0, 360.0));

        let plain = Viewport::new(49.2827, -123.1207, 0.01, 0.02);
        assert_eq!(plain.normalized(), plain);
    }
}
