//! Fog overlay types handed to the renderer.

use serde::{Deserialize, Serialize};

use super::geometry::{BoundingBox, LatLng};

/// Vertex order of a rectangle ring, viewed with north up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RingWinding {
    /// SW, NW, NE, SE
    Clockwise,
    /// SW, SE, NE, NW
    CounterClockwise,
}

impl RingWinding {
    /// Four corners of `bbox` in this winding. The ring is not closed;
    /// renderers close it implicitly.
    pub fn ring(&self, bbox: &BoundingBox) -> Vec<LatLng> {
        let sw = LatLng::new(bbox.min_lat, bbox.min_lng);
        let nw = LatLng::new(bbox.max_lat, bbox.min_lng);
        let ne = LatLng::new(bbox.max_lat, bbox.max_lng);
        let se = LatLng::new(bbox.min_lat, bbox.max_lng);

        match self {
            RingWinding::Clockwise => vec![sw, nw, ne, se],
            RingWinding::CounterClockwise => vec![sw, se, ne, nw],
        }
    }

    pub fn reversed(&self) -> Self {
        match self {
            RingWinding::Clockwise => RingWinding::CounterClockwise,
            RingWinding::CounterClockwise => RingWinding::Clockwise,
        }
    }
}

/// Fill settings for the fog polygon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogStyle {
    pub color: String,
    pub opacity: f64,
}

impl Default for FogStyle {
    fn default() -> Self {
        Self { color: "#000000".to_string(), opacity: 0.8 }
    }
}

/// Tuning for fog geometry generation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogConfig {
    /// Extra viewport-sizes queried on each side to avoid pop-in while panning
    pub buffer_factor: f64,

    /// Degrees added around the query window for the opaque outer ring
    pub outer_margin_deg: f64,

    /// Shortest ancestor prefix consulted when suppressing covered cells
    pub ancestor_floor: u8,

    pub outer_winding: RingWinding,
    pub hole_winding: RingWinding,
    pub style: FogStyle,
}

impl Default for FogConfig {
    fn default() -> Self {
        Self {
            buffer_factor: 1.5,
            outer_margin_deg: 1.0,
            ancestor_floor: 6,
            outer_winding: RingWinding::CounterClockwise,
            hole_winding: RingWinding::Clockwise,
            style: FogStyle::default(),
        }
    }
}

/// Opaque outer ring with one transparent hole per visible explored cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FogGeometry {
    pub outer: Vec<LatLng>,
    pub holes: Vec<Vec<LatLng>>,
    pub style: FogStyle,
}

impl FogGeometry {
    pub fn hole_count(&self) -> usize {
        self.holes.len()
    }

    /// Fully opaque fog: no explored cell in view
    pub fn is_opaque(&self) -> bool {
        self.holes.is_empty()
    }
}
