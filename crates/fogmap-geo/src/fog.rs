//! Fog geometry generation
//!
//! Builds a single opaque polygon covering the (buffered) viewport with one
//! hole per explored cell, ready for even-odd fill rendering.
//!
//! # Coverage dedup
//!
//! ```text
//! 1. Query cells intersecting the buffered viewport
//! 2. Group by precision, coarsest first
//! 3. Skip a cell if any processed cell is its prefix (down to the floor)
//! 4. Otherwise emit its rectangle as a hole and mark it processed
//! ```
//!
//! A fine cell whose coarser ancestor already produced a hole lies entirely
//! inside that hole, so emitting it would only create overlapping rings.
//!
//! # Antimeridian
//!
//! A window past ±180° is queried in canonical parts. Holes for cells found
//! in a wrapped part are shifted by ±360° so they sit inside the outer ring,
//! which keeps the window's unwrapped longitudes.

use std::collections::{BTreeMap, HashSet};

use fogmap_core::models::{
    BoundingBox, ExploredArea, FogConfig, FogGeometry, LatLng, Precision, Viewport,
};
use fogmap_core::ports::ExploredAreaQuery;

use crate::geohash;

/// Generates fog polygons for a viewport from an explored-area source
#[derive(Debug, Clone, Default)]
pub struct FogGenerator {
    config: FogConfig,
}

impl FogGenerator {
    pub fn new(config: FogConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &FogConfig {
        &self.config
    }

    /// Viewport grown by the buffer factor, latitude clamped to the poles.
    /// Non-finite viewport values are normalized first.
    pub fn query_window(&self, viewport: &Viewport) -> BoundingBox {
        viewport
            .normalized()
            .buffered(self.config.buffer_factor)
            .clamp_latitude()
    }

    /// Produce the fog polygon and its holes for `viewport`
    pub fn generate<Q>(&self, viewport: &Viewport, source: &Q) -> FogGeometry
    where
        Q: ExploredAreaQuery + ?Sized,
    {
        if !viewport.is_finite() {
            tracing::warn!(viewport = ?viewport, "Non-finite viewport, normalizing");
        }

        let window = self.query_window(viewport);
        let areas = query_window_areas(source, &window);
        let holes = self.shifted_holes(areas.iter().map(|(area, offset)| (area, *offset)));

        tracing::debug!(
            candidates = areas.len(),
            holes = holes.len(),
            "Generated fog geometry"
        );

        FogGeometry {
            outer: self.outer_ring(&window),
            holes,
            style: self.config.style.clone(),
        }
    }

    /// Opaque ring: the query window plus the fixed outer margin
    pub fn outer_ring(&self, window: &BoundingBox) -> Vec<LatLng> {
        let margin = self.config.outer_margin_deg;
        let outer = window.expand(margin, margin).clamp_latitude();
        self.config.outer_winding.ring(&outer)
    }

    /// One ring per area not already covered by a coarser processed cell
    pub fn holes(&self, areas: &[ExploredArea]) -> Vec<Vec<LatLng>> {
        self.shifted_holes(areas.iter().map(|area| (area, 0.0)))
    }

    /// Hole rings with each area's longitude offset applied
    fn shifted_holes<'a, I>(&self, areas: I) -> Vec<Vec<LatLng>>
    where
        I: IntoIterator<Item = (&'a ExploredArea, f64)>,
    {
        let mut by_precision: BTreeMap<Precision, Vec<(&'a ExploredArea, f64)>> = BTreeMap::new();
        for (area, offset) in areas {
            by_precision.entry(area.precision).or_default().push((area, offset));
        }

        let mut processed: HashSet<&'a str> = HashSet::new();
        let mut holes = Vec::new();
        let mut covered = 0usize;

        for group in by_precision.values() {
            for &(area, offset) in group {
                let is_covered = geohash::ancestors(&area.geohash, self.config.ancestor_floor)
                    .any(|prefix| processed.contains(prefix));
                if is_covered {
                    covered += 1;
                    continue;
                }

                match geohash::decode_bbox(&area.geohash) {
                    Ok(bbox) => {
                        holes.push(self.config.hole_winding.ring(&bbox.shift_lng(offset)));
                        processed.insert(area.geohash.as_str());
                    }
                    Err(e) => {
                        tracing::warn!(geohash = %area.geohash, error = %e, "Skipping undecodable cell");
                    }
                }
            }
        }

        if covered > 0 {
            tracing::debug!(covered, "Suppressed cells covered by coarser holes");
        }

        holes
    }
}

/// Query each antimeridian-split part of the window, merging by geohash.
/// Each area carries the longitude offset of the part it was found in.
fn query_window_areas<Q>(source: &Q, window: &BoundingBox) -> Vec<(ExploredArea, f64)>
where
    Q: ExploredAreaQuery + ?Sized,
{
    let mut seen = HashSet::new();
    window
        .split_antimeridian_with_offsets()
        .iter()
        .flat_map(|(part, offset)| {
            source
                .areas_in_bounds(part)
                .into_iter()
                .map(move |area| (area, *offset))
        })
        .filter(|(area, _)| seen.insert(area.geohash.clone()))
        .collect()
}
