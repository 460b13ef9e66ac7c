//! Conversions from fog geometry to `geo` and GeoJSON types.
//!
//! Rings are closed on conversion (first vertex repeated at the end), which
//! both `geo` and RFC 7946 expect. Coordinates are emitted as [lng, lat].

use fogmap_core::models::{FogGeometry, LatLng};
use geo::{Coord, LineString, Polygon};
use geojson::{Feature, FeatureCollection, Geometry, Value};
use serde_json::{Map, Value as JsonValue};

/// Export helpers for [`FogGeometry`]
pub trait FogGeometryExt {
    /// Polygon with the outer ring as exterior and one interior per hole
    fn to_polygon(&self) -> Polygon<f64>;

    /// GeoJSON feature carrying the fill style as simplestyle properties
    fn to_geojson_feature(&self) -> Feature;

    /// Single-feature collection, convenient for writing to disk
    fn to_feature_collection(&self) -> FeatureCollection;
}

impl FogGeometryExt for FogGeometry {
    fn to_polygon(&self) -> Polygon<f64> {
        Polygon::new(
            to_line_string(&self.outer),
            self.holes.iter().map(|hole| to_line_string(hole)).collect(),
        )
    }

    fn to_geojson_feature(&self) -> Feature {
        let mut rings = Vec::with_capacity(self.holes.len() + 1);
        rings.push(closed_positions(&self.outer));
        rings.extend(self.holes.iter().map(|hole| closed_positions(hole)));

        let mut properties = Map::new();
        properties.insert("fill".to_string(), JsonValue::from(self.style.color.clone()));
        properties.insert("fill-opacity".to_string(), JsonValue::from(self.style.opacity));
        properties.insert("holes".to_string(), JsonValue::from(self.holes.len()));

        Feature {
            geometry: Some(Geometry::new(Value::Polygon(rings))),
            properties: Some(properties),
            id: None,
            bbox: None,
            foreign_members: None,
        }
    }

    fn to_feature_collection(&self) -> FeatureCollection {
        FeatureCollection {
            features: vec![self.to_geojson_feature()],
            bbox: None,
            foreign_members: None,
        }
    }
}

fn to_line_string(ring: &[LatLng]) -> LineString<f64> {
    ring.iter()
        .map(|v| Coord { x: v.longitude, y: v.latitude })
        .collect::<Vec<_>>()
        .into()
}

fn closed_positions(ring: &[LatLng]) -> Vec<Vec<f64>> {
    let mut positions: Vec<Vec<f64>> =
        ring.iter().map(|v| vec![v.longitude, v.latitude]).collect();
    if let Some(first) = positions.first().cloned() {
        if positions.last() != Some(&first) {
            positions.push(first);
        }
    }
    positions
}

#[cfg(test)]
mod tests {
    use super::*;
    use fogmap_core::models::{BoundingBox, FogConfig, FogStyle, RingWinding};
    use geo::Winding;

    fn sample_fog() -> FogGeometry {
        let config = FogConfig::default();
        let window = BoundingBox::new(49.0, -124.0, 50.0, -123.0);
        let cell = BoundingBox::new(49.4, -123.6, 49.5, -123.5);
        FogGeometry {
            outer: config.outer_winding.ring(&window),
            holes: vec![config.hole_winding.ring(&cell)],
            style: FogStyle::default(),
        }
    }

    #[test]
    fn test_polygon_rings_are_closed_with_opposite_windings() {
        let polygon = sample_fog().to_polygon();

        assert_eq!(polygon.exterior().0.len(), 5);
        assert!(polygon.exterior().is_closed());
        assert!(polygon.exterior().is_ccw());

        assert_eq!(polygon.interiors().len(), 1);
        assert!(polygon.interiors()[0].is_cw());
    }

    #[test]
    fn test_geojson_feature() {
        let feature = sample_fog().to_geojson_feature();

        let geometry = feature.geometry.as_ref().unwrap();
        match &geometry.value {
            Value::Polygon(rings) => {
                assert_eq!(rings.len(), 2);
                for ring in rings {
                    assert_eq!(ring.len(), 5);
                    assert_eq!(ring.first(), ring.last());
                }
                // [lng, lat] order
                assert_eq!(rings[0][0], vec![-124.0, 49.0]);
            }
            other => panic!("Expected polygon, got {:?}", other),
        }

        let properties = feature.properties.as_ref().unwrap();
        assert_eq!(properties["fill"], "#000000");
        assert_eq!(properties["fill-opacity"], 0.8);
        assert_eq!(properties["holes"], 1);
    }

    #[test]
    fn test_feature_collection_serializes() {
        let collection = sample_fog().to_feature_collection();
        let json = serde_json::to_string(&collection).unwrap();

        assert!(json.contains("\"FeatureCollection\""));
        assert!(json.contains("\"Polygon\""));
        let parsed: geojson::GeoJson = json.parse().unwrap();
        assert!(matches!(parsed, geojson::GeoJson::FeatureCollection(_)));
    }

    #[test]
    fn test_clockwise_outer_is_preserved() {
        let window = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let fog = FogGeometry {
            outer: RingWinding::Clockwise.ring(&window),
            holes: vec![],
            style: FogStyle::default(),
        };
        assert!(fog.to_polygon().exterior().is_cw());
    }
}
