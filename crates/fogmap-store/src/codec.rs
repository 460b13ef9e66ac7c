//! Persisted layout of the explored-area collection.
//!
//! Current layout:
//!
//! ```json
//! {"version": 1, "areas": [{"geohash": "c2b2q7x", "timestamp": 1700000000000, "precision": 7}]}
//! ```
//!
//! A bare array of areas (the unversioned layout) is still accepted and is
//! rewritten in the current layout on the next save.

use fogmap_core::error::{FogmapError, Result};
use fogmap_core::models::ExploredArea;
use fogmap_geo::geohash;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct EnvelopeRef<'a> {
    version: u32,
    areas: &'a [ExploredArea],
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Persisted {
    Envelope { version: u32, areas: Vec<Value> },
    Legacy(Vec<Value>),
}

/// Result of decoding a persisted collection
#[derive(Debug, Default)]
pub struct Decoded {
    pub areas: Vec<ExploredArea>,

    /// Records dropped because they were invalid or repeated a geohash
    pub skipped: usize,

    /// Whether the input used the unversioned layout
    pub legacy: bool,
}

/// Serialize a collection in the current layout
pub fn encode(areas: &[ExploredArea]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&EnvelopeRef { version: FORMAT_VERSION, areas })?)
}

/// Parse a persisted collection.
///
/// Fails only when the document as a whole is unreadable. Individual records
/// that do not parse, carry an invalid geohash, or disagree with their
/// precision are dropped and counted.
pub fn decode(bytes: &[u8]) -> Result<Decoded> {
    let persisted: Persisted = serde_json::from_slice(bytes)
        .map_err(|e| FogmapError::MalformedData(e.to_string()))?;

    let (records, legacy) = match persisted {
        Persisted::Envelope { version, areas } if version == FORMAT_VERSION => (areas, false),
        Persisted::Envelope { version, .. } => {
            return Err(FogmapError::MalformedData(format!(
                "unsupported format version {}",
                version
            )))
        }
        Persisted::Legacy(areas) => (areas, true),
    };

    let mut decoded = Decoded { legacy, ..Decoded::default() };
    let mut seen = HashSet::new();

    for record in records {
        match serde_json::from_value::<ExploredArea>(record) {
            Ok(area) if is_valid(&area) && seen.insert(area.geohash.clone()) => {
                decoded.areas.push(area);
            }
            Ok(area) => {
                tracing::warn!(geohash = %area.geohash, "Dropping invalid or repeated area");
                decoded.skipped += 1;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Dropping unreadable area record");
                decoded.skipped += 1;
            }
        }
    }

    Ok(decoded)
}

fn is_valid(area: &ExploredArea) -> bool {
    area.is_consistent() && geohash::validate(&area.geohash).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use fogmap_core::models::Precision;

    fn area(hash: &str) -> ExploredArea {
        let precision = Precision::new(hash.len() as u8).unwrap();
        ExploredArea::new(hash, precision, Utc.timestamp_millis_opt(1_700_000_000_000).unwrap())
    }

    #[test]
    fn test_encode_writes_versioned_envelope() {
        let bytes = encode(&[area("c2b2q7x")]).unwrap();
        let json: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(json["version"], 1);
        assert_eq!(json["areas"][0]["geohash"], "c2b2q7x");
        assert_eq!(json["areas"][0]["timestamp"], 1_700_000_000_000i64);
        assert_eq!(json["areas"][0]["precision"], 7);
    }

    #[test]
    fn test_decode_current_layout_preserves_order() {
        let areas = vec![area("c2b2q7x"), area("c2b2q7y"), area("c2b2q")];
        let decoded = decode(&encode(&areas).unwrap()).unwrap();

        assert_eq!(decoded.areas, areas);
        assert_eq!(decoded.skipped, 0);
        assert!(!decoded.legacy);
    }

    #[test]
    fn test_decode_legacy_array() {
        let bytes = br#"[{"geohash":"c2b2q7x","timestamp":1700000000000,"precision":7}]"#;
        let decoded = decode(bytes).unwrap();

        assert!(decoded.legacy);
        assert_eq!(decoded.areas, vec![area("c2b2q7x")]);
    }

    #[test]
    fn test_decode_drops_bad_records() {
        let bytes = br#"{"version":1,"areas":[
            {"geohash":"c2b2q7x","timestamp":1700000000000,"precision":7},
            {"geohash":"c2b2q7x","timestamp":1700000000001,"precision":7},
            {"geohash":"c2b2q7","timestamp":1700000000000,"precision":7},
            {"geohash":"c2b2q7o","timestamp":1700000000000,"precision":7},
            {"geohash":"c2b2q7z","precision":7},
            "not an area"
        ]}"#;
        let decoded = decode(bytes).unwrap();

        assert_eq!(decoded.areas, vec![area("c2b2q7x")]);
        assert_eq!(decoded.skipped, 5);
    }

    #[test]
    fn test_decode_rejects_unreadable_documents() {
        assert!(matches!(decode(b"{not json"), Err(FogmapError::MalformedData(_))));
        assert!(matches!(decode(br#"{"areas":[]}"#), Err(FogmapError::MalformedData(_))));
        assert!(matches!(
            decode(br#"{"version":2,"areas":[]}"#),
            Err(FogmapError::MalformedData(_))
        ));
    }
}
