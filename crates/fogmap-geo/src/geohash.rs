//! Geohash codec
//!
//! Encodes a coordinate into a base-32 cell identifier by recursively
//! bisecting the world box, alternating longitude and latitude bits
//! (longitude first). Each character carries five bits, so a hash of length
//! `n` names a cell nested inside the cell named by its first `n - 1`
//! characters.

use fogmap_core::error::{FogmapError, Result};
use fogmap_core::models::geometry::{MAX_LAT, MAX_LNG, MIN_LAT, MIN_LNG};
use fogmap_core::models::{BoundingBox, Precision};

const BASE32: &[u8; 32] = b"0123456789bcdefghjkmnpqrstuvwxyz";
const BITS_PER_CHAR: u32 = 5;

/// Encode a coordinate as a geohash of `precision` characters.
///
/// Out-of-range coordinates are clamped to [-90, 90] / [-180, 180].
/// NaN is treated as 0.
pub fn encode(lat: f64, lon: f64, precision: Precision) -> String {
    let lat = clamp_coord(lat, MIN_LAT, MAX_LAT);
    let lon = clamp_coord(lon, MIN_LNG, MAX_LNG);

    let (mut lat_lo, mut lat_hi) = (MIN_LAT, MAX_LAT);
    let (mut lon_lo, mut lon_hi) = (MIN_LNG, MAX_LNG);

    let mut hash = String::with_capacity(precision.hash_len());
    let mut even = true;
    let mut bits = 0;
    let mut index = 0usize;

    while hash.len() < precision.hash_len() {
        if even {
            let mid = (lon_lo + lon_hi) / 2.0;
            if lon >= mid {
                index = index * 2 + 1;
                lon_lo = mid;
            } else {
                index *= 2;
                lon_hi = mid;
            }
        } else {
            let mid = (lat_lo + lat_hi) / 2.0;
            if lat >= mid {
                index = index * 2 + 1;
                lat_lo = mid;
            } else {
                index *= 2;
                lat_hi = mid;
            }
        }
        even = !even;

        bits += 1;
        if bits == BITS_PER_CHAR {
            hash.push(BASE32[index] as char);
            bits = 0;
            index = 0;
        }
    }

    hash
}

/// Decode a geohash into the closed box of its cell.
///
/// Accepts upper- or lower-case input. Fails on empty hashes, hashes longer
/// than 12 characters, and characters outside the geohash alphabet.
pub fn decode_bbox(hash: &str) -> Result<BoundingBox> {
    validate_len(hash)?;

    let (mut lat_lo, mut lat_hi) = (MIN_LAT, MAX_LAT);
    let (mut lon_lo, mut lon_hi) = (MIN_LNG, MAX_LNG);
    let mut even = true;

    for c in hash.chars() {
        let value = char_value(c).ok_or_else(|| FogmapError::InvalidGeohash {
            hash: hash.to_string(),
            reason: format!("'{}' is not a geohash character", c),
        })?;

        for shift in (0..BITS_PER_CHAR).rev() {
            let bit = (value >> shift) & 1;
            if even {
                let mid = (lon_lo + lon_hi) / 2.0;
                if bit == 1 {
                    lon_lo = mid;
                } else {
                    lon_hi = mid;
                }
            } else {
                let mid = (lat_lo + lat_hi) / 2.0;
                if bit == 1 {
                    lat_lo = mid;
                } else {
                    lat_hi = mid;
                }
            }
            even = !even;
        }
    }

    Ok(BoundingBox::new(lat_lo, lon_lo, lat_hi, lon_hi))
}

/// Decode a geohash to the (lat, lon) midpoint of its cell
pub fn decode_center(hash: &str) -> Result<(f64, f64)> {
    Ok(decode_bbox(hash)?.center())
}

/// The enclosing cell one character up, if any
pub fn parent(hash: &str) -> Option<&str> {
    if hash.len() > 1 && hash.is_ascii() {
        Some(&hash[..hash.len() - 1])
    } else {
        None
    }
}

/// Strict prefixes of `hash` from longest down to length `floor`.
///
/// Yields nothing when `floor` is not shorter than the hash.
pub fn ancestors(hash: &str, floor: u8) -> impl Iterator<Item = &str> {
    let floor = (floor as usize).max(1);
    let end = if hash.is_ascii() { hash.len() } else { 0 };
    (floor..end).rev().map(move |len| &hash[..len])
}

/// Cell size in degrees as (lat_span, lon_span)
pub fn cell_dimensions(precision: Precision) -> (f64, f64) {
    let total_bits = precision.get() as i32 * BITS_PER_CHAR as i32;
    let lon_bits = (total_bits + 1) / 2;
    let lat_bits = total_bits / 2;
    (
        (MAX_LAT - MIN_LAT) / 2f64.powi(lat_bits),
        (MAX_LNG - MIN_LNG) / 2f64.powi(lon_bits),
    )
}

/// Check a hash for length and alphabet without decoding it
pub fn validate(hash: &str) -> Result<Precision> {
    validate_len(hash)?;
    if let Some(c) = hash.chars().find(|c| char_value(*c).is_none()) {
        return Err(FogmapError::InvalidGeohash {
            hash: hash.to_string(),
            reason: format!("'{}' is not a geohash character", c),
        });
    }
    Precision::new(hash.len() as u8)
}

fn validate_len(hash: &str) -> Result<()> {
    if hash.is_empty() || hash.len() > Precision::MAX as usize {
        return Err(FogmapError::InvalidGeohash {
            hash: hash.to_string(),
            reason: format!("length must be 1..={}", Precision::MAX),
        });
    }
    Ok(())
}

fn char_value(c: char) -> Option<u8> {
    let c = c.to_ascii_lowercase();
    BASE32.iter().position(|&b| b as char == c).map(|i| i as u8)
}

fn clamp_coord(value: f64, min: f64, max: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(min, max)
    }
}
