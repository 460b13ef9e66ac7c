use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FogmapError, Result};

/// Geohash precision: the number of base-32 characters in a cell hash.
///
/// Each additional character subdivides the parent cell into 32 children,
/// so the hash length is always equal to the precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Precision(u8);

impl Precision {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 12;

    /// Street-level cells (~153m x 153m), the default exploration grain
    pub const DEFAULT: Precision = Precision(7);

    /// Create a precision, rejecting values outside 1..=12
    pub fn new(value: u8) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(FogmapError::InvalidPrecision(value))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Hash length for this precision
    pub fn hash_len(self) -> usize {
        self.0 as usize
    }
}

impl Default for Precision {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl TryFrom<u8> for Precision {
    type Error = FogmapError;

    fn try_from(value: u8) -> Result<Self> {
        Self::new(value)
    }
}

impl From<Precision> for u8 {
    fn from(precision: Precision) -> Self {
        precision.0
    }
}

impl fmt::Display for Precision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A ground cell the agent has visited.
///
/// Created once per unique geohash and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploredArea {
    pub geohash: String,

    /// When the cell was first explored (persisted as epoch milliseconds)
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,

    pub precision: Precision,
}

impl ExploredArea {
    pub fn new(geohash: impl Into<String>, precision: Precision, timestamp: DateTime<Utc>) -> Self {
        Self { geohash: geohash.into(), timestamp, precision }
    }

    /// Whether the hash length agrees with the recorded precision
    pub fn is_consistent(&self) -> bool {
        self.geohash.len() == self.precision.hash_len()
    }
}
