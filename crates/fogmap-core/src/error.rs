//! Error types for FogMap

use thiserror::Error;

#[derive(Debug, Error)]
pub enum FogmapError {
    // Location errors
    #[error("Location permission not granted")]
    PermissionDenied,

    #[error("Fix source error: {0}")]
    FixSource(String),

    // Storage errors
    #[error("Storage error for key '{key}': {reason}")]
    Storage { key: String, reason: String },

    #[error("Malformed persisted data: {0}")]
    MalformedData(String),

    // Geohash errors
    #[error("Invalid precision {0}: expected 1..=12")]
    InvalidPrecision(u8),

    #[error("Invalid geohash '{hash}': {reason}")]
    InvalidGeohash { hash: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for FogmapError {
    fn from(err: serde_json::Error) -> Self {
        FogmapError::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FogmapError>;
