//! FogMap Core - Domain models, errors, and configuration
//!
//! This crate contains the core domain types and port definitions shared by the
//! geohash codec, the explored-area store, the tracking controller and the fog
//! geometry generator.

pub mod config;
pub mod error;
pub mod models;
pub mod ports;

pub use error::{FogmapError, Result};
