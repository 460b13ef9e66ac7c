//! FogMap Store - Persistence ports and the explored-area store
//!
//! This crate defines the opaque blob-store port with in-memory and on-disk
//! adapters, and the explored-area store that deduplicates cells and
//! persists them through that port.

pub mod codec;
pub mod explored;
pub mod file;
pub mod memory;
pub mod ports;

pub use explored::{ExploredAreaStore, StoreStats, DEFAULT_STORAGE_KEY};
pub use file::FileBlobStore;
pub use memory::MemoryBlobStore;
pub use ports::BlobStore;
