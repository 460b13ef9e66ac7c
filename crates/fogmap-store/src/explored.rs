//! Explored-area store
//!
//! Holds the set of explored geohash cells in memory, rejects duplicates in
//! O(1) through an index kept in lockstep with the collection, and persists
//! the full collection through a [`BlobStore`] after every mutation.
//!
//! In-memory state is authoritative. A mutation is visible to readers before
//! its write is awaited, and a failed write is logged and counted but never
//! rolled back. Writes are serialized and each one snapshots the latest
//! collection, so the last completed write always includes every earlier
//! mutation.
//!
//! The `RwLock`/`Mutex` guards use `unwrap()`: a poisoned lock means another
//! thread panicked mid-mutation, which is unrecoverable.

use chrono::{DateTime, Utc};
use fogmap_core::models::{BoundingBox, ExploredArea, Precision};
use fogmap_core::ports::ExploredAreaQuery;
use fogmap_geo::geohash;
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use crate::codec;
use crate::ports::BlobStore;

/// Key the collection is persisted under unless configured otherwise
pub const DEFAULT_STORAGE_KEY: &str = "explored_areas";

#[derive(Default)]
struct State {
    areas: Vec<ExploredArea>,
    index: HashSet<String>,
    /// Bumped on every mutation; keys the query memo
    generation: u64,
    initialized: bool,
}

impl State {
    fn replace(&mut self, areas: Vec<ExploredArea>) {
        self.index = areas.iter().map(|a| a.geohash.clone()).collect();
        self.areas = areas;
        self.generation += 1;
    }
}

struct QueryMemo {
    generation: u64,
    bounds: BoundingBox,
    result: Vec<ExploredArea>,
}

struct Inner {
    blob: Arc<dyn BlobStore>,
    key: String,
    state: RwLock<State>,
    memo: Mutex<Option<QueryMemo>>,
    write_lock: tokio::sync::Mutex<()>,
    write_failures: AtomicU64,
}

/// Summary of the store contents
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreStats {
    pub total: usize,
    pub by_precision: BTreeMap<u8, usize>,
    pub write_failures: u64,
    pub initialized: bool,
}

/// Shared handle to the explored-area collection
#[derive(Clone)]
pub struct ExploredAreaStore {
    inner: Arc<Inner>,
}

impl fmt::Debug for ExploredAreaStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExploredAreaStore")
            .field("key", &self.inner.key)
            .field("len", &self.len())
            .finish()
    }
}

impl ExploredAreaStore {
    /// Create an empty, not yet loaded store persisting under `key`
    pub fn new(blob: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                blob,
                key: key.into(),
                state: RwLock::new(State::default()),
                memo: Mutex::new(None),
                write_lock: tokio::sync::Mutex::new(()),
                write_failures: AtomicU64::new(0),
            }),
        }
    }

    /// Create a store persisting under [`DEFAULT_STORAGE_KEY`]
    pub fn with_default_key(blob: Arc<dyn BlobStore>) -> Self {
        Self::new(blob, DEFAULT_STORAGE_KEY)
    }

    pub fn key(&self) -> &str {
        &self.inner.key
    }

    /// Load the persisted collection, replacing the in-memory state.
    ///
    /// A missing, unreadable or corrupt blob yields an empty collection.
    /// The store is marked initialized either way.
    pub async fn load(&self) -> Vec<ExploredArea> {
        let key = self.inner.key.as_str();
        let areas = match self.inner.blob.get(key).await {
            Ok(Some(bytes)) => match codec::decode(&bytes) {
                Ok(decoded) => {
                    if decoded.legacy {
                        tracing::info!(key, "Loaded unversioned layout, will upgrade on next save");
                    }
                    if decoded.skipped > 0 {
                        tracing::warn!(key, skipped = decoded.skipped, "Dropped invalid records");
                    }
                    decoded.areas
                }
                Err(e) => {
                    tracing::warn!(key, error = %e, "Persisted areas are corrupt, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => {
                tracing::debug!(key, "No persisted areas");
                Vec::new()
            }
            Err(e) => {
                tracing::warn!(key, error = %e, "Failed to read persisted areas, starting empty");
                Vec::new()
            }
        };

        let mut state = self.inner.state.write().unwrap();
        state.replace(areas.clone());
        state.initialized = true;
        tracing::info!(key, count = areas.len(), "Loaded explored areas");
        areas
    }

    /// Record the cell containing (lat, lon), stamped with the current time.
    ///
    /// Returns `None` without writing anything when the cell is already
    /// explored.
    pub async fn try_insert(&self, lat: f64, lon: f64, precision: Precision) -> Option<ExploredArea> {
        self.try_insert_at(lat, lon, precision, Utc::now()).await
    }

    /// [`try_insert`](Self::try_insert) with an explicit exploration time
    pub async fn try_insert_at(
        &self,
        lat: f64,
        lon: f64,
        precision: Precision,
        timestamp: DateTime<Utc>,
    ) -> Option<ExploredArea> {
        let hash = geohash::encode(lat, lon, precision);
        let area = {
            let mut state = self.inner.state.write().unwrap();
            if state.index.contains(&hash) {
                return None;
            }
            let area = ExploredArea::new(hash.clone(), precision, timestamp);
            state.index.insert(hash);
            state.areas.push(area.clone());
            state.generation += 1;
            area
        };

        tracing::debug!(geohash = %area.geohash, precision = %precision, "Explored new cell");
        self.persist().await;
        Some(area)
    }

    /// Replace the whole collection with the single cell at (lat, lon)
    pub async fn reset(&self, lat: f64, lon: f64, precision: Precision) -> ExploredArea {
        let hash = geohash::encode(lat, lon, precision);
        let area = ExploredArea::new(hash, precision, Utc::now());
        {
            let mut state = self.inner.state.write().unwrap();
            state.replace(vec![area.clone()]);
            state.initialized = true;
        }

        tracing::info!(geohash = %area.geohash, "Reset explored areas");
        self.persist().await;
        area
    }

    /// Areas whose cell box intersects `bounds` (touching counts).
    ///
    /// The last answer is memoized until the next mutation, so repeated
    /// renders of an unchanged viewport skip the scan.
    pub fn query_in_bounds(&self, bounds: &BoundingBox) -> Vec<ExploredArea> {
        let state = self.inner.state.read().unwrap();
        let mut memo = self.inner.memo.lock().unwrap();

        if let Some(cached) = memo.as_ref() {
            if cached.generation == state.generation && cached.bounds == *bounds {
                tracing::debug!(count = cached.result.len(), "Query served from cache");
                return cached.result.clone();
            }
        }

        let result: Vec<ExploredArea> = state
            .areas
            .iter()
            .filter(|area| match geohash::decode_bbox(&area.geohash) {
                Ok(cell) => cell.intersects(bounds),
                Err(_) => false,
            })
            .cloned()
            .collect();

        *memo = Some(QueryMemo {
            generation: state.generation,
            bounds: *bounds,
            result: result.clone(),
        });
        result
    }

    /// Snapshot of every area in insertion order
    pub fn areas(&self) -> Vec<ExploredArea> {
        self.inner.state.read().unwrap().areas.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.state.read().unwrap().areas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, geohash: &str) -> bool {
        self.inner.state.read().unwrap().index.contains(geohash)
    }

    /// Whether `load` or `reset` has run
    pub fn is_initialized(&self) -> bool {
        self.inner.state.read().unwrap().initialized
    }

    /// Number of persistence writes that have failed
    pub fn write_failures(&self) -> u64 {
        self.inner.write_failures.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> StoreStats {
        let state = self.inner.state.read().unwrap();
        let mut by_precision = BTreeMap::new();
        for area in &state.areas {
            *by_precision.entry(area.precision.get()).or_insert(0) += 1;
        }

        StoreStats {
            total: state.areas.len(),
            by_precision,
            write_failures: self.write_failures(),
            initialized: state.initialized,
        }
    }

    async fn persist(&self) {
        let _guard = self.inner.write_lock.lock().await;
        let key = self.inner.key.as_str();

        let (encoded, count) = {
            let state = self.inner.state.read().unwrap();
            (codec::encode(&state.areas), state.areas.len())
        };

        let result = match encoded {
            Ok(bytes) => self.inner.blob.set(key, bytes).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(()) => tracing::debug!(key, count, "Persisted explored areas"),
            Err(e) => {
                let failures = self.inner.write_failures.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::error!(key, count, failures, error = %e, "Failed to persist explored areas");
            }
        }
    }
}

impl ExploredAreaQuery for ExploredAreaStore {
    fn areas_in_bounds(&self, bounds: &BoundingBox) -> Vec<ExploredArea> {
        self.query_in_bounds(bounds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBlobStore;

    fn store_with(blob: &MemoryBlobStore) -> ExploredAreaStore {
        ExploredAreaStore::with_default_key(Arc::new(blob.clone()))
    }

    #[tokio::test]
    async fn test_try_insert_is_idempotent() {
        let blob = MemoryBlobStore::new();
        let store = store_with(&blob);

        let first = store.try_insert(49.2827, -123.1207, Precision::DEFAULT).await;
        let second = store.try_insert(49.2827, -123.1207, Precision::DEFAULT).await;

        assert!(first.is_some());
        assert!(second.is_none());
        assert_eq!(store.len(), 1);
        assert_eq!(blob.write_count(), 1, "duplicate insert must not write");
    }

    #[tokio::test]
    async fn test_load_missing_blob_is_empty_and_initialized() {
        let store = store_with(&MemoryBlobStore::new());
        assert!(!store.is_initialized());

        assert!(store.load().await.is_empty());
        assert!(store.is_initialized());
    }

    #[tokio::test]
    async fn test_load_corrupt_blob_is_empty() {
        let blob = MemoryBlobStore::with_blob(DEFAULT_STORAGE_KEY, b"{{{".to_vec());
        let store = store_with(&blob);

        assert!(store.load().await.is_empty());
        assert!(store.is_initialized());
    }

    #[tokio::test]
    async fn test_load_rebuilds_index() {
        let blob = MemoryBlobStore::new();
        let writer = store_with(&blob);
        let area = writer.try_insert(49.2827, -123.1207, Precision::DEFAULT).await.unwrap();

        let reader = store_with(&blob);
        assert_eq!(reader.load().await, vec![area.clone()]);
        assert!(reader.contains(&area.geohash));
        assert!(reader.try_insert(49.2827, -123.1207, Precision::DEFAULT).await.is_none());
    }

    #[tokio::test]
    async fn test_legacy_layout_is_upgraded_on_next_write() {
        let legacy = br#"[{"geohash":"c2b2q7x","timestamp":1700000000000,"precision":7}]"#;
        let blob = MemoryBlobStore::with_blob(DEFAULT_STORAGE_KEY, legacy.to_vec());
        let store = store_with(&blob);

        assert_eq!(store.load().await.len(), 1);
        store.try_insert(0.0, 0.0, Precision::DEFAULT).await.unwrap();

        let json: serde_json::Value =
            serde_json::from_slice(&blob.raw(DEFAULT_STORAGE_KEY).unwrap()).unwrap();
        assert_eq!(json["version"], 1);
        assert_eq!(json["areas"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_reset_then_query() {
        let store = store_with(&MemoryBlobStore::new());
        store.try_insert(10.0, 10.0, Precision::DEFAULT).await;
        store.try_insert(20.0, 20.0, Precision::DEFAULT).await;

        let area = store.reset(49.2827, -123.1207, Precision::DEFAULT).await;
        assert_eq!(store.areas(), vec![area.clone()]);
        assert!(!store.contains(&geohash::encode(10.0, 10.0, Precision::DEFAULT)));

        let around = BoundingBox::new(49.28, -123.13, 49.29, -123.11);
        let elsewhere = BoundingBox::new(10.0, 10.0, 11.0, 11.0);
        assert_eq!(store.query_in_bounds(&around), vec![area]);
        assert!(store.query_in_bounds(&elsewhere).is_empty());
    }

    #[tokio::test]
    async fn test_query_memo_is_invalidated_by_insert() {
        let store = store_with(&MemoryBlobStore::new());
        let bounds = BoundingBox::new(49.0, -124.0, 50.0, -123.0);

        assert!(store.query_in_bounds(&bounds).is_empty());
        assert!(store.query_in_bounds(&bounds).is_empty());

        store.try_insert(49.2827, -123.1207, Precision::DEFAULT).await;
        assert_eq!(store.query_in_bounds(&bounds).len(), 1);
    }

    #[tokio::test]
    async fn test_write_failure_keeps_memory_state() {
        let blob = MemoryBlobStore::new();
        blob.set_fail_writes(true);
        let store = store_with(&blob);

        let area = store.try_insert(49.2827, -123.1207, Precision::DEFAULT).await;

        assert!(area.is_some());
        assert_eq!(store.len(), 1);
        assert_eq!(store.write_failures(), 1);
        assert!(blob.raw(DEFAULT_STORAGE_KEY).is_none());

        // Next successful write carries the earlier mutation too
        blob.set_fail_writes(false);
        store.try_insert(0.0, 0.0, Precision::DEFAULT).await;
        let reader = store_with(&blob);
        assert_eq!(reader.load().await.len(), 2);
    }

    #[tokio::test]
    async fn test_stats_counts_by_precision() {
        let store = store_with(&MemoryBlobStore::new());
        store.try_insert(1.0, 1.0, Precision::new(6).unwrap()).await;
        store.try_insert(1.0, 1.0, Precision::DEFAULT).await;
        store.try_insert(5.0, 5.0, Precision::DEFAULT).await;

        let stats = store.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.by_precision.get(&6), Some(&1));
        assert_eq!(stats.by_precision.get(&7), Some(&2));
        assert_eq!(stats.write_failures, 0);
    }
}
