use fogmap_core::config::LayeredConfig;
use fogmap_store::{ExploredAreaStore, FileBlobStore};
use std::path::Path;
use std::sync::Arc;

/// Open and load the explored-area store kept in `data_dir`.
///
/// A missing or corrupt file yields an empty store; the file is (re)written
/// on the first mutation.
pub async fn open_store(data_dir: &Path, config: &LayeredConfig) -> ExploredAreaStore {
    let blob = FileBlobStore::new(data_dir);
    let store = ExploredAreaStore::new(Arc::new(blob), config.storage_key.value.clone());
    store.load().await;
    store
}
