use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};

use crate::data::loader::load_dataset;
use crate::data::model::NurseDataset;

// ---------------------------------------------------------------------------
// Dataset store
// ---------------------------------------------------------------------------

/// Holds the currently published dataset snapshot.
///
/// Readers clone the `Arc` and work on that snapshot, so a concurrent
/// reload never shows them a half-replaced dataset. Reloads are serialized
/// behind `reload`; a caller that waited re-checks before touching disk.
pub struct DataStore {
    path: PathBuf,
    current: RwLock<Option<Arc<NurseDataset>>>,
    reload: Mutex<()>,
}

impl DataStore {
    /// An empty store that reads its artifact from `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(None),
            reload: Mutex::new(()),
        }
    }

    /// (Re)load the artifact and publish it.
    ///
    /// On failure the cause is logged and the previously published dataset,
    /// if any, stays active.
    pub async fn load(&self) -> bool {
        let _guard = self.reload.lock().await;
        self.load_locked().await
    }

    async fn load_locked(&self) -> bool {
        let path = self.path.clone();
        let result = tokio::task::spawn_blocking(move || load_dataset(&path)).await;

        match result {
            Ok(Ok(dataset)) => {
                log::info!(
                    "Data loaded successfully from {}: {} nurses ({} rows without a city dropped)",
                    self.path.display(),
                    dataset.len(),
                    dataset.dropped_rows
                );
                if dataset.is_empty() {
                    log::warn!("Loaded dataset contains no nurses");
                }
                for bad in &dataset.rejected {
                    log::warn!(
                        "Row {} ({:?}) cannot be served: {}",
                        bad.row,
                        bad.city_key,
                        bad.reason
                    );
                }
                *self.current.write().await = Some(Arc::new(dataset));
                true
            }
            Ok(Err(e)) => {
                log::error!("Error loading data: {e}");
                false
            }
            Err(e) => {
                log::error!("Error loading data: loader task failed: {e}");
                false
            }
        }
    }

    /// The current snapshot, if a dataset has been loaded.
    pub async fn snapshot(&self) -> Option<Arc<NurseDataset>> {
        self.current.read().await.clone()
    }

    pub async fn is_loaded(&self) -> bool {
        self.current.read().await.is_some()
    }

    /// The current snapshot, attempting one reload when none is published.
    pub async fn snapshot_or_reload(&self) -> Option<Arc<NurseDataset>> {
        if let Some(dataset) = self.snapshot().await {
            return Some(dataset);
        }

        let _guard = self.reload.lock().await;
        // Another request may have finished the reload while we queued.
        if let Some(dataset) = self.snapshot().await {
            return Some(dataset);
        }
        log::warn!("No dataset loaded, retrying load from {}", self.path.display());
        if self.load_locked().await {
            self.snapshot().await
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Shared state injected into every Axum handler.
pub struct AppState {
    pub store: DataStore,
}

impl AppState {
    pub fn new(store: DataStore) -> Self {
        Self { store }
    }
}

pub type SharedState = Arc<AppState>;

#[cfg(test)]
mod tests {
    use std::path::Path;

    use serde_json::json;

    use super::*;

    fn write_nurses(path: &Path, cities: &[&str]) {
        let records: Vec<_> = cities
            .iter()
            .enumerate()
            .map(|(i, city)| {
                json!({
                    "NurseID": i, "FName": "Hala", "LName": "Samir", "PhoneNumber": 1112223334i64,
                    "Email": "hala@example.com", "Experience": 6, "Specialty": "Oncology",
                    "City": city, "Street": "Corniche", "AverageRating": 4.2,
                    "ReviewCount": 8.0, "Comment": "Patient and clear", "Score": 6.5,
                })
            })
            .collect();
        std::fs::write(path, json!(records).to_string()).unwrap();
    }

    #[tokio::test]
    async fn failed_startup_load_leaves_store_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = DataStore::new(dir.path().join("nurses.json"));

        assert!(!store.load().await);
        assert!(!store.is_loaded().await);
        assert!(store.snapshot_or_reload().await.is_none());
    }

    #[tokio::test]
    async fn reloads_lazily_once_the_artifact_appears() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nurses.json");
        let store = DataStore::new(&path);
        assert!(!store.load().await);

        write_nurses(&path, &["Cairo", "Giza"]);
        let dataset = store.snapshot_or_reload().await.expect("reloaded");
        assert_eq!(dataset.len(), 2);
        assert!(store.is_loaded().await);
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nurses.json");
        write_nurses(&path, &["Cairo"]);
        let store = DataStore::new(&path);
        assert!(store.load().await);

        std::fs::write(&path, "[{\"City\": \"Cairo\"}]").unwrap();
        assert!(!store.load().await);

        let dataset = store.snapshot().await.expect("still loaded");
        assert_eq!(dataset.len(), 1);
        assert_eq!(dataset.entries[0].record.specialty, "Oncology");
    }

    #[tokio::test]
    async fn snapshots_survive_a_replacement() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nurses.json");
        write_nurses(&path, &["Cairo"]);
        let store = DataStore::new(&path);
        assert!(store.load().await);
        let before = store.snapshot().await.unwrap();

        write_nurses(&path, &["Cairo", "Alexandria", "Tanta"]);
        assert!(store.load().await);

        assert_eq!(before.len(), 1);
        assert_eq!(store.snapshot().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn concurrent_misses_share_one_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nurses.json");
        write_nurses(&path, &["Cairo"]);
        let store = Arc::new(DataStore::new(&path));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.snapshot_or_reload().await })
            })
            .collect();
        let mut snapshots = Vec::new();
        for task in tasks {
            snapshots.push(task.await.unwrap().expect("loaded"));
        }

        assert!(snapshots.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }
}
