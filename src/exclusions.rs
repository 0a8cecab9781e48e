use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// On-disk store shape, owned by the downstream publishing stage: one entry
/// per video it has already processed.
#[derive(Debug, Default, Deserialize)]
struct ExclusionStore {
    #[serde(default)]
    videos: Vec<StoredVideo>,
}

#[derive(Debug, Deserialize)]
struct StoredVideo {
    #[serde(default, rename = "videoId")]
    video_id: String,
    #[serde(default, rename = "uploadedId")]
    uploaded_id: String,
}

/// One immutable view of the exclusion set.
///
/// Cheap to clone and safe to hold for a whole crawl session while the
/// registry reloads behind it.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSnapshot {
    ids: Arc<HashSet<String>>,
    version: u64,
}

impl ExclusionSnapshot {
    /// Build a snapshot directly from ids, outside any registry.
    pub fn from_ids(ids: impl IntoIterator<Item = String>) -> Self {
        Self {
            ids: Arc::new(ids.into_iter().collect()),
            version: 0,
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Monotonically increasing per registry; later reloads have higher
    /// versions.
    pub fn version(&self) -> u64 {
        self.version
    }
}

/// Ids a downstream stage already processed, read from a persisted JSON
/// store.
///
/// The registry hands out versioned immutable snapshots. `reload` re-reads
/// the store and installs a fresh snapshot atomically; snapshots already held
/// by live sessions are unaffected until those sessions re-query.
#[derive(Debug, Clone)]
pub struct ExclusionRegistry {
    store_path: PathBuf,
    current: Arc<RwLock<ExclusionSnapshot>>,
}

impl ExclusionRegistry {
    /// Open a registry over `store_path` and load its current contents.
    /// A missing or malformed store starts the registry empty.
    pub async fn open(store_path: impl Into<PathBuf>) -> Self {
        let store_path = store_path.into();
        let snapshot = ExclusionSnapshot {
            ids: Arc::new(read_store(&store_path).await),
            version: 1,
        };
        info!(
            "🚫 Loaded {} excluded ids from {}",
            snapshot.len(),
            store_path.display()
        );
        Self {
            store_path,
            current: Arc::new(RwLock::new(snapshot)),
        }
    }

    /// The current snapshot. Sessions capture one at start and keep it.
    pub async fn snapshot(&self) -> ExclusionSnapshot {
        self.current.read().await.clone()
    }

    /// Re-read the store and install a new snapshot. Returns the number of
    /// excluded ids now in effect.
    pub async fn reload(&self) -> usize {
        let ids = read_store(&self.store_path).await;
        let mut current = self.current.write().await;
        *current = ExclusionSnapshot {
            ids: Arc::new(ids),
            version: current.version + 1,
        };
        info!(
            "🔄 Reloaded exclusion store: {} ids (v{})",
            current.len(),
            current.version()
        );
        current.len()
    }

    pub fn store_path(&self) -> &Path {
        &self.store_path
    }
}

/// Union of the non-empty id fields across all stored entries. Every failure
/// mode degrades to an empty set.
async fn read_store(path: &Path) -> HashSet<String> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) => {
            debug!("📭 Exclusion store {} not readable: {}", path.display(), e);
            return HashSet::new();
        }
    };
    let store: ExclusionStore = match serde_json::from_str(&raw) {
        Ok(store) => store,
        Err(e) => {
            warn!("⚠️ Exclusion store {} is malformed: {}", path.display(), e);
            return HashSet::new();
        }
    };

    let mut ids = HashSet::new();
    for entry in store.videos {
        if !entry.video_id.is_empty() {
            ids.insert(entry.video_id);
        }
        if !entry.uploaded_id.is_empty() {
            ids.insert(entry.uploaded_id);
        }
    }
    ids
}
