//! JSON snapshot files with single-writer, write-then-rename semantics.

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::Mutex;

use super::models::{
    SWAP_DATA_FILE, SwapDocument, VZP_DATA_FILE, VzpDocument, from_documents, to_documents,
};
use crate::domain::{StoreSnapshot, VzpStore};
use crate::error::VzpError;

/// Reads and writes the store documents in a data directory.
#[derive(Debug)]
pub struct SnapshotStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl SnapshotStore {
    /// Creates a snapshot store rooted at `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Returns the data directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Writes both documents from the current contents of `store`.
    ///
    /// The snapshot is taken under the writer lock, so saves land on disk in
    /// the order they observed the store. Each file is written to a
    /// temporary sibling and renamed over the target.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::Persistence`] on serialization or I/O failure.
    pub async fn save(&self, store: &VzpStore) -> Result<(), VzpError> {
        let _guard = self.write_lock.lock().await;
        let snapshot = store.snapshot().await;
        self.write(&snapshot).await
    }

    async fn write(&self, snapshot: &StoreSnapshot) -> Result<(), VzpError> {
        let (doc, swaps) = to_documents(snapshot);
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| persistence_error(&self.dir, &e))?;
        write_json(&self.dir.join(VZP_DATA_FILE), &doc).await?;
        write_json(&self.dir.join(SWAP_DATA_FILE), &swaps).await?;
        tracing::debug!(
            active = snapshot.active.len(),
            archived = snapshot.archive.len(),
            "snapshot saved"
        );
        Ok(())
    }

    /// Reads both documents. Missing files load as empty.
    ///
    /// # Errors
    ///
    /// Returns [`VzpError::Persistence`] if a file exists but cannot be read
    /// or parsed.
    pub async fn load(&self) -> Result<StoreSnapshot, VzpError> {
        let _guard = self.write_lock.lock().await;
        let doc: VzpDocument = read_json(&self.dir.join(VZP_DATA_FILE)).await?;
        let swaps: SwapDocument = read_json(&self.dir.join(SWAP_DATA_FILE)).await?;
        Ok(from_documents(doc, swaps))
    }
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), VzpError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|e| VzpError::Persistence(format!("{}: {e}", path.display())))?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, bytes)
        .await
        .map_err(|e| persistence_error(&tmp, &e))?;
    tokio::fs::rename(&tmp, path)
        .await
        .map_err(|e| persistence_error(path, &e))
}

async fn read_json<T: DeserializeOwned + Default>(path: &Path) -> Result<T, VzpError> {
    match tokio::fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes)
            .map_err(|e| VzpError::Persistence(format!("{}: {e}", path.display()))),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(persistence_error(path, &e)),
    }
}

fn persistence_error(path: &Path, err: &std::io::Error) -> VzpError {
    VzpError::Persistence(format!("{}: {err}", path.display()))
}
