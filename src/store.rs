//! Snapshot store: the scene file on disk plus a dirty set for debounced writes.
//!
//! DESIGN
//! ======
//! The engine reports `Persist(id)` for every entity whose stored fields
//! changed. Those ids collect in a dirty set, and the runner flushes on a
//! fixed interval, so a drag that moves an entity sixty times a second costs
//! one write per interval. Records are keyed by id; the last write wins.
//!
//! ERROR HANDLING
//! ==============
//! Dirty ids are cleared only after the file is written. A failed flush
//! keeps them for the next interval: repeated writes are acceptable, silent
//! data loss is not.

use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use scene::snapshot::{self, SceneSnapshot};
use scene::{EntityId, SnapshotError};
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("stored scene is invalid: {0}")]
    Snapshot(#[from] SnapshotError),
}

pub struct Store {
    path: PathBuf,
    dirty: HashSet<EntityId>,
    /// Set when the whole scene was replaced (import, seed).
    replaced: bool,
}

impl Store {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), dirty: HashSet::new(), replaced: false }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the stored scene. `Ok(None)` when nothing has been stored yet.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Io`] if the file exists but cannot be read and
    /// [`StoreError::Snapshot`] if its contents are not a valid scene.
    pub async fn load(&self) -> Result<Option<SceneSnapshot>, StoreError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(StoreError::Io { path: self.path.clone(), source }),
        };
        if raw.trim().is_empty() {
            return Ok(None);
        }
        let snapshot = snapshot::parse(&raw)?;
        info!(path = %self.path.display(), entities = snapshot.objects.len(), "scene loaded from store");
        Ok(Some(snapshot))
    }

    /// Mark one entity as needing a write. Deleted ids are marked too, so the
    /// next flush drops them from the file.
    pub fn mark(&mut self, id: EntityId) {
        self.dirty.insert(id);
    }

    /// Mark the whole scene as needing a write.
    pub fn mark_all(&mut self) {
        self.replaced = true;
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.replaced || !self.dirty.is_empty()
    }

    #[must_use]
    pub fn dirty_count(&self) -> usize {
        self.dirty.len()
    }

    /// Write `snapshot` if anything is dirty. Returns the number of dirty ids
    /// that were cleared; `0` when there was nothing to do.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if serialization or the write fails. Dirty ids
    /// are kept in that case.
    pub async fn flush(&mut self, snapshot: &SceneSnapshot) -> Result<usize, StoreError> {
        if !self.is_dirty() {
            return Ok(0);
        }
        let json = snapshot::to_json(snapshot)?;
        write_atomic(&self.path, json.as_bytes()).await?;

        let flushed = self.dirty.len();
        self.dirty.clear();
        self.replaced = false;
        debug!(path = %self.path.display(), flushed, entities = snapshot.objects.len(), "store flushed");
        Ok(flushed)
    }
}

/// Write to a sibling temp file, then rename over the target.
async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    let io_err = |source| StoreError::Io { path: path.to_path_buf(), source };
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    tokio::fs::write(&tmp, bytes).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)
}

/// Write a snapshot to an arbitrary path (the `export` command).
///
/// # Errors
///
/// Returns [`StoreError`] if serialization or the write fails.
pub async fn export_to(path: &Path, snapshot: &SceneSnapshot) -> Result<(), StoreError> {
    let json = snapshot::to_json(snapshot)?;
    tokio::fs::write(path, json).await.map_err(|source| StoreError::Io { path: path.to_path_buf(), source })
}

/// Read a payload for the `import` command. Validation is left to the engine.
///
/// # Errors
///
/// Returns [`StoreError::Io`] if the file cannot be read.
pub async fn read_payload(path: &Path) -> Result<String, StoreError> {
    tokio::fs::read_to_string(path).await.map_err(|source| StoreError::Io { path: path.to_path_buf(), source })
}

#[cfg(test)]
#[path = "store_test.rs"]
mod tests;
