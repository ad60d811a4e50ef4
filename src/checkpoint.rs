/*!
 * Crash-safe per-item progress persistence.
 *
 * The checkpoint is a single JSON file holding every completed item keyed
 * by id, plus metadata tying it to one catalog and language pair. Every
 * `put` rewrites the file through a temp-then-rename so a crash at any
 * point leaves either the previous complete checkpoint or the new one,
 * never a truncated file. A checkpoint whose metadata no longer matches
 * the current run (catalog changed, different languages) is discarded.
 */

use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::errors::CheckpointError;

/// Identifies which run a checkpoint belongs to
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    /// SHA-256 of the source catalog file
    pub catalog_fingerprint: String,
    /// Source language code
    pub source_language: String,
    /// Target language code
    pub target_language: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CheckpointFile {
    metadata: CheckpointMetadata,
    items: BTreeMap<String, Value>,
}

/// Key-value interface over completed items.
///
/// The orchestrator only ever talks to this interface, so the backing
/// store (flat file, embedded database) can be swapped without touching
/// pipeline logic.
pub trait CheckpointStore {
    /// Whether the item with this id has already been completed
    fn has(&self, id: &str) -> bool {
        self.completed().contains_key(id)
    }

    /// Record a completed item; must be durable before returning
    fn put(&mut self, id: &str, item: Value) -> Result<(), CheckpointError>;

    /// All completed items, keyed by id
    fn completed(&self) -> &BTreeMap<String, Value>;

    /// Number of completed items
    fn len(&self) -> usize {
        self.completed().len()
    }

    /// Whether no items have been completed yet
    fn is_empty(&self) -> bool {
        self.completed().is_empty()
    }

    /// Forget all completed items and remove the backing artifact
    fn clear(&mut self) -> Result<(), CheckpointError>;
}

/// File-backed store of completed items.
///
/// Reads are served from memory; every write goes to disk before `put`
/// returns, so an accepted item is never lost to a crash.
pub struct JsonCheckpointStore {
    path: PathBuf,
    state: CheckpointFile,
}

impl JsonCheckpointStore {
    /// Open the checkpoint at `path`, resuming from it when it matches
    /// `metadata`. A missing file starts an empty checkpoint; a corrupt
    /// or mismatched one is discarded with a warning.
    pub fn open(
        path: impl Into<PathBuf>,
        metadata: CheckpointMetadata,
    ) -> Result<Self, CheckpointError> {
        let path = path.into();

        let state = match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<CheckpointFile>(&content) {
                Ok(existing) if existing.metadata == metadata => {
                    info!(
                        "Resuming from checkpoint {} ({} items done)",
                        path.display(),
                        existing.items.len()
                    );
                    existing
                }
                Ok(existing) => {
                    warn!(
                        "Checkpoint {} was written for a different catalog or language pair \
                         (had {} items), starting over",
                        path.display(),
                        existing.items.len()
                    );
                    CheckpointFile {
                        metadata,
                        items: BTreeMap::new(),
                    }
                }
                Err(e) => {
                    warn!(
                        "Checkpoint {} is unreadable ({}), starting over",
                        path.display(),
                        e
                    );
                    CheckpointFile {
                        metadata,
                        items: BTreeMap::new(),
                    }
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => CheckpointFile {
                metadata,
                items: BTreeMap::new(),
            },
            Err(e) => return Err(CheckpointError::Io(e)),
        };

        Ok(Self { path, state })
    }

    /// Open at `path` discarding any existing checkpoint (the `--fresh`
    /// path). The old file is deleted immediately so an interrupted fresh
    /// run cannot resurrect progress the operator explicitly threw away.
    pub fn fresh(
        path: impl Into<PathBuf>,
        metadata: CheckpointMetadata,
    ) -> Result<Self, CheckpointError> {
        let path = path.into();
        match std::fs::remove_file(&path) {
            Ok(()) => info!("Discarded existing checkpoint {}", path.display()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(CheckpointError::Io(e)),
        }
        Ok(Self {
            path,
            state: CheckpointFile {
                metadata,
                items: BTreeMap::new(),
            },
        })
    }

    /// The completed item for this id, if any
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.state.items.get(id)
    }

    /// The checkpoint file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self) -> Result<(), CheckpointError> {
        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        let mut temp = NamedTempFile::new_in(dir)?;
        let json = serde_json::to_string_pretty(&self.state)
            .map_err(|e| CheckpointError::WriteFailed(e.to_string()))?;
        temp.write_all(json.as_bytes())?;
        temp.as_file().sync_all()?;

        // Rename over the previous checkpoint only once the new content
        // is fully on disk
        temp.persist(&self.path)
            .map_err(|e| CheckpointError::WriteFailed(e.to_string()))?;
        Ok(())
    }
}

impl CheckpointStore for JsonCheckpointStore {
    /// Record a completed item and persist the checkpoint before returning.
    ///
    /// A failed write here is fatal to the run: continuing past it would
    /// let a later resume skip items that were never durably recorded.
    fn put(&mut self, id: &str, item: Value) -> Result<(), CheckpointError> {
        self.state.items.insert(id.to_string(), item);
        self.persist()
    }

    fn completed(&self) -> &BTreeMap<String, Value> {
        &self.state.items
    }

    /// Remove the checkpoint file and forget all completed items, done
    /// after the final output has been written successfully.
    fn clear(&mut self) -> Result<(), CheckpointError> {
        self.state.items.clear();
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(CheckpointError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn meta() -> CheckpointMetadata {
        CheckpointMetadata {
            catalog_fingerprint: "abc123".to_string(),
            source_language: "en".to_string(),
            target_language: "mr".to_string(),
        }
    }

    #[test]
    fn test_open_withNoFile_shouldStartEmpty() {
        let dir = TempDir::new().unwrap();
        let store = JsonCheckpointStore::open(dir.path().join("ckpt.json"), meta()).unwrap();
        assert!(store.is_empty());
        assert!(!store.has("t1"));
    }

    #[test]
    fn test_putThenReopen_shouldResumeCompletedItems() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ckpt.json");

        let mut store = JsonCheckpointStore::open(&path, meta()).unwrap();
        store.put("t1", json!({"id": "t1", "title": "X"})).unwrap();
        store.put("t2", json!({"id": "t2", "title": "Y"})).unwrap();
        drop(store);

        let reopened = JsonCheckpointStore::open(&path, meta()).unwrap();
        assert_eq!(reopened.len(), 2);
        assert!(reopened.has("t1"));
        assert_eq!(reopened.get("t2").unwrap()["title"], "Y");
    }

    #[test]
    fn test_open_withDifferentFingerprint_shouldDiscard() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ckpt.json");

        let mut store = JsonCheckpointStore::open(&path, meta()).unwrap();
        store.put("t1", json!({"id": "t1"})).unwrap();
        drop(store);

        let mut changed = meta();
        changed.catalog_fingerprint = "different".to_string();
        let reopened = JsonCheckpointStore::open(&path, changed).unwrap();
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_open_withDifferentLanguagePair_shouldDiscard() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ckpt.json");

        let mut store = JsonCheckpointStore::open(&path, meta()).unwrap();
        store.put("t1", json!({"id": "t1"})).unwrap();
        drop(store);

        let mut changed = meta();
        changed.target_language = "hi".to_string();
        let reopened = JsonCheckpointStore::open(&path, changed).unwrap();
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_open_withCorruptFile_shouldDiscardAndStartOver() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ckpt.json");
        std::fs::write(&path, "{truncated").unwrap();

        let mut store = JsonCheckpointStore::open(&path, meta()).unwrap();
        assert!(store.is_empty());

        // The store stays usable and repairs the file on the next put
        store.put("t1", json!({"id": "t1"})).unwrap();
        let reopened = JsonCheckpointStore::open(&path, meta()).unwrap();
        assert_eq!(reopened.len(), 1);
    }

    #[test]
    fn test_fresh_shouldDeleteExistingCheckpoint() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ckpt.json");

        let mut store = JsonCheckpointStore::open(&path, meta()).unwrap();
        store.put("t1", json!({"id": "t1"})).unwrap();
        drop(store);

        let store = JsonCheckpointStore::fresh(&path, meta()).unwrap();
        assert!(store.is_empty());
        // The discarded file must be gone so an interrupted fresh run
        // cannot resume from it
        assert!(!path.exists());

        // A reopen after the fresh run sees nothing to resume
        drop(store);
        let reopened = JsonCheckpointStore::open(&path, meta()).unwrap();
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_fresh_withNoExistingFile_shouldStartEmpty() {
        let dir = TempDir::new().unwrap();
        let store = JsonCheckpointStore::fresh(dir.path().join("ckpt.json"), meta()).unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn test_put_withMissingParentDirectory_shouldFail() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("missing").join("ckpt.json");

        // Opening succeeds (nothing to read yet); the write is what fails
        let mut store = JsonCheckpointStore::open(&path, meta()).unwrap();
        let result = store.put("t1", json!({"id": "t1"}));
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_put_shouldLeaveNoTempFilesBehind() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ckpt.json");

        let mut store = JsonCheckpointStore::open(&path, meta()).unwrap();
        for i in 0..5 {
            store
                .put(&format!("t{}", i), json!({"id": format!("t{}", i)}))
                .unwrap();
        }

        let entries: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(entries, vec![std::ffi::OsString::from("ckpt.json")]);
    }

    #[test]
    fn test_clear_shouldRemoveFile() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ckpt.json");

        let mut store = JsonCheckpointStore::open(&path, meta()).unwrap();
        store.put("t1", json!({"id": "t1"})).unwrap();
        assert!(path.exists());

        store.clear().unwrap();
        assert!(!path.exists());
        assert!(store.is_empty());

        // clearing twice is not an error
        store.clear().unwrap();
    }
}
