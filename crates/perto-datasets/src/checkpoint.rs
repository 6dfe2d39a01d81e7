//! Resume state for long-running backfill jobs.
//!
//! Geocoding a few thousand records against rate-limited public APIs takes
//! long enough that interruptions are normal. The checkpoint records which
//! entity ids have already been attempted so a restarted job skips them.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::{
    error::{DataError, Result},
    model::EntityId,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillCheckpoint {
    processed: HashSet<EntityId>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl Default for BackfillCheckpoint {
    fn default() -> Self {
        Self::new()
    }
}

impl BackfillCheckpoint {
    /// An empty, in-memory checkpoint with no backing file.
    #[must_use]
    pub fn new() -> Self {
        Self {
            processed: HashSet::new(),
            updated_at: Utc::now(),
            path: None,
        }
    }

    /// An empty checkpoint that will save to `path`.
    #[must_use]
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
            ..Self::new()
        }
    }

    /// Load an existing checkpoint, or start a fresh one at `path` if the
    /// file does not exist yet. A file that exists but does not parse is an
    /// error; silently restarting a half-done job would re-hammer the
    /// geocoding APIs.
    pub fn load_or_default(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        if !path.exists() {
            return Ok(Self::at_path(path));
        }
        let raw = fs::read_to_string(&path)?;
        let mut checkpoint: Self =
            serde_json::from_str(&raw).map_err(|_| DataError::CheckpointCorrupt(path.clone()))?;
        checkpoint.path = Some(path);
        info!(
            entries = checkpoint.processed.len(),
            updated_at = %checkpoint.updated_at,
            "checkpoint loaded"
        );
        Ok(checkpoint)
    }

    /// Default checkpoint location under the platform data directory.
    #[cfg(feature = "system-dirs")]
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("rs", "perto", "perto")
            .map(|dirs| dirs.data_dir().join("backfill-checkpoint.json"))
    }

    /// True when the checkpoint has a backing file to save to.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        self.path.is_some()
    }

    #[must_use]
    pub fn contains(&self, id: &EntityId) -> bool {
        self.processed.contains(id)
    }

    /// Record an id as processed. Returns false if it was already present.
    pub fn insert(&mut self, id: EntityId) -> bool {
        self.processed.insert(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.processed.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.processed.is_empty()
    }

    /// Write the checkpoint to its backing file, atomically (temp file in
    /// the same directory, then rename).
    pub fn save(&mut self) -> Result<()> {
        let path = self
            .path
            .clone()
            .ok_or(DataError::CheckpointPathUnset)?;
        self.updated_at = Utc::now();

        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        fs::create_dir_all(parent)?;
        let tmp = tempfile::NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(tmp.as_file(), self)?;
        tmp.persist(&path)?;

        debug!(
            path = %path.display(),
            entries = self.processed.len(),
            "checkpoint saved"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_reload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");

        let mut checkpoint = BackfillCheckpoint::at_path(&path);
        checkpoint.insert(EntityId::Number(1));
        checkpoint.insert(EntityId::from("feira-2"));
        checkpoint.save().unwrap();

        let reloaded = BackfillCheckpoint::load_or_default(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
        assert!(reloaded.contains(&EntityId::Number(1)));
        assert!(reloaded.contains(&EntityId::from("feira-2")));
    }

    #[test]
    fn test_missing_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let checkpoint =
            BackfillCheckpoint::load_or_default(dir.path().join("absent.json")).unwrap();
        assert!(checkpoint.is_empty());
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("checkpoint.json");
        fs::write(&path, "not json at all").unwrap();

        let err = BackfillCheckpoint::load_or_default(&path).unwrap_err();
        assert!(matches!(err, DataError::CheckpointCorrupt(_)));
    }

    #[test]
    fn test_insert_reports_duplicates() {
        let mut checkpoint = BackfillCheckpoint::new();
        assert!(checkpoint.insert(EntityId::Number(7)));
        assert!(!checkpoint.insert(EntityId::Number(7)));
        assert_eq!(checkpoint.len(), 1);
    }

    #[test]
    fn test_save_without_path_fails() {
        let mut checkpoint = BackfillCheckpoint::new();
        let err = checkpoint.save().unwrap_err();
        assert!(matches!(err, DataError::CheckpointPathUnset));
    }
}
