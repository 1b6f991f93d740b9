//! `metadata.json`-backed implementation of [`CheckpointStore`].
//!
//! Writes go to `metadata.json.temp`, are flushed to disk, then renamed over
//! `metadata.json`. Rename within one directory is atomic, so the canonical
//! file always holds a complete checkpoint.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use roundhouse_types::Checkpoint;

use crate::backend::CheckpointStore;
use crate::error::{self, StateError};

/// Canonical checkpoint file name inside the data directory.
pub const CHECKPOINT_FILE: &str = "metadata.json";
/// Scratch file renamed over [`CHECKPOINT_FILE`].
pub const CHECKPOINT_TEMP_FILE: &str = "metadata.json.temp";

/// Checkpoint stored as JSON in the pipeline data directory.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
    temp_path: PathBuf,
}

impl FileCheckpointStore {
    #[must_use]
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        let dir = data_dir.as_ref();
        Self {
            path: dir.join(CHECKPOINT_FILE),
            temp_path: dir.join(CHECKPOINT_TEMP_FILE),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_temp(&self, encoded: &[u8]) -> error::Result<()> {
        if let Some(parent) = self.temp_path.parent() {
            fs::create_dir_all(parent).map_err(|e| StateError::io(parent, e))?;
        }
        let mut file =
            File::create(&self.temp_path).map_err(|e| StateError::io(&self.temp_path, e))?;
        file.write_all(encoded)
            .map_err(|e| StateError::io(&self.temp_path, e))?;
        file.sync_all()
            .map_err(|e| StateError::io(&self.temp_path, e))?;
        Ok(())
    }
}

impl CheckpointStore for FileCheckpointStore {
    fn load(&self) -> error::Result<Checkpoint> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(StateError::io(&self.path, e)),
        };

        if bytes.is_empty() {
            tracing::info!(
                path = %self.path.display(),
                "No checkpoint found, bootstrapping at round 0"
            );
            let checkpoint = Checkpoint::bootstrap();
            self.save(&checkpoint)?;
            return Ok(checkpoint);
        }

        serde_json::from_slice(&bytes).map_err(|source| StateError::Decode {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, checkpoint: &Checkpoint) -> error::Result<()> {
        let encoded = serde_json::to_vec_pretty(checkpoint).map_err(StateError::Encode)?;
        self.write_temp(&encoded)?;
        fs::rename(&self.temp_path, &self.path).map_err(|e| StateError::io(&self.path, e))?;
        tracing::trace!(
            next_round = checkpoint.next_round,
            path = %self.path.display(),
            "Checkpoint saved"
        );
        Ok(())
    }
}
