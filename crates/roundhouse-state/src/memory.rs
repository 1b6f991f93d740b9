//! In-memory [`CheckpointStore`], for tests and embedders that persist
//! progress elsewhere.

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use roundhouse_types::Checkpoint;

use crate::backend::CheckpointStore;
use crate::error;

#[derive(Debug, Default)]
pub struct MemoryCheckpointStore {
    current: Mutex<Option<Checkpoint>>,
    saves: AtomicU64,
}

impl MemoryCheckpointStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-seeded with `checkpoint`, as if a previous run had saved it.
    #[must_use]
    pub fn with_checkpoint(checkpoint: Checkpoint) -> Self {
        Self {
            current: Mutex::new(Some(checkpoint)),
            saves: AtomicU64::new(0),
        }
    }

    /// Last saved value, without the bootstrap side effect of [`load`](CheckpointStore::load).
    #[must_use]
    pub fn current(&self) -> Option<Checkpoint> {
        self.current.lock().clone()
    }

    /// Number of successful saves since construction.
    #[must_use]
    pub fn save_count(&self) -> u64 {
        self.saves.load(Ordering::SeqCst)
    }
}

impl CheckpointStore for MemoryCheckpointStore {
    fn load(&self) -> error::Result<Checkpoint> {
        let mut current = self.current.lock();
        if let Some(checkpoint) = current.as_ref() {
            return Ok(checkpoint.clone());
        }
        let checkpoint = Checkpoint::bootstrap();
        *current = Some(checkpoint.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(checkpoint)
    }

    fn save(&self, checkpoint: &Checkpoint) -> error::Result<()> {
        *self.current.lock() = Some(checkpoint.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
