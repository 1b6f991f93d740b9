//! Checkpoint store trait definition.

use roundhouse_types::Checkpoint;

use crate::error;

/// Storage contract for the pipeline checkpoint.
///
/// Implementations must be `Send + Sync` for use behind `Arc<dyn CheckpointStore>`.
/// The engine only ever has one writer (the round loop), so implementations
/// need not serialise concurrent saves.
pub trait CheckpointStore: Send + Sync {
    /// Read the persisted checkpoint.
    ///
    /// When nothing has been persisted yet (or the previous write left an empty
    /// file behind) this returns [`Checkpoint::bootstrap`] and persists it.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on I/O failure or if the
    /// stored value cannot be decoded.
    fn load(&self) -> error::Result<Checkpoint>;

    /// Durably replace the persisted checkpoint.
    ///
    /// After a crash at any point the stored value is either the previous
    /// checkpoint or `checkpoint`, never a mix.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`](crate::error::StateError) on storage failure.
    fn save(&self, checkpoint: &Checkpoint) -> error::Result<()>;
}
