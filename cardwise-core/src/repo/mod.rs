use crate::{Collection, CoreError};

pub mod memory;

pub use memory::MemoryStore;

/// Whole-collection persistence. Implementations load and save complete
/// snapshots; a failed `save` must leave the previous snapshot readable.
pub trait SnapshotStore {
    /// A store with nothing saved yet yields an empty collection.
    fn load(&self) -> Result<Collection, CoreError>;
    fn save(&self, collection: &Collection) -> Result<(), CoreError>;
}
