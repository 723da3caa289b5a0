use crate::{Collection, CoreError};
use parking_lot::RwLock;

/// In-process store, mostly for tests. Can be told to fail saves.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: RwLock<Option<Collection>>,
    fail_saves: RwLock<bool>,
    saves: RwLock<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_collection(collection: Collection) -> Self {
        let store = Self::default();
        *store.snapshot.write() = Some(collection);
        store
    }

    pub fn set_fail_saves(&self, fail: bool) {
        *self.fail_saves.write() = fail;
    }

    pub fn save_count(&self) -> usize {
        *self.saves.read()
    }

    pub fn snapshot(&self) -> Option<Collection> {
        self.snapshot.read().clone()
    }
}

impl crate::repo::SnapshotStore for MemoryStore {
    fn load(&self) -> Result<Collection, CoreError> {
        Ok(self.snapshot.read().clone().unwrap_or_default())
    }

    fn save(&self, collection: &Collection) -> Result<(), CoreError> {
        if *self.fail_saves.read() {
            return Err(CoreError::Storage("save disabled".into()));
        }
        *self.snapshot.write() = Some(collection.clone());
        *self.saves.write() += 1;
        Ok(())
    }
}
