// Load-once dataset cache.
//
// Tables are loaded on first use and shared read-only afterwards. Nothing
// mutates a cached snapshot; a reload replaces it wholesale after
// `invalidate`.
use crate::error::Result;
use crate::source::Datasets;
use once_cell::sync::Lazy;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

static GLOBAL: Lazy<DatasetCache> = Lazy::new(DatasetCache::new);

/// Process-wide cache instance.
pub fn global() -> &'static DatasetCache {
    &GLOBAL
}

#[derive(Debug, Default)]
pub struct DatasetCache {
    slot: Mutex<Option<Arc<Datasets>>>,
}

impl DatasetCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Option<Arc<Datasets>>> {
        // A panic while loading leaves at worst an empty slot.
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Return the cached snapshot, running `load` only if nothing is cached.
    /// A failed load leaves the cache empty.
    pub fn get_or_load<F>(&self, load: F) -> Result<Arc<Datasets>>
    where
        F: FnOnce() -> Result<Datasets>,
    {
        let mut slot = self.lock();
        if let Some(data) = slot.as_ref() {
            debug!("dataset cache hit");
            return Ok(Arc::clone(data));
        }
        let data = Arc::new(load()?);
        *slot = Some(Arc::clone(&data));
        Ok(data)
    }

    pub fn invalidate(&self) {
        debug!("dataset cache invalidated");
        *self.lock() = None;
    }

    pub fn is_loaded(&self) -> bool {
        self.lock().is_some()
    }
}
