use gloo_storage::{LocalStorage, Storage};
use log::warn;
use std::cell::Cell;

/// Local storage key the last seen transaction count is kept under
pub const TRANSACTION_COUNT_KEY: &str = "transactionCount";

/// Persists the last known on-chain transaction count. Informational only:
/// it never decides whether the history gets fetched.
pub trait CountStore {
    fn load(&self) -> Option<u64>;

    fn store(&self, count: u64);
}

/// Browser `localStorage` entry holding the count as a plain integer string
#[derive(Clone, Debug)]
pub struct LocalStorageCount {
    key: String,
}

impl LocalStorageCount {
    pub fn new(key: &str) -> Self {
        Self { key: key.to_string() }
    }
}

impl Default for LocalStorageCount {
    fn default() -> Self {
        Self::new(TRANSACTION_COUNT_KEY)
    }
}

impl CountStore for LocalStorageCount {
    fn load(&self) -> Option<u64> {
        LocalStorage::get::<u64>(&self.key).ok()
    }

    fn store(&self, count: u64) {
        if let Err(err) = LocalStorage::set(&self.key, count) {
            warn!("Cannot persist transaction count: {err}");
        }
    }
}

/// In-process store for hosts without `localStorage`
#[derive(Debug, Default)]
pub struct MemoryCountStore {
    count: Cell<Option<u64>>,
}

impl MemoryCountStore {
    pub fn with_count(count: u64) -> Self {
        Self { count: Cell::new(Some(count)) }
    }
}

impl CountStore for MemoryCountStore {
    fn load(&self) -> Option<u64> {
        self.count.get()
    }

    fn store(&self, count: u64) {
        self.count.set(Some(count));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_store_overwrites() {
        let store = MemoryCountStore::default();
        assert_eq!(store.load(), None);

        store.store(3);
        store.store(4);
        assert_eq!(store.load(), Some(4));
        assert_eq!(MemoryCountStore::with_count(9).load(), Some(9));
    }
}
