use crate::error::StoreError;
use agg_events::types::IdentityKey;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};

/// Persistent set of admitted identity keys.
///
/// `admit_if_new` is an atomic test-and-insert: for a given key exactly one
/// call ever returns `Ok(true)`, no matter how many callers race on it.
/// Keys are never removed.
pub trait DedupStore: Send + Sync {
    fn admit_if_new(&self, key: &IdentityKey) -> Result<bool, StoreError>;

    /// Number of keys admitted so far.
    fn len(&self) -> Result<u64, StoreError>;

    fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.len()? == 0)
    }
}

/// In-process store for tests and deployments that do not need restart durability.
#[derive(Debug, Default)]
pub struct MemoryDedupStore {
    keys: Mutex<HashSet<IdentityKey>>,
}

impl MemoryDedupStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl DedupStore for MemoryDedupStore {
    fn admit_if_new(&self, key: &IdentityKey) -> Result<bool, StoreError> {
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(keys.insert(key.clone()))
    }

    fn len(&self) -> Result<u64, StoreError> {
        let keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(keys.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn admits_each_key_once() {
        let store = MemoryDedupStore::new();
        let key = IdentityKey::new("t1", "e1");
        assert!(store.admit_if_new(&key).unwrap());
        assert!(!store.admit_if_new(&key).unwrap());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn uniqueness_is_scoped_per_topic() {
        let store = MemoryDedupStore::new();
        assert!(store.admit_if_new(&IdentityKey::new("a", "1")).unwrap());
        assert!(store.admit_if_new(&IdentityKey::new("b", "1")).unwrap());
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn concurrent_callers_see_exactly_one_admission() {
        let store = Arc::new(MemoryDedupStore::new());
        let key = IdentityKey::new("race", "same");
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = Arc::clone(&store);
                let key = key.clone();
                thread::spawn(move || store.admit_if_new(&key).unwrap())
            })
            .collect();
        let admitted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|new| *new)
            .count();
        assert_eq!(admitted, 1);
    }
}
