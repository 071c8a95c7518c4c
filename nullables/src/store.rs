//! Nullable store: thread-safe in-memory ordered KV store for testing.

use std::collections::BTreeMap;
use std::sync::Mutex;

use refdb_store::kv::prefix_upper_bound;
use refdb_store::{KvStore, ReadTxn, StoreError, WriteTxn};

type Entries = BTreeMap<Vec<u8>, Vec<u8>>;

/// An in-memory ordered key-value store.
///
/// Write transactions stage their changes in an overlay and publish them on
/// commit, so a dropped or failed transaction leaves no trace.
pub struct NullKvStore {
    entries: Mutex<Entries>,
    /// Remaining writes (put or delete) allowed before the next one fails.
    writes_before_failure: Mutex<Option<usize>>,
}

impl NullKvStore {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(BTreeMap::new()),
            writes_before_failure: Mutex::new(None),
        }
    }

    /// Let the next `n` writes succeed and fail the one after. The failure is
    /// one-shot: once it fires, writes succeed again.
    pub fn fail_after_writes(&self, n: usize) {
        *self.writes_before_failure.lock().unwrap() = Some(n);
    }

    /// Disarm a pending failure.
    pub fn clear_failure(&self) {
        *self.writes_before_failure.lock().unwrap() = None;
    }

    /// Copy of every committed entry.
    pub fn snapshot(&self) -> Entries {
        self.entries.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }

    fn check_write_allowed(&self) -> Result<(), StoreError> {
        let mut budget = self.writes_before_failure.lock().unwrap();
        match budget.as_mut() {
            Some(0) => {
                *budget = None;
                Err(StoreError::Backend("injected write failure".to_string()))
            }
            Some(n) => {
                *n -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl Default for NullKvStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ReadTxn for NullKvStore {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }
}

impl KvStore for NullKvStore {
    type Txn<'a>
        = NullWriteTxn<'a>
    where
        Self: 'a;

    fn write_txn(&self) -> Result<NullWriteTxn<'_>, StoreError> {
        Ok(NullWriteTxn {
            store: self,
            overlay: BTreeMap::new(),
        })
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let entries = self.entries.lock().unwrap();
        let results = match prefix_upper_bound(prefix) {
            Some(upper) => entries
                .range(prefix.to_vec()..upper)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => entries
                .range(prefix.to_vec()..)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        Ok(results)
    }
}

/// Staged writes of one transaction. `None` marks a deletion.
pub struct NullWriteTxn<'a> {
    store: &'a NullKvStore,
    overlay: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl ReadTxn for NullWriteTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        match self.overlay.get(key) {
            Some(staged) => Ok(staged.clone()),
            None => self.store.get(key),
        }
    }
}

impl WriteTxn for NullWriteTxn<'_> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.store.check_write_allowed()?;
        self.overlay.insert(key.to_vec(), Some(value.to_vec()));
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<bool, StoreError> {
        self.store.check_write_allowed()?;
        let existed = self.get(key)?.is_some();
        self.overlay.insert(key.to_vec(), None);
        Ok(existed)
    }

    fn commit(self) -> Result<(), StoreError> {
        let mut entries = self.store.entries.lock().unwrap();
        for (key, staged) in self.overlay {
            match staged {
                Some(value) => {
                    entries.insert(key, value);
                }
                None => {
                    entries.remove(&key);
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commit_publishes_writes() {
        let store = NullKvStore::new();
        let mut txn = store.write_txn().unwrap();
        txn.put(b"a", b"1").unwrap();
        assert_eq!(store.get(b"a").unwrap(), None);
        txn.commit().unwrap();
        assert_eq!(store.get(b"a").unwrap(), Some(b"1".to_vec()));
    }

    #[test]
    fn dropped_txn_is_discarded() {
        let store = NullKvStore::new();
        {
            let mut txn = store.write_txn().unwrap();
            txn.put(b"a", b"1").unwrap();
        }
        assert!(store.is_empty());
    }

    #[test]
    fn txn_sees_staged_deletes() {
        let store = NullKvStore::new();
        let mut txn = store.write_txn().unwrap();
        txn.put(b"a", b"1").unwrap();
        txn.commit().unwrap();

        let mut txn = store.write_txn().unwrap();
        assert!(txn.delete(b"a").unwrap());
        assert_eq!(txn.get(b"a").unwrap(), None);
        assert!(!txn.delete(b"a").unwrap());
        txn.commit().unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn injected_failure_fires_once() {
        let store = NullKvStore::new();
        store.fail_after_writes(1);
        let mut txn = store.write_txn().unwrap();
        txn.put(b"a", b"1").unwrap();
        assert!(txn.put(b"b", b"2").is_err());
        txn.put(b"c", b"3").unwrap();
    }

    #[test]
    fn scan_prefix_is_ordered_and_bounded() {
        let store = NullKvStore::new();
        let mut txn = store.write_txn().unwrap();
        txn.put(b"b2", b"x").unwrap();
        txn.put(b"b1", b"y").unwrap();
        txn.put(b"c1", b"z").unwrap();
        txn.put(b"a9", b"w").unwrap();
        txn.commit().unwrap();
        let keys: Vec<Vec<u8>> = store
            .scan_prefix(b"b")
            .unwrap()
            .into_iter()
            .map(|(k, _)| k)
            .collect();
        assert_eq!(keys, vec![b"b1".to_vec(), b"b2".to_vec()]);
    }
}
