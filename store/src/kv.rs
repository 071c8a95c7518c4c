//! Ordered key-value engine adapter.
//!
//! Keys and values are raw bytes. Reads through a [`WriteTxn`] observe that
//! transaction's own uncommitted writes; other readers only see committed
//! state. Dropping a write transaction without calling [`WriteTxn::commit`]
//! discards all of its writes.

use crate::StoreError;

/// Point reads. Implemented by stores (each call reads committed state) and by
/// write transactions (each call also sees the transaction's pending writes).
pub trait ReadTxn {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    fn exists(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}

/// Writable transaction handle (extends [`ReadTxn`]).
pub trait WriteTxn: ReadTxn {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;

    /// Delete a key. Returns whether the key existed.
    fn delete(&mut self, key: &[u8]) -> Result<bool, StoreError>;

    /// Atomically publish every write made through this transaction.
    fn commit(self) -> Result<(), StoreError>
    where
        Self: Sized;
}

/// An ordered key-value engine with single-writer transactions.
pub trait KvStore: ReadTxn {
    type Txn<'a>: WriteTxn
    where
        Self: 'a;

    /// Begin a write transaction.
    fn write_txn(&self) -> Result<Self::Txn<'_>, StoreError>;

    /// All committed entries whose key starts with `prefix`, in key order,
    /// read from a single snapshot.
    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;
}

/// Smallest byte string greater than every string starting with `prefix`, or
/// `None` if no such bound exists (the prefix is empty or all `0xff`).
pub fn prefix_upper_bound(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut upper = prefix.to_vec();
    while let Some(last) = upper.last_mut() {
        if *last < 0xff {
            *last += 1;
            return Some(upper);
        }
        upper.pop();
    }
    None
}
