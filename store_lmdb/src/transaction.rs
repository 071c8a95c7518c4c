//! LMDB write transaction implementing the KV adapter's `WriteTxn`.
//!
//! All writes of one logical operation go through a single LMDB write
//! transaction. If it is dropped without [`WriteTxn::commit`], LMDB aborts it
//! and none of the writes become visible.

use heed::types::Bytes;
use heed::{Database, Env, RwTxn};

use refdb_store::{ReadTxn, StoreError, WriteTxn};

use crate::LmdbError;

pub struct LmdbWriteTxn<'a> {
    txn: RwTxn<'a>,
    db: Database<Bytes, Bytes>,
}

impl<'a> LmdbWriteTxn<'a> {
    pub(crate) fn new(env: &'a Env, db: Database<Bytes, Bytes>) -> Result<Self, StoreError> {
        let txn = env.write_txn().map_err(LmdbError::from)?;
        Ok(Self { txn, db })
    }
}

impl ReadTxn for LmdbWriteTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let val = self.db.get(&self.txn, key).map_err(LmdbError::from)?;
        Ok(val.map(|v| v.to_vec()))
    }
}

impl WriteTxn for LmdbWriteTxn<'_> {
    fn put(&mut self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.db
            .put(&mut self.txn, key, value)
            .map_err(LmdbError::from)?;
        Ok(())
    }

    fn delete(&mut self, key: &[u8]) -> Result<bool, StoreError> {
        let existed = self
            .db
            .delete(&mut self.txn, key)
            .map_err(LmdbError::from)?;
        Ok(existed)
    }

    fn commit(self) -> Result<(), StoreError> {
        self.txn.commit().map_err(LmdbError::from)?;
        Ok(())
    }
}
