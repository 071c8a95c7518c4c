//! LMDB environment setup and the KV adapter over it.

use std::ops::Bound;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, EnvFlags, EnvOpenOptions};
use tempfile::TempDir;

use refdb_store::kv::prefix_upper_bound;
use refdb_store::{KvStore, ReadTxn, StoreError};

use crate::integrity::check_data_dir;
use crate::transaction::LmdbWriteTxn;
use crate::{LmdbError, StoreConfig};

/// Name of the LMDB database holding every namespace.
const DB_NAME: &str = "referrals";
const MAX_DBS: u32 = 4;
const PAGE_SIZE: usize = 4096;
const MIN_MAP_SIZE: usize = 1024 * 1024;

/// Wraps the LMDB environment and its database handle.
pub struct LmdbEnvironment {
    env: Arc<Env>,
    db: Database<Bytes, Bytes>,
    path: PathBuf,
    // Held so a memory-only store's directory lives exactly as long as the env.
    _scratch: Option<TempDir>,
}

impl LmdbEnvironment {
    /// Open or create the store described by `config` under `data_dir`.
    ///
    /// The files live in `data_dir/<config.name>`, or in a private scratch
    /// directory when `config.memory_only` is set.
    pub fn open(data_dir: &Path, config: &StoreConfig) -> Result<Self, LmdbError> {
        let (path, scratch) = if config.memory_only {
            let dir = tempfile::Builder::new()
                .prefix(&format!("{}-", config.name))
                .tempdir()?;
            (dir.path().to_path_buf(), Some(dir))
        } else {
            (data_dir.join(&config.name), None)
        };

        check_data_dir(&path).map_err(LmdbError::Corrupted)?;
        std::fs::create_dir_all(&path)?;

        let map_size = config.cache_size.max(MIN_MAP_SIZE).div_ceil(PAGE_SIZE) * PAGE_SIZE;
        let mut options = EnvOpenOptions::new();
        options.map_size(map_size).max_dbs(MAX_DBS);
        // SAFETY: the environment is opened once per path by this process, and
        // NO_SYNC is only used for scratch stores whose durability is irrelevant.
        let env = unsafe {
            if config.memory_only {
                options.flags(EnvFlags::NO_SYNC | EnvFlags::NO_META_SYNC);
            }
            options.open(&path)?
        };

        let mut wtxn = env.write_txn()?;
        let db: Database<Bytes, Bytes> = env.create_database(&mut wtxn, Some(DB_NAME))?;
        if config.wipe {
            db.clear(&mut wtxn)?;
            tracing::info!(path = %path.display(), "wiped referral store");
        }
        wtxn.commit()?;

        tracing::info!(
            path = %path.display(),
            map_size,
            memory_only = config.memory_only,
            "opened referral store"
        );

        Ok(Self {
            env: Arc::new(env),
            db,
            path,
            _scratch: scratch,
        })
    }

    /// Directory holding the LMDB files.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of entries across all namespaces.
    pub fn entry_count(&self) -> Result<u64, LmdbError> {
        let rtxn = self.env.read_txn()?;
        Ok(self.db.len(&rtxn)?)
    }
}

impl ReadTxn for LmdbEnvironment {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self.db.get(&rtxn, key).map_err(LmdbError::from)?;
        Ok(val.map(|v| v.to_vec()))
    }
}

impl KvStore for LmdbEnvironment {
    type Txn<'a>
        = LmdbWriteTxn<'a>
    where
        Self: 'a;

    fn write_txn(&self) -> Result<LmdbWriteTxn<'_>, StoreError> {
        LmdbWriteTxn::new(&self.env, self.db)
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let upper = prefix_upper_bound(prefix);
        let bounds = (
            Bound::Included(prefix),
            match upper.as_deref() {
                Some(u) => Bound::Excluded(u),
                None => Bound::Unbounded,
            },
        );
        let iter = self.db.range(&rtxn, &bounds).map_err(LmdbError::from)?;
        let mut results = Vec::new();
        for entry in iter {
            let (key, val) = entry.map_err(LmdbError::from)?;
            results.push((key.to_vec(), val.to_vec()));
        }
        Ok(results)
    }
}
