//! The referral graph handle.

use std::path::Path;

use refdb_store::{KvStore, StoreError};
use refdb_store_lmdb::{LmdbEnvironment, StoreConfig};

/// Bound on the ancestor walk of an ANV update. Only a cycle in the referral
/// forest can reach it.
pub const MAX_LEVELS: usize = u32::MAX as usize;

/// Capacity of the lottery reservoir.
pub const MAX_RESERVOIR_SIZE: usize = 1000;

/// Referral tree, ANV aggregator and lottery reservoir over one KV store.
///
/// Owns its store; nothing here is global. The component operations are the
/// [`refdb_store::ReferralStore`], [`refdb_store::AnvStore`] and
/// [`refdb_store::LotteryStore`] impls.
pub struct ReferralsDb<S> {
    pub(crate) store: S,
    pub(crate) max_levels: usize,
    pub(crate) reservoir_capacity: usize,
}

impl<S: KvStore> ReferralsDb<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            max_levels: MAX_LEVELS,
            reservoir_capacity: MAX_RESERVOIR_SIZE,
        }
    }

    /// Override the ancestor walk bound.
    pub fn with_max_levels(mut self, max_levels: usize) -> Self {
        self.max_levels = max_levels;
        self
    }

    /// Override the reservoir capacity.
    pub fn with_reservoir_capacity(mut self, capacity: usize) -> Self {
        self.reservoir_capacity = capacity;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn max_levels(&self) -> usize {
        self.max_levels
    }

    pub fn reservoir_capacity(&self) -> usize {
        self.reservoir_capacity
    }
}

impl ReferralsDb<LmdbEnvironment> {
    /// Open the LMDB-backed referral store under `data_dir`.
    pub fn open(data_dir: &Path, config: &StoreConfig) -> Result<Self, StoreError> {
        let env = LmdbEnvironment::open(data_dir, config)?;
        Ok(Self::new(env))
    }
}
