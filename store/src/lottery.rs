//! Lottery reservoir storage trait.

use crate::StoreError;
use refdb_types::{Address, CodeHash, LotteryEntry, WeightedKey};

/// What happened to a candidate offered to the reservoir.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LotteryAdmission {
    /// The address has no ANV record.
    NoAnv,
    /// The address's ANV is zero, so it cannot be weighted.
    Ineligible,
    /// The reservoir had room and the candidate was added.
    Inserted,
    /// The reservoir was full; the candidate beat the minimum and replaced it.
    Replaced { evicted: LotteryEntry },
    /// The reservoir was full and the candidate did not beat the minimum.
    Discarded,
}

impl LotteryAdmission {
    /// Whether the candidate now occupies a reservoir slot.
    pub fn admitted(&self) -> bool {
        matches!(self, LotteryAdmission::Inserted | LotteryAdmission::Replaced { .. })
    }
}

/// Trait for the persistent bounded min-heap backing the reservoir.
pub trait LotteryStore {
    /// Offer `address` as a candidate weighted by its current ANV.
    fn add_address_to_lottery(
        &self,
        seed: &CodeHash,
        address: &Address,
    ) -> Result<LotteryAdmission, StoreError>;

    /// Push an entry onto the heap. Returns `false` if the heap is full.
    fn insert_lottery_address(&self, key: WeightedKey, address: &Address)
        -> Result<bool, StoreError>;

    /// Remove and return the entry with the smallest key.
    fn pop_lottery_min(&self) -> Result<Option<LotteryEntry>, StoreError>;

    fn get_lottery_min_key(&self) -> Result<Option<WeightedKey>, StoreError>;

    fn get_lottery_heap_size(&self) -> Result<usize, StoreError>;

    /// Every occupied slot, in heap position order.
    fn get_lottery_entries(&self) -> Result<Vec<LotteryEntry>, StoreError>;
}
