//! Lottery reservoir: a bounded min-heap persisted slot by slot.
//!
//! Position `i` has children `2i + 1` and `2i + 2` and parent `(i - 1) / 2`.
//! Every slot is its own key, so each sift step is an individual read and
//! write inside the operation's transaction.

use tracing::debug;

use refdb_store::{
    InvariantViolation, KvStore, LotteryAdmission, LotteryStore, StoreError, WriteTxn,
};
use refdb_types::{Address, CodeHash, LotteryEntry, WeightedKey};

use crate::codec::{self, read_occupied_slot, write_slot};
use crate::keys;
use crate::ReferralsDb;

/// Append `entry` and sift it toward the root. Returns `false` if the heap
/// already holds `capacity` entries.
pub(crate) fn heap_push<W: WriteTxn + ?Sized>(
    txn: &mut W,
    capacity: usize,
    entry: LotteryEntry,
) -> Result<bool, StoreError> {
    let size = codec::read_heap_size(txn)?;
    if size >= capacity {
        return Ok(false);
    }
    codec::write_heap_size(txn, size + 1)?;

    let mut pos = size;
    while pos > 0 {
        let parent_pos = (pos - 1) / 2;
        let parent = read_occupied_slot(txn, parent_pos, size + 1)?;
        if parent.key <= entry.key {
            break;
        }
        // Move the parent down into the hole.
        write_slot(txn, pos, &parent)?;
        pos = parent_pos;
    }
    write_slot(txn, pos, &entry)?;
    Ok(true)
}

/// Remove the minimum: move the last entry to the root and sift it down.
pub(crate) fn heap_pop<W: WriteTxn + ?Sized>(
    txn: &mut W,
) -> Result<Option<LotteryEntry>, StoreError> {
    let size = codec::read_heap_size(txn)?;
    if size == 0 {
        return Ok(None);
    }
    let min = read_occupied_slot(txn, 0, size)?;
    let last_pos = size - 1;
    let last = read_occupied_slot(txn, last_pos, size)?;
    txn.delete(&keys::lottery_slot_key(last_pos))?;
    codec::write_heap_size(txn, last_pos)?;

    let len = last_pos;
    if len > 0 {
        let mut pos = 0;
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut child_pos = left;
            let mut child = read_occupied_slot(txn, left, len)?;
            if right < len {
                let right_child = read_occupied_slot(txn, right, len)?;
                if right_child.key < child.key {
                    child_pos = right;
                    child = right_child;
                }
            }
            if child.key >= last.key {
                break;
            }
            write_slot(txn, pos, &child)?;
            pos = child_pos;
        }
        write_slot(txn, pos, &last)?;
    }
    Ok(Some(min))
}

impl<S: KvStore> LotteryStore for ReferralsDb<S> {
    /// Weighted reservoir admission (Efraimidis–Spirakis with log keys): the
    /// candidate's weight is its current ANV and its draw is the low 64 bits
    /// of `seed`.
    fn add_address_to_lottery(
        &self,
        seed: &CodeHash,
        address: &Address,
    ) -> Result<LotteryAdmission, StoreError> {
        let mut txn = self.store.write_txn()?;
        let Some(anv) = codec::read_anv(&txn, address)? else {
            return Ok(LotteryAdmission::NoAnv);
        };
        let Some(key) = WeightedKey::from_draw(seed.low_u64(), anv.anv) else {
            return Ok(LotteryAdmission::Ineligible);
        };
        let entry = LotteryEntry::new(key, *address);

        let size = codec::read_heap_size(&txn)?;
        if size > self.reservoir_capacity {
            return Err(InvariantViolation::HeapOverCapacity {
                size,
                capacity: self.reservoir_capacity,
            }
            .into());
        }

        let admission = if size < self.reservoir_capacity {
            heap_push(&mut txn, self.reservoir_capacity, entry)?;
            LotteryAdmission::Inserted
        } else if size > 0 && key > read_occupied_slot(&txn, 0, size)?.key {
            let evicted = heap_pop(&mut txn)?
                .ok_or(InvariantViolation::MissingHeapSlot { position: 0, size })?;
            heap_push(&mut txn, self.reservoir_capacity, entry)?;
            LotteryAdmission::Replaced { evicted }
        } else {
            debug!(%address, %key, "lottery candidate discarded");
            return Ok(LotteryAdmission::Discarded);
        };

        txn.commit()?;
        debug!(%address, %key, anv = anv.anv, ?admission, "lottery candidate admitted");
        Ok(admission)
    }

    fn insert_lottery_address(
        &self,
        key: WeightedKey,
        address: &Address,
    ) -> Result<bool, StoreError> {
        let mut txn = self.store.write_txn()?;
        if !heap_push(&mut txn, self.reservoir_capacity, LotteryEntry::new(key, *address))? {
            return Ok(false);
        }
        txn.commit()?;
        Ok(true)
    }

    fn pop_lottery_min(&self) -> Result<Option<LotteryEntry>, StoreError> {
        let mut txn = self.store.write_txn()?;
        let popped = heap_pop(&mut txn)?;
        if popped.is_some() {
            txn.commit()?;
        }
        Ok(popped)
    }

    fn get_lottery_min_key(&self) -> Result<Option<WeightedKey>, StoreError> {
        Ok(codec::read_slot(&self.store, 0)?.map(|entry| entry.key))
    }

    fn get_lottery_heap_size(&self) -> Result<usize, StoreError> {
        codec::read_heap_size(&self.store)
    }

    fn get_lottery_entries(&self) -> Result<Vec<LotteryEntry>, StoreError> {
        let size = codec::read_heap_size(&self.store)?;
        (0..size)
            .map(|pos| read_occupied_slot(&self.store, pos, size))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refdb_nullables::NullKvStore;
    use refdb_store::AnvStore;
    use refdb_types::AddressType;

    /// Fixed draw, so larger weights give larger keys.
    fn key(w: i64) -> WeightedKey {
        WeightedKey::from_draw(1 << 40, w).unwrap()
    }

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn seed(draw: u64) -> CodeHash {
        let mut bytes = [0u8; 32];
        bytes[..8].copy_from_slice(&draw.to_le_bytes());
        CodeHash::new(bytes)
    }

    fn assert_heap_ordered(db: &ReferralsDb<NullKvStore>) {
        let entries = db.get_lottery_entries().unwrap();
        for pos in 1..entries.len() {
            let parent = (pos - 1) / 2;
            assert!(
                entries[parent].key <= entries[pos].key,
                "slot {parent} > slot {pos}"
            );
        }
    }

    #[test]
    fn empty_heap() {
        let db = ReferralsDb::new(NullKvStore::new());
        assert_eq!(db.get_lottery_heap_size().unwrap(), 0);
        assert_eq!(db.get_lottery_min_key().unwrap(), None);
        assert_eq!(db.pop_lottery_min().unwrap(), None);
        assert!(db.get_lottery_entries().unwrap().is_empty());
    }

    #[test]
    fn insert_keeps_minimum_at_root() {
        let db = ReferralsDb::new(NullKvStore::new());
        for w in [50, 10, 70, 5, 30, 90, 1, 20] {
            assert!(db.insert_lottery_address(key(w), &addr(w as u8)).unwrap());
        }
        assert_eq!(db.get_lottery_heap_size().unwrap(), 8);
        assert_eq!(db.get_lottery_min_key().unwrap(), Some(key(1)));
        assert_heap_ordered(&db);
    }

    #[test]
    fn insert_rejects_when_full() {
        let db = ReferralsDb::new(NullKvStore::new()).with_reservoir_capacity(2);
        assert!(db.insert_lottery_address(key(1), &addr(1)).unwrap());
        assert!(db.insert_lottery_address(key(2), &addr(2)).unwrap());
        let before = db.store().snapshot();
        assert!(!db.insert_lottery_address(key(3), &addr(3)).unwrap());
        assert_eq!(db.store().snapshot(), before);
    }

    #[test]
    fn pops_come_out_in_ascending_order() {
        let db = ReferralsDb::new(NullKvStore::new());
        let weights = [13, 2, 8, 21, 1, 5, 3, 34, 55, 89];
        for w in weights {
            db.insert_lottery_address(key(w), &addr(w as u8)).unwrap();
        }
        let mut sorted = weights.to_vec();
        sorted.sort();
        for w in sorted {
            let entry = db.pop_lottery_min().unwrap().unwrap();
            assert_eq!(entry.key, key(w));
            assert_eq!(entry.address, addr(w as u8));
            assert_heap_ordered(&db);
        }
        assert_eq!(db.get_lottery_heap_size().unwrap(), 0);
        assert!(db.store().scan_prefix(&[keys::DB_LOT_VAL]).unwrap().is_empty());
    }

    #[test]
    fn address_without_anv_is_not_a_candidate() {
        let db = ReferralsDb::new(NullKvStore::new());
        assert_eq!(
            db.add_address_to_lottery(&seed(5), &addr(1)).unwrap(),
            LotteryAdmission::NoAnv
        );
        assert_eq!(db.get_lottery_heap_size().unwrap(), 0);
    }

    #[test]
    fn zero_anv_is_ineligible() {
        let db = ReferralsDb::new(NullKvStore::new());
        db.update_anv(AddressType::Wallet, &addr(1), 0).unwrap();
        assert_eq!(
            db.add_address_to_lottery(&seed(5), &addr(1)).unwrap(),
            LotteryAdmission::Ineligible
        );
    }

    #[test]
    fn full_reservoir_evicts_only_for_a_better_key() {
        let db = ReferralsDb::new(NullKvStore::new()).with_reservoir_capacity(2);
        for n in 1..=4u8 {
            db.update_anv(AddressType::Wallet, &addr(n), 100).unwrap();
        }
        let draw = 1u64 << 50;
        assert_eq!(
            db.add_address_to_lottery(&seed(draw), &addr(1)).unwrap(),
            LotteryAdmission::Inserted
        );
        assert_eq!(
            db.add_address_to_lottery(&seed(draw * 2), &addr(2)).unwrap(),
            LotteryAdmission::Inserted
        );

        // Smaller draw, same weight: smaller key, loses.
        assert_eq!(
            db.add_address_to_lottery(&seed(draw / 2), &addr(3)).unwrap(),
            LotteryAdmission::Discarded
        );
        assert_eq!(db.get_lottery_heap_size().unwrap(), 2);

        // Larger draw beats the current minimum (address 1).
        match db.add_address_to_lottery(&seed(draw * 4), &addr(4)).unwrap() {
            LotteryAdmission::Replaced { evicted } => assert_eq!(evicted.address, addr(1)),
            other => panic!("expected replacement, got {other:?}"),
        }
        let mut held: Vec<Address> = db
            .get_lottery_entries()
            .unwrap()
            .into_iter()
            .map(|e| e.address)
            .collect();
        held.sort();
        assert_eq!(held, vec![addr(2), addr(4)]);
    }

    #[test]
    fn same_address_may_hold_several_slots() {
        let db = ReferralsDb::new(NullKvStore::new());
        db.update_anv(AddressType::Wallet, &addr(1), 10).unwrap();
        for draw in [11u64, 22, 33] {
            assert!(db
                .add_address_to_lottery(&seed(draw << 30), &addr(1))
                .unwrap()
                .admitted());
        }
        assert_eq!(db.get_lottery_heap_size().unwrap(), 3);
    }

    #[test]
    fn heap_larger_than_capacity_is_fatal() {
        let db = ReferralsDb::new(NullKvStore::new()).with_reservoir_capacity(3);
        let mut txn = db.store().write_txn().unwrap();
        codec::write_heap_size(&mut txn, 5).unwrap();
        txn.commit().unwrap();
        db.update_anv(AddressType::Wallet, &addr(1), 10).unwrap();

        let err = db.add_address_to_lottery(&seed(99), &addr(1)).unwrap_err();
        assert!(err.is_fatal());
    }
}
