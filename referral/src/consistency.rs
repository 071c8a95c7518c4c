//! Cross-index consistency checks.
//!
//! Run on startup (or after a suspected crash) to detect index drift before
//! the graph is used. Nothing here writes; findings are collected in a report
//! rather than failing on the first one.

use std::collections::BTreeMap;

use refdb_store::{KvStore, StoreError};
use refdb_types::{Address, Referral};

use crate::codec;
use crate::keys;
use crate::ReferralsDb;

/// Summary of a consistency check run.
#[derive(Debug, Default)]
pub struct ConsistencyReport {
    pub referrals_checked: u64,
    pub parent_entries_checked: u64,
    pub heap_slots_checked: u64,
    pub errors: Vec<String>,
}

impl ConsistencyReport {
    /// Returns `true` if no errors were detected.
    pub fn is_healthy(&self) -> bool {
        self.errors.is_empty()
    }
}

impl<S: KvStore> ReferralsDb<S> {
    /// Check that the parent and children indexes agree, that every referral
    /// has a parent entry, and that the lottery heap is ordered.
    pub fn check_consistency(&self) -> Result<ConsistencyReport, StoreError> {
        let mut report = ConsistencyReport::default();
        self.check_tree(&mut report)?;
        self.check_heap(&mut report)?;
        if !self.store.scan_prefix(&[keys::DB_REFERRALS_BY_KEY_ID])?.is_empty() {
            report
                .errors
                .push("entries present under the reserved key-id namespace".to_string());
        }
        if !report.is_healthy() {
            tracing::warn!(errors = report.errors.len(), "referral store is inconsistent");
        }
        Ok(report)
    }

    fn check_tree(&self, report: &mut ConsistencyReport) -> Result<(), StoreError> {
        let mut parents = BTreeMap::new();
        for (key, value) in self.store.scan_prefix(&[keys::DB_PARENT_KEY])? {
            report.parent_entries_checked += 1;
            let child = keys::address_suffix(keys::DB_PARENT_KEY, &key);
            match (child, Address::from_slice(&value)) {
                (Some(child), Ok(parent)) => {
                    parents.insert(child, parent);
                }
                _ => report.errors.push("malformed parent entry".to_string()),
            }
        }

        let mut children_lists = BTreeMap::new();
        for (key, value) in self.store.scan_prefix(&[keys::DB_CHILDREN])? {
            let parent = keys::address_suffix(keys::DB_CHILDREN, &key);
            match (parent, codec::decode::<Vec<Address>>(&value)) {
                (Some(parent), Ok(children)) => {
                    children_lists.insert(parent, children);
                }
                _ => report.errors.push("malformed children entry".to_string()),
            }
        }

        for (child, parent) in &parents {
            let listed = children_lists
                .get(parent)
                .is_some_and(|children| children.contains(child));
            if !listed {
                report
                    .errors
                    .push(format!("{child} has parent {parent} but is not among its children"));
            }
        }
        for (parent, children) in &children_lists {
            for child in children {
                if parents.get(child) != Some(parent) {
                    report
                        .errors
                        .push(format!("{child} is listed under {parent} without a matching parent entry"));
                }
            }
        }

        for (_, value) in self.store.scan_prefix(&[keys::DB_REFERRALS])? {
            report.referrals_checked += 1;
            match codec::decode::<Referral>(&value) {
                Ok(referral) if !parents.contains_key(&referral.pub_key_id) => {
                    report.errors.push(format!(
                        "referral {} for {} has no parent entry",
                        referral.code_hash, referral.pub_key_id
                    ));
                }
                Ok(_) => {}
                Err(e) => report.errors.push(format!("malformed referral: {e}")),
            }
        }
        Ok(())
    }

    fn check_heap(&self, report: &mut ConsistencyReport) -> Result<(), StoreError> {
        let size = codec::read_heap_size(&self.store)?;
        if size > self.reservoir_capacity {
            report.errors.push(format!(
                "lottery heap size {size} exceeds capacity {}",
                self.reservoir_capacity
            ));
        }

        let mut slots = BTreeMap::new();
        for (key, value) in self.store.scan_prefix(&[keys::DB_LOT_VAL])? {
            report.heap_slots_checked += 1;
            match (keys::slot_position(&key), codec::decode_slot(&value)) {
                (Some(pos), Ok(entry)) if pos < size => {
                    slots.insert(pos, entry);
                }
                (Some(pos), Ok(_)) => report
                    .errors
                    .push(format!("lottery slot {pos} lies beyond heap size {size}")),
                _ => report.errors.push("malformed lottery slot".to_string()),
            }
        }

        for pos in 0..size {
            let Some(entry) = slots.get(&pos) else {
                report.errors.push(format!("lottery slot {pos} is missing"));
                continue;
            };
            if pos == 0 {
                continue;
            }
            if let Some(parent) = slots.get(&((pos - 1) / 2)) {
                if parent.key > entry.key {
                    report
                        .errors
                        .push(format!("lottery slot {pos} is smaller than its parent"));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refdb_nullables::NullKvStore;
    use refdb_store::{LotteryStore, ReferralStore, WriteTxn};
    use refdb_types::{AddressType, CodeHash, LotteryEntry, WeightedKey};

    fn addr(n: u8) -> Address {
        Address::new([n; 20])
    }

    fn populated() -> ReferralsDb<NullKvStore> {
        let db = ReferralsDb::new(NullKvStore::new());
        let code = |n: u8| CodeHash::new([n; 32]);
        db.insert_referral(&Referral::new(code(1), addr(1), CodeHash::ZERO, AddressType::Wallet))
            .unwrap();
        db.insert_referral(&Referral::new(code(2), addr(2), code(1), AddressType::Wallet))
            .unwrap();
        for w in [4, 2, 9, 1] {
            db.insert_lottery_address(WeightedKey::from_draw(1 << 33, w).unwrap(), &addr(w as u8))
                .unwrap();
        }
        db
    }

    #[test]
    fn fresh_graph_is_healthy() {
        let report = populated().check_consistency().unwrap();
        assert!(report.is_healthy(), "{:?}", report.errors);
        assert_eq!(report.referrals_checked, 2);
        assert_eq!(report.parent_entries_checked, 2);
        assert_eq!(report.heap_slots_checked, 4);
    }

    #[test]
    fn missing_child_listing_is_reported() {
        let db = populated();
        let mut txn = db.store().write_txn().unwrap();
        txn.delete(&keys::children_key(&addr(1))).unwrap();
        txn.commit().unwrap();
        let report = db.check_consistency().unwrap();
        assert_eq!(report.errors.len(), 1, "{:?}", report.errors);
    }

    #[test]
    fn unordered_heap_is_reported() {
        let db = populated();
        let mut txn = db.store().write_txn().unwrap();
        let big = LotteryEntry::new(WeightedKey::from_draw(u64::MAX, i64::MAX).unwrap(), addr(7));
        codec::write_slot(&mut txn, 0, &big).unwrap();
        txn.commit().unwrap();
        let report = db.check_consistency().unwrap();
        assert!(!report.is_healthy());
    }

    #[test]
    fn reserved_namespace_must_stay_empty() {
        let db = populated();
        let mut txn = db.store().write_txn().unwrap();
        txn.put(&[keys::DB_REFERRALS_BY_KEY_ID, 1], b"x").unwrap();
        txn.commit().unwrap();
        assert!(!db.check_consistency().unwrap().is_healthy());
    }
}
