use std::collections::HashMap;

use proptest::prelude::*;

use refdb_nullables::NullKvStore;
use refdb_referral::ReferralsDb;
use refdb_store::{AnvStore, InvariantViolation, LotteryStore, ReferralStore, StoreError};
use refdb_types::{Address, AddressType, CodeHash, Referral, WeightedKey};

fn addr(n: u8) -> Address {
    Address::new([n + 1; 20])
}

/// Build a forest where node `i` is invited by node `parents[i] - 1`, or is a
/// root when that value is zero or not smaller than `i`.
fn forest(parents: &[u8]) -> (ReferralsDb<NullKvStore>, Vec<Option<u8>>) {
    let db = ReferralsDb::new(NullKvStore::new());
    let mut links = Vec::with_capacity(parents.len());
    for (i, &p) in parents.iter().enumerate() {
        let i = i as u8;
        let parent = (p > 0 && p - 1 < i).then(|| p - 1);
        let previous = parent.map_or(CodeHash::ZERO, |p| CodeHash::new([p + 1; 32]));
        let referral = Referral::new(CodeHash::new([i + 1; 32]), addr(i), previous, AddressType::Wallet);
        db.insert_referral(&referral).unwrap();
        links.push(parent);
    }
    (db, links)
}

fn ancestors_and_self(links: &[Option<u8>], node: u8) -> Vec<u8> {
    let mut out = vec![node];
    let mut current = node;
    while let Some(parent) = links[current as usize] {
        out.push(parent);
        current = parent;
    }
    out
}

proptest! {
    /// Pops come out in ascending key order and the stored heap stays ordered
    /// under any mix of inserts and pops.
    #[test]
    fn heap_order_survives_inserts_and_pops(
        ops in prop::collection::vec((any::<bool>(), any::<u64>(), 1i64..1_000), 1..200),
    ) {
        let db = ReferralsDb::new(NullKvStore::new()).with_reservoir_capacity(24);
        let mut shadow: Vec<WeightedKey> = Vec::new();

        for (i, (insert, draw, weight)) in ops.into_iter().enumerate() {
            if insert {
                let key = WeightedKey::from_draw(draw, weight).unwrap();
                if db.insert_lottery_address(key, &addr(i as u8)).unwrap() {
                    shadow.push(key);
                }
            } else {
                shadow.sort();
                let expected = (!shadow.is_empty()).then(|| shadow.remove(0));
                prop_assert_eq!(db.pop_lottery_min().unwrap().map(|e| e.key), expected);
            }

            let entries = db.get_lottery_entries().unwrap();
            prop_assert_eq!(entries.len(), shadow.len());
            for pos in 1..entries.len() {
                prop_assert!(entries[(pos - 1) / 2].key <= entries[pos].key);
            }
        }
    }

    /// Updates whose running totals stay non-negative always succeed, and each
    /// address ends up with the sum of the changes made at or below it.
    #[test]
    fn legal_updates_never_trip_the_invariant(
        parents in prop::collection::vec(0u8..12, 1..12),
        credits in prop::collection::vec((0u8..12, 0i64..10_000), 0..40),
    ) {
        let (db, links) = forest(&parents);
        let n = links.len() as u8;
        let mut expected: HashMap<u8, i64> = HashMap::new();

        for (node, amount) in credits {
            let node = node % n;
            db.update_anv(AddressType::Wallet, &addr(node), amount).unwrap();
            for x in ancestors_and_self(&links, node) {
                *expected.entry(x).or_insert(0) += amount;
            }
        }

        for node in 0..n {
            let anv = db.get_anv(&addr(node)).unwrap().map_or(0, |r| r.anv);
            prop_assert_eq!(anv, expected.get(&node).copied().unwrap_or(0));
        }

        // Debit everything back from the leaves up. Children always carry a
        // larger index than their parent, so each node only holds its own
        // credits by the time it is reached.
        for node in (0..n).rev() {
            let own = db.get_anv(&addr(node)).unwrap().map_or(0, |r| r.anv);
            if own > 0 {
                db.update_anv(AddressType::Wallet, &addr(node), -own).unwrap();
            }
        }

        for anv in db.get_all_anvs().unwrap() {
            prop_assert_eq!(anv.anv, 0);
        }
    }

    /// An update that would overdraw any address on the chain is fatal and
    /// leaves the store exactly as it was.
    #[test]
    fn overdraft_is_fatal_and_changes_nothing(
        parents in prop::collection::vec(0u8..8, 1..8),
        credit in 0i64..1_000,
        node in 0u8..8,
        excess in 1i64..1_000,
    ) {
        let (db, links) = forest(&parents);
        let node = node % links.len() as u8;
        db.update_anv(AddressType::Wallet, &addr(node), credit).unwrap();

        let before = db.store().snapshot();
        let err = db
            .update_anv(AddressType::Wallet, &addr(node), -(credit + excess))
            .unwrap_err();

        prop_assert!(err.is_fatal());
        let is_negative_anv = matches!(
            err,
            StoreError::Invariant(InvariantViolation::NegativeAnv { .. })
        );
        prop_assert!(is_negative_anv);
        prop_assert_eq!(before, db.store().snapshot());
    }
}
