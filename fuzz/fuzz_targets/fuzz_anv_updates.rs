#![no_main]

use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;

use refdb_nullables::NullKvStore;
use refdb_referral::ReferralsDb;
use refdb_store::{AnvStore, ReferralStore};
use refdb_types::{Address, AddressType, CodeHash, Referral};

const NODES: u8 = 8;

// parent index of each node, 0 meaning root
const PARENTS: [u8; NODES as usize] = [0, 1, 1, 2, 2, 3, 0, 7];

fn address(n: u8) -> Address {
    Address::new([n; 20])
}

fn code(n: u8) -> CodeHash {
    CodeHash::new([n; 32])
}

fn chain(node: u8) -> Vec<u8> {
    let mut out = vec![node];
    let mut current = node;
    while PARENTS[current as usize - 1] != 0 {
        current = PARENTS[current as usize - 1];
        out.push(current);
    }
    out
}

// Drive arbitrary ANV updates over a fixed forest. Legal updates must succeed
// and match a shadow model; updates that would overdraw an ancestor must fail
// fatally without touching the store.
fuzz_target!(|data: &[u8]| {
    let db = ReferralsDb::new(NullKvStore::new());
    for n in 1..=NODES {
        let parent = PARENTS[n as usize - 1];
        let previous = if parent == 0 { CodeHash::ZERO } else { code(parent) };
        let referral = Referral::new(code(n), address(n), previous, AddressType::Wallet);
        if db.insert_referral(&referral).is_err() {
            return;
        }
    }

    let mut model: HashMap<u8, i64> = HashMap::new();
    for op in data.chunks_exact(3) {
        let node = op[0] % NODES + 1;
        let change = i64::from(i16::from_le_bytes([op[1], op[2]]));
        let path = chain(node);
        let legal = path
            .iter()
            .all(|n| model.get(n).copied().unwrap_or(0) + change >= 0);

        let before = db.store().snapshot();
        let result = db.update_anv(AddressType::Wallet, &address(node), change);
        if legal {
            assert!(result.is_ok(), "legal update rejected: {result:?}");
            for n in path {
                *model.entry(n).or_insert(0) += change;
            }
        } else {
            let err = result.expect_err("overdraft accepted");
            assert!(err.is_fatal());
            assert_eq!(before, db.store().snapshot());
        }
    }

    for (n, expected) in model {
        let anv = db.get_anv(&address(n)).unwrap().map(|r| r.anv).unwrap_or(0);
        assert_eq!(anv, expected);
    }
});
