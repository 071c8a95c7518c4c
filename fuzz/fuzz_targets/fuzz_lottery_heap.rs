#![no_main]

use libfuzzer_sys::fuzz_target;

use refdb_nullables::NullKvStore;
use refdb_referral::ReferralsDb;
use refdb_store::LotteryStore;
use refdb_types::{Address, WeightedKey};

const CAPACITY: usize = 16;

// Interleave inserts and pops on a small reservoir. Pops must come out in
// ascending key order relative to what the heap held, and the stored heap must
// stay consistent throughout.
fuzz_target!(|data: &[u8]| {
    let db = ReferralsDb::new(NullKvStore::new()).with_reservoir_capacity(CAPACITY);
    let mut shadow: Vec<WeightedKey> = Vec::new();

    for op in data.chunks_exact(9) {
        if op[0] & 1 == 0 {
            let draw = u64::from_le_bytes(op[1..9].try_into().unwrap());
            let weight = i64::from(op[0] >> 1) + 1;
            let Some(key) = WeightedKey::from_draw(draw, weight) else {
                continue;
            };
            let inserted = db.insert_lottery_address(key, &Address::new([op[1]; 20])).unwrap();
            assert_eq!(inserted, shadow.len() < CAPACITY);
            if inserted {
                shadow.push(key);
            }
        } else {
            let popped = db.pop_lottery_min().unwrap().map(|entry| entry.key);
            shadow.sort();
            let expected = if shadow.is_empty() { None } else { Some(shadow.remove(0)) };
            assert_eq!(popped, expected);
        }
        assert_eq!(db.get_lottery_heap_size().unwrap(), shadow.len());
    }

    assert!(db.check_consistency().unwrap().is_healthy());
});
