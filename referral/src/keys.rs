//! Key schema.
//!
//! Every key is a one-byte namespace tag followed by a fixed-width suffix:
//!
//! | tag | suffix | value |
//! |-----|--------|-------|
//! | `c` | address (20) | children addresses |
//! | `r` | code hash (32) | referral |
//! | `p` | address (20) | parent address |
//! | `a` | address (20) | ANV record |
//! | `s` | none | heap size |
//! | `v` | position (u64 BE) | weighted key + address |

use refdb_types::{Address, CodeHash};

pub const DB_CHILDREN: u8 = b'c';
pub const DB_REFERRALS: u8 = b'r';
/// Reserved for a referrals-by-key-id index. Nothing reads or writes it.
pub const DB_REFERRALS_BY_KEY_ID: u8 = b'k';
pub const DB_PARENT_KEY: u8 = b'p';
pub const DB_ANV: u8 = b'a';
pub const DB_LOT_SIZE: u8 = b's';
pub const DB_LOT_VAL: u8 = b'v';

fn address_key(tag: u8, address: &Address) -> [u8; 21] {
    let mut key = [0u8; 21];
    key[0] = tag;
    key[1..].copy_from_slice(address.as_bytes());
    key
}

pub fn children_key(address: &Address) -> [u8; 21] {
    address_key(DB_CHILDREN, address)
}

pub fn parent_key(address: &Address) -> [u8; 21] {
    address_key(DB_PARENT_KEY, address)
}

pub fn anv_key(address: &Address) -> [u8; 21] {
    address_key(DB_ANV, address)
}

pub fn referral_key(code_hash: &CodeHash) -> [u8; 33] {
    let mut key = [0u8; 33];
    key[0] = DB_REFERRALS;
    key[1..].copy_from_slice(code_hash.as_bytes());
    key
}

pub fn lottery_size_key() -> [u8; 1] {
    [DB_LOT_SIZE]
}

pub fn lottery_slot_key(position: usize) -> [u8; 9] {
    let mut key = [0u8; 9];
    key[0] = DB_LOT_VAL;
    key[1..].copy_from_slice(&(position as u64).to_be_bytes());
    key
}

/// The address suffix of an address-keyed entry, if `key` is one under `tag`.
pub fn address_suffix(tag: u8, key: &[u8]) -> Option<Address> {
    match key.split_first() {
        Some((&t, rest)) if t == tag => Address::from_slice(rest).ok(),
        _ => None,
    }
}

/// The heap position of a slot key.
pub fn slot_position(key: &[u8]) -> Option<usize> {
    match key.split_first() {
        Some((&DB_LOT_VAL, rest)) => {
            let arr: [u8; 8] = rest.try_into().ok()?;
            usize::try_from(u64::from_be_bytes(arr)).ok()
        }
        _ => None,
    }
}
