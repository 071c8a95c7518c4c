//! Value encodings and typed reads.
//!
//! Structured values (referrals, ANV records, children lists) are `bincode`.
//! Parent entries are the raw 20 address bytes, the heap size is a big-endian
//! u64, and a heap slot is the 16-byte weighted key followed by the address.

use serde::de::DeserializeOwned;
use serde::Serialize;

use refdb_store::{InvariantViolation, ReadTxn, StoreError, WriteTxn};
use refdb_types::{Address, AddressAnv, CodeHash, LotteryEntry, Referral, WeightedKey};

use crate::keys;

const SLOT_LEN: usize = WeightedKey::ENCODED_LEN + Address::LEN;

pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
    bincode::serialize(value).map_err(|e| StoreError::Serialization(e.to_string()))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
    bincode::deserialize(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

pub fn encode_slot(entry: &LotteryEntry) -> [u8; SLOT_LEN] {
    let mut buf = [0u8; SLOT_LEN];
    buf[..WeightedKey::ENCODED_LEN].copy_from_slice(&entry.key.to_bytes());
    buf[WeightedKey::ENCODED_LEN..].copy_from_slice(entry.address.as_bytes());
    buf
}

pub fn decode_slot(bytes: &[u8]) -> Result<LotteryEntry, StoreError> {
    if bytes.len() != SLOT_LEN {
        return Err(StoreError::Serialization(format!(
            "lottery slot has {} bytes, expected {}",
            bytes.len(),
            SLOT_LEN
        )));
    }
    let key = WeightedKey::from_bytes(&bytes[..WeightedKey::ENCODED_LEN])?;
    let address = Address::from_slice(&bytes[WeightedKey::ENCODED_LEN..])?;
    Ok(LotteryEntry::new(key, address))
}

// ── Typed reads ─────────────────────────────────────────────────────────

pub fn read_referral<R: ReadTxn + ?Sized>(
    r: &R,
    code_hash: &CodeHash,
) -> Result<Option<Referral>, StoreError> {
    r.get(&keys::referral_key(code_hash))?
        .map(|bytes| decode(&bytes))
        .transpose()
}

/// The stored parent entry, root sentinel included.
pub fn read_parent<R: ReadTxn + ?Sized>(
    r: &R,
    address: &Address,
) -> Result<Option<Address>, StoreError> {
    r.get(&keys::parent_key(address))?
        .map(|bytes| Address::from_slice(&bytes).map_err(StoreError::from))
        .transpose()
}

pub fn read_children<R: ReadTxn + ?Sized>(
    r: &R,
    address: &Address,
) -> Result<Vec<Address>, StoreError> {
    match r.get(&keys::children_key(address))? {
        Some(bytes) => decode(&bytes),
        None => Ok(Vec::new()),
    }
}

pub fn read_anv<R: ReadTxn + ?Sized>(
    r: &R,
    address: &Address,
) -> Result<Option<AddressAnv>, StoreError> {
    r.get(&keys::anv_key(address))?
        .map(|bytes| decode(&bytes))
        .transpose()
}

pub fn read_heap_size<R: ReadTxn + ?Sized>(r: &R) -> Result<usize, StoreError> {
    match r.get(&keys::lottery_size_key())? {
        Some(bytes) => {
            let arr: [u8; 8] = bytes.as_slice().try_into().map_err(|_| {
                StoreError::Serialization("lottery heap size has unexpected length".into())
            })?;
            usize::try_from(u64::from_be_bytes(arr))
                .map_err(|e| StoreError::Serialization(e.to_string()))
        }
        None => Ok(0),
    }
}

pub fn read_slot<R: ReadTxn + ?Sized>(
    r: &R,
    position: usize,
) -> Result<Option<LotteryEntry>, StoreError> {
    r.get(&keys::lottery_slot_key(position))?
        .map(|bytes| decode_slot(&bytes))
        .transpose()
}

/// Read a slot that must exist because it lies below the heap size.
pub fn read_occupied_slot<R: ReadTxn + ?Sized>(
    r: &R,
    position: usize,
    size: usize,
) -> Result<LotteryEntry, StoreError> {
    read_slot(r, position)?
        .ok_or_else(|| InvariantViolation::MissingHeapSlot { position, size }.into())
}

// ── Typed writes ────────────────────────────────────────────────────────

pub fn write_heap_size<W: WriteTxn + ?Sized>(w: &mut W, size: usize) -> Result<(), StoreError> {
    w.put(&keys::lottery_size_key(), &(size as u64).to_be_bytes())
}

pub fn write_slot<W: WriteTxn + ?Sized>(
    w: &mut W,
    position: usize,
    entry: &LotteryEntry,
) -> Result<(), StoreError> {
    w.put(&keys::lottery_slot_key(position), &encode_slot(entry))
}

#[cfg(test)]
mod tests {
    use super::*;
    use refdb_types::AddressType;

    #[test]
    fn slot_encoding_layout() {
        let entry = LotteryEntry::new(
            WeightedKey::from_draw(77, 500).unwrap(),
            Address::new([4u8; 20]),
        );
        let bytes = encode_slot(&entry);
        assert_eq!(bytes.len(), 36);
        assert_eq!(&bytes[16..], &[4u8; 20]);
        assert_eq!(decode_slot(&bytes).unwrap(), entry);
    }

    #[test]
    fn short_slot_is_serialization_error() {
        let err = decode_slot(&[0u8; 20]).unwrap_err();
        assert!(matches!(err, StoreError::Serialization(_)));
    }

    #[test]
    fn corrupt_anv_bytes_fail_to_decode() {
        let record = AddressAnv::new(AddressType::Wallet, Address::new([1u8; 20]), 5);
        let mut bytes = encode(&record).unwrap();
        bytes[0] = 200;
        assert!(decode::<AddressAnv>(&bytes).is_err());
    }
}
