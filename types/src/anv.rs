//! Aggregate net value records.

use serde::{Deserialize, Serialize};

use crate::{Address, AddressType};

/// Signed amount type for ANV values. Stored amounts are never negative.
pub type Amount = i64;

/// The ANV record of one address: its type, its origin address, and the
/// cumulative value credited to it and everything it transitively invited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AddressAnv {
    pub address_type: AddressType,
    pub address: Address,
    pub anv: Amount,
}

impl AddressAnv {
    pub fn new(address_type: AddressType, address: Address, anv: Amount) -> Self {
        Self {
            address_type,
            address,
            anv,
        }
    }
}
