//! ANV aggregation storage trait.

use crate::StoreError;
use refdb_types::{Address, AddressAnv, AddressType, Amount};

/// Trait for aggregate net values.
///
/// Every change is pushed through every ancestor when it happens, so reads are
/// a single lookup and writes cost one update per level of the chain.
pub trait AnvStore {
    /// Add `change` (possibly negative) to `start` and every ancestor of it.
    ///
    /// The record of `start` is stamped with `address_type` and `start`;
    /// ancestors keep their own type and origin. Fails with a fatal
    /// [`crate::InvariantViolation`] if any amount would go negative or the
    /// ancestor walk does not terminate.
    fn update_anv(
        &self,
        address_type: AddressType,
        start: &Address,
        change: Amount,
    ) -> Result<(), StoreError>;

    fn get_anv(&self, address: &Address) -> Result<Option<AddressAnv>, StoreError>;

    /// Every ANV record, in key order.
    fn get_all_anvs(&self) -> Result<Vec<AddressAnv>, StoreError>;

    /// ANV records whose address type is eligible for rewards.
    fn get_all_rewardable_anvs(&self) -> Result<Vec<AddressAnv>, StoreError>;
}
