//! Referral tree storage trait.

use crate::StoreError;
use refdb_types::{Address, CodeHash, Referral};

/// Trait for the referral forest.
///
/// Two indexes are kept alongside the referral records:
/// - **Parent index**: address → inviter address.
/// - **Children index**: address → addresses it invited, in insertion order.
///   Materialized as one list per inviter so "who did X invite" is a single
///   point read.
pub trait ReferralStore {
    /// Look up a referral by its code hash.
    fn get_referral(&self, code_hash: &CodeHash) -> Result<Option<Referral>, StoreError>;

    /// The inviter of `address`, or `None` for roots and unknown addresses.
    fn get_referrer(&self, address: &Address) -> Result<Option<Address>, StoreError>;

    /// Addresses invited by `address`. Empty if none.
    fn get_children(&self, address: &Address) -> Result<Vec<Address>, StoreError>;

    /// Record a referral and update both indexes.
    ///
    /// The inviter is resolved through `previous_referral`; referrals must be
    /// inserted parent before child, otherwise the new address is attached to
    /// the root sentinel.
    fn insert_referral(&self, referral: &Referral) -> Result<(), StoreError>;

    /// Remove a referral and reverse both index updates.
    fn remove_referral(&self, referral: &Referral) -> Result<(), StoreError>;

    fn referral_code_exists(&self, code_hash: &CodeHash) -> Result<bool, StoreError>;

    /// Whether `address` has been referred (roots included).
    fn has_parent_entry(&self, address: &Address) -> Result<bool, StoreError>;
}
