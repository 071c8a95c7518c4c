//! Fundamental types for the referral graph store.
//!
//! This crate defines the types shared across every other crate in the workspace:
//! addresses, referral code hashes, referral records, ANV records, and the
//! weighted keys ordering the lottery reservoir.

pub mod address;
pub mod anv;
pub mod error;
pub mod hash;
pub mod lottery;
pub mod referral;

pub use address::Address;
pub use anv::{AddressAnv, Amount};
pub use error::TypeError;
pub use hash::CodeHash;
pub use lottery::{LotteryEntry, WeightedKey};
pub use referral::{AddressType, Referral};
