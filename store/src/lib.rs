//! Storage traits for the referral graph.
//!
//! Two layers live here. The KV adapter traits ([`KvStore`], [`ReadTxn`],
//! [`WriteTxn`]) describe the ordered key-value engine underneath; every
//! backend (LMDB, in-memory for testing) implements them. The component traits
//! ([`ReferralStore`], [`AnvStore`], [`LotteryStore`]) describe the referral
//! graph operations built on top. The rest of the codebase depends only on
//! the traits.

pub mod anv;
pub mod error;
pub mod kv;
pub mod lottery;
pub mod referral;

pub use anv::AnvStore;
pub use error::{InvariantViolation, StoreError};
pub use kv::{KvStore, ReadTxn, WriteTxn};
pub use lottery::{LotteryAdmission, LotteryStore};
pub use referral::ReferralStore;
