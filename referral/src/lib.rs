//! Persistent referral graph.
//!
//! [`ReferralsDb`] layers three components over one ordered key-value store:
//! - the referral tree (records plus parent and children indexes),
//! - the ANV aggregator, pushing value changes up every ancestor chain,
//! - the lottery reservoir, a persisted bounded min-heap for weighted sampling.
//!
//! Each mutating operation runs in a single write transaction of the store, so
//! it is applied completely or not at all.

pub mod anv;
pub mod codec;
pub mod consistency;
pub mod db;
pub mod keys;
pub mod lottery;
pub mod tree;

pub use consistency::ConsistencyReport;
pub use db::{ReferralsDb, MAX_LEVELS, MAX_RESERVOIR_SIZE};
