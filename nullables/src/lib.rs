//! Nullable infrastructure for deterministic testing.
//!
//! The key-value engine is abstracted behind the `refdb-store` KV traits. This
//! crate provides a test-friendly implementation that:
//! - Never touches the filesystem
//! - Can be inspected as a whole (snapshot comparisons)
//! - Can be armed to fail a chosen write, simulating a crash mid-operation
//!
//! Usage: swap the LMDB environment for a nullable in tests.

pub mod store;

pub use store::{NullKvStore, NullWriteTxn};
