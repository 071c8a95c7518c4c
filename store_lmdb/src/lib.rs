//! LMDB storage backend for the referral graph store.
//!
//! Implements the KV adapter traits from `refdb-store` using the `heed` LMDB
//! bindings. All namespaces share one LMDB database; keys carry a leading
//! namespace tag.

pub mod config;
pub mod environment;
pub mod error;
pub mod integrity;
pub mod transaction;

pub use config::StoreConfig;
pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use transaction::LmdbWriteTxn;
