use refdb_types::{Address, Amount};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),

    /// Persisted state or a caller precondition is broken. Never retry.
    #[error("invariant violated: {0}")]
    Invariant(#[from] InvariantViolation),
}

impl StoreError {
    /// Whether the caller must stop instead of retrying the operation.
    pub fn is_fatal(&self) -> bool {
        matches!(self, StoreError::Invariant(_))
    }
}

impl From<refdb_types::TypeError> for StoreError {
    fn from(e: refdb_types::TypeError) -> Self {
        StoreError::Serialization(e.to_string())
    }
}

/// Conditions that must never occur in correct operation.
///
/// Raising one aborts the surrounding write transaction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("ANV of {address} would become negative: {amount}")]
    NegativeAnv { address: Address, amount: Amount },

    #[error("ANV of {address} overflows when adding {change}")]
    AnvOverflow { address: Address, change: Amount },

    #[error("referral cycle: ancestor walk from {start} still running after {levels} levels")]
    CycleDetected { start: Address, levels: usize },

    #[error("lottery heap slot {position} missing (heap size {size})")]
    MissingHeapSlot { position: usize, size: usize },

    #[error("lottery heap size {size} exceeds capacity {capacity}")]
    HeapOverCapacity { size: usize, capacity: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_invariant_errors_are_fatal() {
        assert!(!StoreError::Backend("disk full".into()).is_fatal());
        assert!(!StoreError::NotFound("x".into()).is_fatal());
        let fatal: StoreError = InvariantViolation::CycleDetected {
            start: Address::ZERO,
            levels: 3,
        }
        .into();
        assert!(fatal.is_fatal());
    }

    #[test]
    fn type_errors_become_serialization_errors() {
        let e: StoreError = refdb_types::TypeError::UnknownAddressType(7).into();
        assert!(matches!(e, StoreError::Serialization(_)));
    }
}
