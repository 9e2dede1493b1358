//! Error types for the delivery module.

use thiserror::Error;

/// Errors that can occur during delivery orchestration.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// Storage error.
    #[error("store error: {0}")]
    Store(#[from] presswire_store::StoreError),

    /// The subscriber's stored UTC offset is outside the representable range.
    #[error("invalid UTC offset: {0} minutes")]
    InvalidUtcOffset(i32),
}

/// Result type for delivery operations.
pub type Result<T> = std::result::Result<T, DeliveryError>;
