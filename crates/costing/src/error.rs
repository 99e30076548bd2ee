//! Error types for the costing engine.

use rust_decimal::Decimal;
use thiserror::Error;

use saltbox_core::{ProductId, ReceiptId, ReceiptStatus};

/// Errors that can occur during ledger store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Requested entity was not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// A store-level constraint was violated (e.g., a lot's remaining
    /// quantity would go negative).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Engine-level error type for costing operations.
///
/// Every variant is a typed, terminal failure of the operation that
/// raised it; nothing is retried internally. Strict allocation and
/// write-off consumption roll back their partial effects before
/// returning [`CostingError::InsufficientInventory`], so re-running the
/// operation is safe.
#[derive(Debug, Error)]
pub enum CostingError {
    /// Ledger store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Strict allocation or write-off could not be satisfied from the
    /// available lots. No partial mutation survives.
    #[error(
        "insufficient inventory for product {product_id}: requested {requested}, available {available}"
    )]
    InsufficientInventory {
        product_id: ProductId,
        requested: Decimal,
        available: Decimal,
    },

    /// A receive/unreceive/cancel was attempted against a receipt that is
    /// not in the required state. No state change occurred.
    #[error("receipt {receipt_id} is {actual:?}, operation requires {expected:?}")]
    InvalidReceiptState {
        receipt_id: ReceiptId,
        expected: ReceiptStatus,
        actual: ReceiptStatus,
    },

    /// Unreceive was blocked because inventory from this receipt's lots
    /// has already been consumed (allocations or write-offs). The caller
    /// must reverse the consuming sales first.
    #[error("lots created by receipt {receipt_id} are in use")]
    LotsInUse { receipt_id: ReceiptId },

    /// Input failed validation (non-positive quantity, empty apportionment
    /// input, nothing to receive, ...).
    #[error("validation failed: {0}")]
    Validation(String),
}

impl CostingError {
    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}
