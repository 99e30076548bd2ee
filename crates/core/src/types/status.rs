//! Status enums for purchasing and sales lifecycles.

use serde::{Deserialize, Serialize};

/// Purchase receipt lifecycle.
///
/// `Draft → Received` is terminal for a fulfilled receipt; `Draft →
/// Cancelled` is terminal for an abandoned one. `Received` can only be
/// undone by a compensating unreceive, which moves the receipt back to
/// `Draft`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptStatus {
    #[default]
    Draft,
    Received,
    Cancelled,
}

/// Per-item state within a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReceiptItemStatus {
    #[default]
    Pending,
    /// Received less than the ordered quantity.
    Partial,
    Received,
    Cancelled,
}

/// Sale state as reported by the sales collaborator.
///
/// Cancelled sales are excluded from unit-economics reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    #[default]
    Completed,
    Cancelled,
}
