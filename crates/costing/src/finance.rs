//! Expense facts emitted toward the finance collaborator.
//!
//! The engine never posts to a ledger itself; it hands structured facts
//! to a [`FinanceSink`] injected by the host application. Reversals are
//! separate facts with the original amount, netted by the consumer.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use saltbox_core::{CurrencyCode, ProductId, ReceiptId};

/// What kind of expense a fact records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpenseKind {
    /// Goods received from a supplier; amount is the receipt's landed total.
    Purchase,
    /// Compensation for an unreceived receipt; same amount as the
    /// original purchase fact.
    PurchaseReversal,
    /// Inventory consumed without a sale (damage, loss, shrinkage).
    WriteOff,
}

/// A single expense fact.
#[derive(Debug, Clone, Serialize)]
pub struct ExpenseFact {
    /// Expense category.
    pub kind: ExpenseKind,
    /// Receipt the fact stems from, for purchase facts.
    pub receipt_id: Option<ReceiptId>,
    /// Product involved, for write-off facts.
    pub product_id: Option<ProductId>,
    /// Amount, always positive.
    pub amount: Decimal,
    /// Currency of `amount`.
    pub currency_code: CurrencyCode,
    /// When the underlying event happened.
    pub occurred_at: DateTime<Utc>,
}

/// Destination for expense facts.
pub trait FinanceSink {
    /// Record one expense fact.
    fn record(&mut self, fact: ExpenseFact);
}

/// In-memory sink that keeps every fact it receives.
///
/// Used by tests and the CLI; a production host would forward facts to
/// its accounting service instead.
#[derive(Debug, Default)]
pub struct RecordingFinanceSink {
    facts: Vec<ExpenseFact>,
}

impl RecordingFinanceSink {
    /// Create an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Facts recorded so far, in arrival order.
    #[must_use]
    pub fn facts(&self) -> &[ExpenseFact] {
        &self.facts
    }
}

impl FinanceSink for RecordingFinanceSink {
    fn record(&mut self, fact: ExpenseFact) {
        self.facts.push(fact);
    }
}
