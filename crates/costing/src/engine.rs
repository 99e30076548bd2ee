//! The costing engine facade.
//!
//! Owns the ledger behind a mutex and exposes the callable operations
//! consumed by the sales, purchasing, finance, and reporting
//! collaborators. Every operation runs inside the lock, so
//! read-modify-write sequences on lot quantities never interleave; the
//! operations are short and CPU-bound, so the critical sections are too.

use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use saltbox_core::{ProductId, ReceiptId, SaleId, round_money, round_quantity};

use crate::allocation::{self, PartialAllocation, ReversalSummary, WriteOffSummary};
use crate::economics;
use crate::error::CostingError;
use crate::finance::{ExpenseFact, FinanceSink, RecordingFinanceSink};
use crate::models::{
    Allocation, ConsumerRef, FeeFact, ItemReceipt, Lot, NewReceipt, Receipt, ReportPeriod,
    SaleFact, UnitEconomicsReport, ValuationReport,
};
use crate::receiving::{self, ReceiveSummary};
use crate::reconcile::{self, DriftFinding};
use crate::store::{AllocationRepository, InMemoryLedger, LotRepository, ReceiptRepository};

#[derive(Debug)]
struct EngineState<F> {
    ledger: InMemoryLedger,
    finance: F,
}

/// Thread-safe entry point to the costing engine.
///
/// Expense facts flow to the injected [`FinanceSink`]; everything else
/// lives in the in-memory ledger.
#[derive(Debug)]
pub struct CostingEngine<F: FinanceSink> {
    state: Mutex<EngineState<F>>,
}

impl Default for CostingEngine<RecordingFinanceSink> {
    fn default() -> Self {
        Self::new(RecordingFinanceSink::new())
    }
}

impl CostingEngine<RecordingFinanceSink> {
    /// Expense facts recorded so far, in emission order.
    ///
    /// Only available with the recording sink; a production host
    /// injects its own sink and never needs this.
    #[must_use]
    pub fn recorded_expenses(&self) -> Vec<ExpenseFact> {
        self.state().finance.facts().to_vec()
    }
}

impl<F: FinanceSink> CostingEngine<F> {
    /// Create an engine with an empty ledger and the given finance sink.
    #[must_use]
    pub fn new(finance: F) -> Self {
        Self {
            state: Mutex::new(EngineState {
                ledger: InMemoryLedger::new(),
                finance,
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState<F>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // =========================================================================
    // Receipts
    // =========================================================================

    /// Draft a receipt. Money and quantity inputs are quantized on the
    /// way in, so everything stored downstream starts pre-rounded.
    pub fn draft_receipt(&self, new: NewReceipt) -> ReceiptId {
        self.state().ledger.insert_receipt(normalize_receipt(new))
    }

    /// Fetch a receipt for audit/drill-down.
    ///
    /// # Errors
    ///
    /// Returns [`CostingError::Store`] if the receipt doesn't exist.
    pub fn receipt(&self, receipt_id: ReceiptId) -> Result<Receipt, CostingError> {
        Ok(self.state().ledger.receipt(receipt_id)?.clone())
    }

    /// Receive a draft receipt; see [`receiving::receive`].
    ///
    /// # Errors
    ///
    /// See [`receiving::receive`].
    pub fn receive(
        &self,
        receipt_id: ReceiptId,
        receipts: &[ItemReceipt],
        received_at: DateTime<Utc>,
    ) -> Result<ReceiveSummary, CostingError> {
        let mut state = self.state();
        let EngineState { ledger, finance } = &mut *state;
        receiving::receive(ledger, finance, receipt_id, receipts, received_at)
    }

    /// Undo a receive; see [`receiving::unreceive`].
    ///
    /// # Errors
    ///
    /// See [`receiving::unreceive`].
    pub fn unreceive(
        &self,
        receipt_id: ReceiptId,
        occurred_at: DateTime<Utc>,
    ) -> Result<(), CostingError> {
        let mut state = self.state();
        let EngineState { ledger, finance } = &mut *state;
        receiving::unreceive(ledger, finance, receipt_id, occurred_at)
    }

    /// Abandon a draft receipt; see [`receiving::cancel`].
    ///
    /// # Errors
    ///
    /// See [`receiving::cancel`].
    pub fn cancel_receipt(&self, receipt_id: ReceiptId) -> Result<(), CostingError> {
        receiving::cancel(&mut self.state().ledger, receipt_id)
    }

    // =========================================================================
    // Allocation
    // =========================================================================

    /// Strict FIFO allocation; see [`allocation::allocate`].
    ///
    /// # Errors
    ///
    /// See [`allocation::allocate`].
    pub fn allocate(
        &self,
        product_id: ProductId,
        quantity: Decimal,
        consumer: ConsumerRef,
        allocated_at: DateTime<Utc>,
    ) -> Result<Vec<Allocation>, CostingError> {
        allocation::allocate(
            &mut self.state().ledger,
            product_id,
            quantity,
            consumer,
            allocated_at,
        )
    }

    /// Best-effort FIFO allocation; see [`allocation::allocate_partial`].
    ///
    /// # Errors
    ///
    /// See [`allocation::allocate_partial`].
    pub fn allocate_partial(
        &self,
        product_id: ProductId,
        quantity: Decimal,
        consumer: ConsumerRef,
        allocated_at: DateTime<Utc>,
    ) -> Result<PartialAllocation, CostingError> {
        allocation::allocate_partial(
            &mut self.state().ledger,
            product_id,
            quantity,
            consumer,
            allocated_at,
        )
    }

    /// Reverse a consumer's allocations; see [`allocation::reverse`].
    ///
    /// # Errors
    ///
    /// See [`allocation::reverse`].
    pub fn reverse(&self, consumer: ConsumerRef) -> Result<ReversalSummary, CostingError> {
        allocation::reverse(&mut self.state().ledger, consumer)
    }

    /// Write off inventory; see [`allocation::consume_for_write_off`].
    ///
    /// # Errors
    ///
    /// See [`allocation::consume_for_write_off`].
    pub fn consume_for_write_off(
        &self,
        product_id: ProductId,
        quantity: Decimal,
        occurred_at: DateTime<Utc>,
    ) -> Result<WriteOffSummary, CostingError> {
        let mut state = self.state();
        let EngineState { ledger, finance } = &mut *state;
        allocation::consume_for_write_off(ledger, finance, product_id, quantity, occurred_at)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Total remaining quantity for a product.
    #[must_use]
    pub fn available_quantity(&self, product_id: ProductId) -> Decimal {
        allocation::available_quantity(&self.state().ledger, product_id)
    }

    /// Weighted-average unit cost for a product; zero when no stock.
    #[must_use]
    pub fn weighted_average_cost(&self, product_id: ProductId) -> Decimal {
        allocation::weighted_average_cost(&self.state().ledger, product_id)
    }

    /// The product's lots in FIFO order, for audit/drill-down.
    #[must_use]
    pub fn lots(&self, product_id: ProductId) -> Vec<Lot> {
        self.state().ledger.fifo_lots(product_id)
    }

    /// Allocations carrying the given consumer reference.
    #[must_use]
    pub fn allocations_for_consumer(&self, consumer: ConsumerRef) -> Vec<Allocation> {
        self.state().ledger.allocations_for_consumer(consumer)
    }

    /// Allocations for any line of the given sale.
    #[must_use]
    pub fn allocations_for_sale(&self, sale_id: SaleId) -> Vec<Allocation> {
        self.state().ledger.allocations_for_sale(sale_id)
    }

    // =========================================================================
    // Reports
    // =========================================================================

    /// Unit-economics report; see [`economics::unit_economics`].
    #[must_use]
    pub fn unit_economics(
        &self,
        sales: &[SaleFact],
        fees: &[FeeFact],
        period: ReportPeriod,
        product_filter: Option<&[ProductId]>,
    ) -> UnitEconomicsReport {
        economics::unit_economics(&self.state().ledger, sales, fees, period, product_filter)
    }

    /// Inventory valuation; see [`economics::inventory_valuation`].
    #[must_use]
    pub fn inventory_valuation(&self) -> ValuationReport {
        economics::inventory_valuation(&self.state().ledger)
    }

    /// Integrity sweep; see [`reconcile::reconcile`].
    #[must_use]
    pub fn reconcile(&self) -> Vec<DriftFinding> {
        reconcile::reconcile(&self.state().ledger)
    }
}

fn normalize_receipt(mut new: NewReceipt) -> NewReceipt {
    for item in &mut new.items {
        item.ordered_qty = round_quantity(item.ordered_qty);
        item.price_per_unit = round_money(item.price_per_unit);
        item.extra_costs.packaging = round_money(item.extra_costs.packaging);
        item.extra_costs.logistics = round_money(item.extra_costs.logistics);
        item.extra_costs.customs = round_money(item.extra_costs.customs);
        item.extra_costs.other = round_money(item.extra_costs.other);
        item.volume = round_quantity(item.volume);
        item.weight = round_quantity(item.weight);
    }
    for cost in &mut new.shared_costs {
        cost.total_amount = round_money(cost.total_amount);
    }
    new
}
