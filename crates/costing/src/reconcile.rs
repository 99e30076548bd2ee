//! Integrity reconciliation over lots and allocations.
//!
//! Run periodically (or after suspicious operations) to verify that
//! every lot still satisfies quantity conservation. A finding is a data
//! bug: it is logged and surfaced, never corrected in place.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::error;

use saltbox_core::{LotId, ProductId};

use crate::store::{AllocationRepository, LotRepository};

/// One lot that fails conservation.
///
/// Conservation requires `initial == remaining + Σ active allocations +
/// written_off` and `remaining ≥ 0`; `drift` is the signed gap
/// (`remaining − expected remaining`).
#[derive(Debug, Clone, Serialize)]
pub struct DriftFinding {
    /// Lot that drifted.
    pub lot_id: LotId,
    /// Product the lot holds.
    pub product_id: ProductId,
    /// Quantity originally received.
    pub initial_qty: Decimal,
    /// Remaining quantity currently recorded.
    pub remaining_qty: Decimal,
    /// Sum of active allocation quantities for the lot.
    pub allocated_qty: Decimal,
    /// Quantity written off from the lot.
    pub written_off_qty: Decimal,
    /// `remaining − (initial − allocated − written_off)`.
    pub drift: Decimal,
}

/// Sweep all lots and report every conservation violation.
///
/// Returns an empty vector when the ledger is consistent. Findings are
/// also logged at error level.
#[must_use]
pub fn reconcile<S>(store: &S) -> Vec<DriftFinding>
where
    S: LotRepository + AllocationRepository,
{
    let mut findings = Vec::new();
    for lot in store.all_lots() {
        let allocated_qty: Decimal = store
            .allocations_for_lot(lot.id)
            .iter()
            .map(|allocation| allocation.quantity)
            .sum();
        let expected_remaining = lot.initial_qty - allocated_qty - lot.written_off_qty;
        let drift = lot.remaining_qty - expected_remaining;

        if !drift.is_zero() || lot.remaining_qty < Decimal::ZERO {
            error!(
                lot_id = %lot.id,
                product_id = %lot.product_id,
                %drift,
                remaining = %lot.remaining_qty,
                "lot quantity conservation violated"
            );
            findings.push(DriftFinding {
                lot_id: lot.id,
                product_id: lot.product_id,
                initial_qty: lot.initial_qty,
                remaining_qty: lot.remaining_qty,
                allocated_qty,
                written_off_qty: lot.written_off_qty,
                drift,
            });
        }
    }
    findings
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use saltbox_core::{CurrencyCode, ReceiptItemId, SaleId, SaleItemId};

    use crate::allocation::{allocate, consume_for_write_off, reverse};
    use crate::finance::RecordingFinanceSink;
    use crate::models::ConsumerRef;
    use crate::store::{InMemoryLedger, NewAllocation, NewLot};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn seeded_ledger() -> InMemoryLedger {
        let mut ledger = InMemoryLedger::new();
        ledger.insert_lot(NewLot {
            product_id: ProductId::new(1),
            source_receipt_item_id: ReceiptItemId::new(1),
            quantity: dec("100"),
            cost_per_unit: dec("10.00"),
            currency_code: CurrencyCode::USD,
            received_at: Utc.with_ymd_and_hms(2025, 8, 1, 0, 0, 0).unwrap(),
        });
        ledger
    }

    #[test]
    fn test_consistent_ledger_has_no_findings() {
        let mut ledger = seeded_ledger();
        let mut finance = RecordingFinanceSink::new();
        let consumer = ConsumerRef::new(SaleId::new(1), SaleItemId::new(1));
        let when = Utc.with_ymd_and_hms(2025, 8, 2, 0, 0, 0).unwrap();

        allocate(&mut ledger, ProductId::new(1), dec("30"), consumer, when).unwrap();
        consume_for_write_off(&mut ledger, &mut finance, ProductId::new(1), dec("5"), when)
            .unwrap();
        assert!(reconcile(&ledger).is_empty());

        reverse(&mut ledger, consumer).unwrap();
        assert!(reconcile(&ledger).is_empty());
    }

    #[test]
    fn test_orphaned_allocation_is_reported() {
        let mut ledger = seeded_ledger();
        let lot_id = ledger.all_lots()[0].id;

        // Allocation written without consuming the lot: conservation broken.
        ledger.insert_allocation(NewAllocation {
            lot_id,
            consumer: ConsumerRef::new(SaleId::new(1), SaleItemId::new(1)),
            quantity: dec("10"),
            cost_per_unit: dec("10.00"),
            total_cost: dec("100.00"),
            allocated_at: Utc.with_ymd_and_hms(2025, 8, 2, 0, 0, 0).unwrap(),
        });

        let findings = reconcile(&ledger);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].lot_id, lot_id);
        assert_eq!(findings[0].drift, dec("10"));
        assert_eq!(findings[0].allocated_qty, dec("10"));
    }
}
