//! In-memory ledger: flat tables keyed by ID.
//!
//! `BTreeMap` keeps iteration in ID order, which makes every listing
//! deterministic and gives the FIFO sort its stable tie-break for free.

use std::collections::BTreeMap;

use rust_decimal::Decimal;

use saltbox_core::{
    AllocationId, LotId, ProductId, ReceiptId, ReceiptItemId, ReceiptItemStatus, ReceiptStatus,
    SaleId,
};

use crate::error::StoreError;
use crate::models::{Allocation, ConsumerRef, Lot, NewReceipt, Receipt, ReceiptItem};

use super::{AllocationRepository, LotRepository, NewAllocation, NewLot, ReceiptRepository};

/// All costing tables in one place.
#[derive(Debug, Default)]
pub struct InMemoryLedger {
    receipts: BTreeMap<ReceiptId, Receipt>,
    lots: BTreeMap<LotId, Lot>,
    allocations: BTreeMap<AllocationId, Allocation>,
    next_receipt_id: i32,
    next_receipt_item_id: i32,
    next_lot_id: i32,
    next_allocation_id: i32,
}

impl InMemoryLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn next_receipt_id(&mut self) -> ReceiptId {
        self.next_receipt_id += 1;
        ReceiptId::new(self.next_receipt_id)
    }

    fn next_receipt_item_id(&mut self) -> ReceiptItemId {
        self.next_receipt_item_id += 1;
        ReceiptItemId::new(self.next_receipt_item_id)
    }

    fn next_lot_id(&mut self) -> LotId {
        self.next_lot_id += 1;
        LotId::new(self.next_lot_id)
    }

    fn next_allocation_id(&mut self) -> AllocationId {
        self.next_allocation_id += 1;
        AllocationId::new(self.next_allocation_id)
    }
}

impl ReceiptRepository for InMemoryLedger {
    fn insert_receipt(&mut self, new: NewReceipt) -> ReceiptId {
        let id = self.next_receipt_id();
        let items = new
            .items
            .into_iter()
            .map(|item| ReceiptItem {
                id: self.next_receipt_item_id(),
                product_id: item.product_id,
                ordered_qty: item.ordered_qty,
                received_qty: Decimal::ZERO,
                price_per_unit: item.price_per_unit,
                extra_costs: item.extra_costs,
                volume: item.volume,
                weight: item.weight,
                apportioned_shared_cost: Decimal::ZERO,
                unit_cost: Decimal::ZERO,
                total_cost: Decimal::ZERO,
                status: ReceiptItemStatus::Pending,
            })
            .collect();

        self.receipts.insert(
            id,
            Receipt {
                id,
                reference: new.reference,
                supplier_ref: new.supplier_ref,
                currency_code: new.currency_code,
                status: ReceiptStatus::Draft,
                items,
                shared_costs: new.shared_costs,
                created_at: new.created_at,
                received_at: None,
            },
        );
        id
    }

    fn receipt(&self, id: ReceiptId) -> Result<&Receipt, StoreError> {
        self.receipts
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("receipt {id}")))
    }

    fn update_receipt(&mut self, receipt: Receipt) -> Result<(), StoreError> {
        match self.receipts.get_mut(&receipt.id) {
            Some(row) => {
                *row = receipt;
                Ok(())
            }
            None => Err(StoreError::NotFound(format!("receipt {}", receipt.id))),
        }
    }

    fn all_receipts(&self) -> Vec<Receipt> {
        self.receipts.values().cloned().collect()
    }
}

impl LotRepository for InMemoryLedger {
    fn insert_lot(&mut self, new: NewLot) -> LotId {
        let id = self.next_lot_id();
        self.lots.insert(
            id,
            Lot {
                id,
                product_id: new.product_id,
                source_receipt_item_id: new.source_receipt_item_id,
                initial_qty: new.quantity,
                remaining_qty: new.quantity,
                written_off_qty: Decimal::ZERO,
                cost_per_unit: new.cost_per_unit,
                currency_code: new.currency_code,
                received_at: new.received_at,
            },
        );
        id
    }

    fn lot(&self, id: LotId) -> Result<&Lot, StoreError> {
        self.lots
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("lot {id}")))
    }

    fn fifo_lots(&self, product_id: ProductId) -> Vec<Lot> {
        let mut lots: Vec<Lot> = self
            .lots
            .values()
            .filter(|lot| lot.product_id == product_id)
            .cloned()
            .collect();
        lots.sort_by_key(|lot| (lot.received_at, lot.id));
        lots
    }

    fn lots_for_receipt_items(&self, item_ids: &[ReceiptItemId]) -> Vec<Lot> {
        self.lots
            .values()
            .filter(|lot| item_ids.contains(&lot.source_receipt_item_id))
            .cloned()
            .collect()
    }

    fn consume_remaining(&mut self, id: LotId, qty: Decimal) -> Result<(), StoreError> {
        let lot = self
            .lots
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("lot {id}")))?;
        if qty > lot.remaining_qty {
            return Err(StoreError::Conflict(format!(
                "lot {id}: cannot consume {qty}, only {} remaining",
                lot.remaining_qty
            )));
        }
        lot.remaining_qty -= qty;
        Ok(())
    }

    fn restore_remaining(&mut self, id: LotId, qty: Decimal) -> Result<(), StoreError> {
        let lot = self
            .lots
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("lot {id}")))?;
        let ceiling = lot.initial_qty - lot.written_off_qty;
        if lot.remaining_qty + qty > ceiling {
            return Err(StoreError::Conflict(format!(
                "lot {id}: restoring {qty} would exceed receivable quantity {ceiling}"
            )));
        }
        lot.remaining_qty += qty;
        Ok(())
    }

    fn add_write_off(&mut self, id: LotId, qty: Decimal) -> Result<(), StoreError> {
        let lot = self
            .lots
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("lot {id}")))?;
        lot.written_off_qty += qty;
        Ok(())
    }

    fn remove_lot(&mut self, id: LotId) -> Result<(), StoreError> {
        self.lots
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("lot {id}")))
    }

    fn all_lots(&self) -> Vec<Lot> {
        self.lots.values().cloned().collect()
    }
}

impl AllocationRepository for InMemoryLedger {
    fn insert_allocation(&mut self, new: NewAllocation) -> AllocationId {
        let id = self.next_allocation_id();
        self.allocations.insert(
            id,
            Allocation {
                id,
                lot_id: new.lot_id,
                consumer: new.consumer,
                quantity: new.quantity,
                cost_per_unit: new.cost_per_unit,
                total_cost: new.total_cost,
                allocated_at: new.allocated_at,
            },
        );
        id
    }

    fn allocations_for_consumer(&self, consumer: ConsumerRef) -> Vec<Allocation> {
        self.allocations
            .values()
            .filter(|alloc| alloc.consumer == consumer)
            .cloned()
            .collect()
    }

    fn allocations_for_sale(&self, sale_id: SaleId) -> Vec<Allocation> {
        self.allocations
            .values()
            .filter(|alloc| alloc.consumer.sale_id == sale_id)
            .cloned()
            .collect()
    }

    fn allocations_for_lot(&self, lot_id: LotId) -> Vec<Allocation> {
        self.allocations
            .values()
            .filter(|alloc| alloc.lot_id == lot_id)
            .cloned()
            .collect()
    }

    fn any_for_lots(&self, lot_ids: &[LotId]) -> bool {
        self.allocations
            .values()
            .any(|alloc| lot_ids.contains(&alloc.lot_id))
    }

    fn remove_allocation(&mut self, id: AllocationId) -> Result<(), StoreError> {
        self.allocations
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("allocation {id}")))
    }

    fn all_allocations(&self) -> Vec<Allocation> {
        self.allocations.values().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use saltbox_core::{CurrencyCode, SaleItemId};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn seed_lot(ledger: &mut InMemoryLedger, product: i32, qty: &str, day: u32) -> LotId {
        ledger.insert_lot(NewLot {
            product_id: ProductId::new(product),
            source_receipt_item_id: ReceiptItemId::new(1),
            quantity: dec(qty),
            cost_per_unit: dec("10.00"),
            currency_code: CurrencyCode::USD,
            received_at: Utc.with_ymd_and_hms(2025, 1, day, 0, 0, 0).unwrap(),
        })
    }

    #[test]
    fn test_fifo_lots_order_by_received_at_then_id() {
        let mut ledger = InMemoryLedger::new();
        let late = seed_lot(&mut ledger, 1, "5", 20);
        let early = seed_lot(&mut ledger, 1, "5", 10);
        let early_twin = seed_lot(&mut ledger, 1, "5", 10);
        seed_lot(&mut ledger, 2, "5", 1);

        let ids: Vec<LotId> = ledger.fifo_lots(ProductId::new(1)).iter().map(|l| l.id).collect();
        assert_eq!(ids, vec![early, early_twin, late]);
    }

    #[test]
    fn test_consume_remaining_rejects_overdraw() {
        let mut ledger = InMemoryLedger::new();
        let id = seed_lot(&mut ledger, 1, "5", 1);
        assert!(ledger.consume_remaining(id, dec("6")).is_err());
        ledger.consume_remaining(id, dec("5")).unwrap();
        assert_eq!(ledger.lot(id).unwrap().remaining_qty, Decimal::ZERO);
    }

    #[test]
    fn test_restore_remaining_caps_at_initial() {
        let mut ledger = InMemoryLedger::new();
        let id = seed_lot(&mut ledger, 1, "5", 1);
        ledger.consume_remaining(id, dec("3")).unwrap();
        ledger.restore_remaining(id, dec("3")).unwrap();
        assert!(ledger.restore_remaining(id, dec("0.001")).is_err());
    }

    #[test]
    fn test_allocation_lookup_by_consumer_and_lot() {
        let mut ledger = InMemoryLedger::new();
        let lot = seed_lot(&mut ledger, 1, "5", 1);
        let consumer = ConsumerRef::new(SaleId::new(1), SaleItemId::new(1));
        let at = Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap();
        ledger.insert_allocation(NewAllocation {
            lot_id: lot,
            consumer,
            quantity: dec("2"),
            cost_per_unit: dec("10.00"),
            total_cost: dec("20.00"),
            allocated_at: at,
        });

        assert_eq!(ledger.allocations_for_consumer(consumer).len(), 1);
        assert_eq!(ledger.allocations_for_lot(lot).len(), 1);
        assert!(ledger.any_for_lots(&[lot]));
        assert_eq!(
            ledger.allocations_for_sale(SaleId::new(1)).len(),
            1
        );
        assert!(ledger.allocations_for_sale(SaleId::new(2)).is_empty());
    }

    #[test]
    fn test_insert_receipt_assigns_item_ids_and_zeroes_costs() {
        let mut ledger = InMemoryLedger::new();
        let id = ledger.insert_receipt(NewReceipt {
            reference: "PO-1".to_string(),
            supplier_ref: None,
            currency_code: CurrencyCode::USD,
            items: vec![crate::models::NewReceiptItem {
                product_id: ProductId::new(1),
                ordered_qty: dec("10"),
                price_per_unit: dec("2.00"),
                extra_costs: crate::models::ExtraCosts::default(),
                volume: Decimal::ZERO,
                weight: Decimal::ZERO,
            }],
            shared_costs: Vec::new(),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        });

        let receipt = ReceiptRepository::receipt(&ledger, id).unwrap();
        assert_eq!(receipt.items.len(), 1);
        let item = &receipt.items[0];
        assert_eq!(item.id, ReceiptItemId::new(1));
        assert_eq!(item.received_qty, Decimal::ZERO);
        assert_eq!(item.status, ReceiptItemStatus::Pending);
    }
}
