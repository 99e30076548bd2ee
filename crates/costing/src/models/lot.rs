//! Inventory lot and allocation records.
//!
//! A lot is a batch of identical-cost inventory created by one receipt
//! event; allocations consume lots FIFO and carry the cost that was
//! current on the lot at allocation time.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saltbox_core::{
    AllocationId, CurrencyCode, LotId, ProductId, ReceiptItemId, SaleId, SaleItemId,
};

/// A cost-bearing inventory lot.
///
/// Created once when a receipt item is received; after that only
/// `remaining_qty` and `written_off_qty` change, and only through the
/// allocation engine. A lot is never deleted while an allocation
/// references it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lot {
    /// Unique lot ID.
    pub id: LotId,
    /// Product this lot holds.
    pub product_id: ProductId,
    /// Receipt item this lot was created from.
    pub source_receipt_item_id: ReceiptItemId,
    /// Quantity received into the lot. Immutable after creation.
    pub initial_qty: Decimal,
    /// Quantity still available for allocation.
    pub remaining_qty: Decimal,
    /// Quantity consumed without an allocation record (write-offs/losses).
    pub written_off_qty: Decimal,
    /// Landed cost per unit, fixed at receiving time.
    pub cost_per_unit: Decimal,
    /// Currency of `cost_per_unit`.
    pub currency_code: CurrencyCode,
    /// When the lot entered inventory. Primary FIFO sort key.
    pub received_at: DateTime<Utc>,
}

impl Lot {
    /// Quantity consumed so far through allocations.
    ///
    /// Equals `initial - remaining - written_off`; under the
    /// conservation invariant this matches the sum of active allocation
    /// quantities for this lot.
    #[must_use]
    pub fn allocated_qty(&self) -> Decimal {
        self.initial_qty - self.remaining_qty - self.written_off_qty
    }

    /// Whether any inventory from this lot has been consumed.
    #[must_use]
    pub fn is_untouched(&self) -> bool {
        self.remaining_qty == self.initial_qty && self.written_off_qty.is_zero()
    }
}

/// Reference to the sale line that consumed inventory.
///
/// Allocation and reversal both key on this pair; reversing a sale line
/// removes exactly the allocations carrying its reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConsumerRef {
    /// Sale the consuming line belongs to.
    pub sale_id: SaleId,
    /// The consuming line itself.
    pub sale_item_id: SaleItemId,
}

impl ConsumerRef {
    /// Create a consumer reference for a sale line.
    #[must_use]
    pub const fn new(sale_id: SaleId, sale_item_id: SaleItemId) -> Self {
        Self {
            sale_id,
            sale_item_id,
        }
    }
}

impl core::fmt::Display for ConsumerRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "sale {}/{}", self.sale_id, self.sale_item_id)
    }
}

/// One consumption of one lot by one sale line.
///
/// Deleted (not mutated) on reversal; deleting an allocation restores
/// its quantity to the lot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allocation {
    /// Unique allocation ID.
    pub id: AllocationId,
    /// Lot the quantity was drawn from.
    pub lot_id: LotId,
    /// Sale line that consumed the quantity.
    pub consumer: ConsumerRef,
    /// Quantity drawn.
    pub quantity: Decimal,
    /// Unit cost copied from the lot at allocation time.
    pub cost_per_unit: Decimal,
    /// `quantity × cost_per_unit`, quantized to money precision.
    pub total_cost: Decimal,
    /// When the allocation was made.
    pub allocated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn sample_lot() -> Lot {
        Lot {
            id: LotId::new(1),
            product_id: ProductId::new(10),
            source_receipt_item_id: ReceiptItemId::new(100),
            initial_qty: dec("50"),
            remaining_qty: dec("30"),
            written_off_qty: dec("5"),
            cost_per_unit: dec("4.20"),
            currency_code: CurrencyCode::USD,
            received_at: Utc.with_ymd_and_hms(2025, 3, 1, 8, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_allocated_qty_excludes_write_offs() {
        let lot = sample_lot();
        assert_eq!(lot.allocated_qty(), dec("15"));
    }

    #[test]
    fn test_untouched_lot() {
        let mut lot = sample_lot();
        assert!(!lot.is_untouched());
        lot.remaining_qty = lot.initial_qty;
        lot.written_off_qty = Decimal::ZERO;
        assert!(lot.is_untouched());
    }

    #[test]
    fn test_consumer_ref_display() {
        let consumer = ConsumerRef::new(SaleId::new(7), SaleItemId::new(2));
        assert_eq!(consumer.to_string(), "sale 7/2");
    }
}
