//! Ledger storage: repository interfaces per entity.
//!
//! Records reference each other by ID across flat tables; there are no
//! owned object graphs. Engine operations receive repositories by `&mut`
//! borrow, which is what serializes read-modify-write sequences on lot
//! quantities — a caller cannot interleave two walks over the same store.
//!
//! The crate ships one implementation, the in-memory [`InMemoryLedger`];
//! a host that needs durable storage implements the same traits over its
//! database and keeps the engine code unchanged.

pub mod memory;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use saltbox_core::{
    AllocationId, CurrencyCode, LotId, ProductId, ReceiptId, ReceiptItemId, SaleId,
};

use crate::error::StoreError;
use crate::models::{Allocation, ConsumerRef, Lot, NewReceipt, Receipt};

pub use memory::InMemoryLedger;

/// Seed for a lot row; the repository assigns the ID.
#[derive(Debug, Clone)]
pub struct NewLot {
    /// Product the lot holds.
    pub product_id: ProductId,
    /// Receipt item the lot was created from.
    pub source_receipt_item_id: ReceiptItemId,
    /// Received quantity; becomes both `initial_qty` and `remaining_qty`.
    pub quantity: Decimal,
    /// Landed cost per unit.
    pub cost_per_unit: Decimal,
    /// Currency of `cost_per_unit`.
    pub currency_code: CurrencyCode,
    /// When the lot entered inventory.
    pub received_at: DateTime<Utc>,
}

/// Seed for an allocation row; the repository assigns the ID.
#[derive(Debug, Clone)]
pub struct NewAllocation {
    /// Lot the quantity is drawn from.
    pub lot_id: LotId,
    /// Sale line consuming the quantity.
    pub consumer: ConsumerRef,
    /// Quantity drawn.
    pub quantity: Decimal,
    /// Unit cost copied from the lot.
    pub cost_per_unit: Decimal,
    /// `quantity × cost_per_unit`, money precision.
    pub total_cost: Decimal,
    /// When the allocation was made.
    pub allocated_at: DateTime<Utc>,
}

/// Storage for purchase receipts.
pub trait ReceiptRepository {
    /// Persist a drafted receipt, assigning receipt and item IDs.
    fn insert_receipt(&mut self, new: NewReceipt) -> ReceiptId;

    /// Fetch a receipt by ID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the receipt doesn't exist.
    fn receipt(&self, id: ReceiptId) -> Result<&Receipt, StoreError>;

    /// Replace a receipt row.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the receipt doesn't exist.
    fn update_receipt(&mut self, receipt: Receipt) -> Result<(), StoreError>;

    /// All receipts, ordered by ID.
    fn all_receipts(&self) -> Vec<Receipt>;
}

/// Storage for inventory lots.
pub trait LotRepository {
    /// Persist a new lot, assigning its ID.
    fn insert_lot(&mut self, new: NewLot) -> LotId;

    /// Fetch a lot by ID.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the lot doesn't exist.
    fn lot(&self, id: LotId) -> Result<&Lot, StoreError>;

    /// Lots for a product in FIFO order: `received_at` ascending, ties
    /// broken by lot ID ascending. Includes exhausted lots.
    fn fifo_lots(&self, product_id: ProductId) -> Vec<Lot>;

    /// Lots created from any of the given receipt items.
    fn lots_for_receipt_items(&self, item_ids: &[ReceiptItemId]) -> Vec<Lot>;

    /// Decrement a lot's remaining quantity.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the lot doesn't exist, or
    /// [`StoreError::Conflict`] if the decrement would leave a negative
    /// remaining quantity.
    fn consume_remaining(&mut self, id: LotId, qty: Decimal) -> Result<(), StoreError>;

    /// Increment a lot's remaining quantity (allocation reversal).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the lot doesn't exist, or
    /// [`StoreError::Conflict`] if the increment would push the lot past
    /// what was ever consumable from it.
    fn restore_remaining(&mut self, id: LotId, qty: Decimal) -> Result<(), StoreError>;

    /// Add to a lot's write-off counter. The caller decrements
    /// `remaining_qty` separately via [`Self::consume_remaining`].
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the lot doesn't exist.
    fn add_write_off(&mut self, id: LotId, qty: Decimal) -> Result<(), StoreError>;

    /// Delete a lot row (unreceive only).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the lot doesn't exist.
    fn remove_lot(&mut self, id: LotId) -> Result<(), StoreError>;

    /// All lots, ordered by ID.
    fn all_lots(&self) -> Vec<Lot>;
}

/// Storage for allocation records.
pub trait AllocationRepository {
    /// Persist a new allocation, assigning its ID.
    fn insert_allocation(&mut self, new: NewAllocation) -> AllocationId;

    /// Allocations carrying the given consumer reference, ordered by ID.
    fn allocations_for_consumer(&self, consumer: ConsumerRef) -> Vec<Allocation>;

    /// Allocations for any line of the given sale, ordered by ID.
    fn allocations_for_sale(&self, sale_id: SaleId) -> Vec<Allocation>;

    /// Allocations drawing from the given lot, ordered by ID.
    fn allocations_for_lot(&self, lot_id: LotId) -> Vec<Allocation>;

    /// Whether any allocation references any of the given lots.
    fn any_for_lots(&self, lot_ids: &[LotId]) -> bool;

    /// Delete an allocation row (reversal only).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the allocation doesn't exist.
    fn remove_allocation(&mut self, id: AllocationId) -> Result<(), StoreError>;

    /// All allocations, ordered by ID.
    fn all_allocations(&self) -> Vec<Allocation>;
}
