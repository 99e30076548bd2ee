//! FIFO lot allocation: the COGS side of the engine.
//!
//! Sales consume lots oldest-first; each consumption is an allocation
//! record carrying the lot's unit cost at that moment. Returns reverse
//! the records and put the quantity back. Write-offs consume without a
//! record, since there is no consumer to reverse against.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use saltbox_core::{ProductId, round_money, round_quantity};

use crate::error::CostingError;
use crate::finance::{ExpenseFact, ExpenseKind, FinanceSink};
use crate::models::{Allocation, ConsumerRef};
use crate::store::{AllocationRepository, LotRepository, NewAllocation};

/// Result of a partial allocation: whatever could be drawn stays in
/// place, and the caller decides whether the shortfall is acceptable.
#[derive(Debug, Clone)]
pub struct PartialAllocation {
    /// Allocations created, FIFO order.
    pub allocations: Vec<Allocation>,
    /// Requested quantity that could not be satisfied.
    pub unallocated_qty: Decimal,
}

/// Result of reversing a consumer's allocations.
#[derive(Debug, Clone)]
pub struct ReversalSummary {
    /// Allocation records removed.
    pub allocations_removed: usize,
    /// Quantity returned to lots.
    pub quantity_restored: Decimal,
    /// Cost released (sum of removed allocations' totals).
    pub cost_restored: Decimal,
}

/// Result of a write-off consumption.
#[derive(Debug, Clone)]
pub struct WriteOffSummary {
    /// Quantity written off.
    pub quantity: Decimal,
    /// Cost of the written-off inventory, FIFO-valued.
    pub total_cost: Decimal,
}

/// Strictly allocate `quantity` of a product to a sale line.
///
/// Walks the product's lots in FIFO order (`received_at` ascending, lot
/// ID tie-break), drawing from each until the request is satisfied.
/// Availability is established under the same exclusive borrow that
/// performs the draw, so a shortfall leaves no partial effects.
///
/// # Errors
///
/// - [`CostingError::Validation`] for a non-positive quantity.
/// - [`CostingError::InsufficientInventory`] when the product's lots
///   cannot cover the request; the ledger is untouched.
#[instrument(skip(store), fields(product_id = %product_id, %consumer))]
pub fn allocate<S>(
    store: &mut S,
    product_id: ProductId,
    quantity: Decimal,
    consumer: ConsumerRef,
    allocated_at: DateTime<Utc>,
) -> Result<Vec<Allocation>, CostingError>
where
    S: LotRepository + AllocationRepository,
{
    let quantity = positive_quantity(quantity)?;
    let available = available_quantity(store, product_id);
    if available < quantity {
        return Err(CostingError::InsufficientInventory {
            product_id,
            requested: quantity,
            available,
        });
    }

    let allocations = draw_fifo(store, product_id, quantity, consumer, allocated_at)?;
    info!(allocations = allocations.len(), %quantity, "allocated");
    Ok(allocations)
}

/// Allocate as much of `quantity` as the lots can cover.
///
/// Same FIFO walk as [`allocate`], but a shortfall is reported instead
/// of raised: whatever was drawn stays in place and `unallocated_qty`
/// carries the rest. Used for historical or incomplete data where the
/// caller tolerates gaps.
///
/// # Errors
///
/// Returns [`CostingError::Validation`] for a non-positive quantity.
#[instrument(skip(store), fields(product_id = %product_id, %consumer))]
pub fn allocate_partial<S>(
    store: &mut S,
    product_id: ProductId,
    quantity: Decimal,
    consumer: ConsumerRef,
    allocated_at: DateTime<Utc>,
) -> Result<PartialAllocation, CostingError>
where
    S: LotRepository + AllocationRepository,
{
    let quantity = positive_quantity(quantity)?;
    let available = available_quantity(store, product_id);
    let draw = quantity.min(available);

    let allocations = if draw.is_zero() {
        Vec::new()
    } else {
        draw_fifo(store, product_id, draw, consumer, allocated_at)?
    };
    let unallocated_qty = quantity - draw;
    if !unallocated_qty.is_zero() {
        info!(%unallocated_qty, "partial allocation shortfall");
    }

    Ok(PartialAllocation {
        allocations,
        unallocated_qty,
    })
}

/// Reverse every allocation carrying the given consumer reference.
///
/// Each allocation's quantity goes back to its lot and the record is
/// deleted. Idempotent: a second reversal finds no allocations and does
/// nothing.
///
/// # Errors
///
/// Returns [`CostingError::Store`] only on referential breakage (an
/// allocation pointing at a missing lot), which reconciliation would
/// flag as corruption.
#[instrument(skip(store), fields(%consumer))]
pub fn reverse<S>(store: &mut S, consumer: ConsumerRef) -> Result<ReversalSummary, CostingError>
where
    S: LotRepository + AllocationRepository,
{
    let allocations = store.allocations_for_consumer(consumer);
    let mut quantity_restored = Decimal::ZERO;
    let mut cost_restored = Decimal::ZERO;

    for allocation in &allocations {
        store.restore_remaining(allocation.lot_id, allocation.quantity)?;
        store.remove_allocation(allocation.id)?;
        quantity_restored += allocation.quantity;
        cost_restored += allocation.total_cost;
    }
    if !allocations.is_empty() {
        info!(
            allocations = allocations.len(),
            %quantity_restored,
            "allocations reversed"
        );
    }

    Ok(ReversalSummary {
        allocations_removed: allocations.len(),
        quantity_restored,
        cost_restored,
    })
}

/// Consume inventory with no consumer to reverse against (damage, loss,
/// shrinkage). Same FIFO walk as [`allocate`] but no allocation records
/// are written; the consumed quantity is tracked on each lot's write-off
/// counter and a loss expense fact is emitted.
///
/// # Errors
///
/// - [`CostingError::Validation`] for a non-positive quantity.
/// - [`CostingError::InsufficientInventory`] when lots cannot cover the
///   request; the ledger is untouched.
#[instrument(skip(store, finance), fields(product_id = %product_id))]
pub fn consume_for_write_off<S>(
    store: &mut S,
    finance: &mut dyn FinanceSink,
    product_id: ProductId,
    quantity: Decimal,
    occurred_at: DateTime<Utc>,
) -> Result<WriteOffSummary, CostingError>
where
    S: LotRepository + AllocationRepository,
{
    let quantity = positive_quantity(quantity)?;
    let available = available_quantity(store, product_id);
    if available < quantity {
        return Err(CostingError::InsufficientInventory {
            product_id,
            requested: quantity,
            available,
        });
    }

    let mut needed = quantity;
    let mut total_cost = Decimal::ZERO;
    let mut currency_code = None;
    for lot in store.fifo_lots(product_id) {
        if needed.is_zero() {
            break;
        }
        if lot.remaining_qty.is_zero() {
            continue;
        }
        let take = needed.min(lot.remaining_qty);
        store.consume_remaining(lot.id, take)?;
        store.add_write_off(lot.id, take)?;
        total_cost += round_money(take * lot.cost_per_unit);
        currency_code = Some(lot.currency_code);
        needed -= take;
    }

    finance.record(ExpenseFact {
        kind: ExpenseKind::WriteOff,
        receipt_id: None,
        product_id: Some(product_id),
        amount: total_cost,
        currency_code: currency_code.unwrap_or_default(),
        occurred_at,
    });
    info!(%quantity, %total_cost, "inventory written off");

    Ok(WriteOffSummary {
        quantity,
        total_cost,
    })
}

/// Total remaining quantity across the product's lots.
#[must_use]
pub fn available_quantity<S>(store: &S, product_id: ProductId) -> Decimal
where
    S: LotRepository,
{
    store
        .fifo_lots(product_id)
        .iter()
        .map(|lot| lot.remaining_qty)
        .sum()
}

/// Inventory-value-weighted mean unit cost across lots with remaining
/// quantity; zero when nothing remains.
///
/// Returned unrounded: this is a computed read-model value, not a
/// stored one.
#[must_use]
pub fn weighted_average_cost<S>(store: &S, product_id: ProductId) -> Decimal
where
    S: LotRepository,
{
    let mut value = Decimal::ZERO;
    let mut qty = Decimal::ZERO;
    for lot in store.fifo_lots(product_id) {
        if lot.remaining_qty.is_zero() {
            continue;
        }
        value += lot.remaining_qty * lot.cost_per_unit;
        qty += lot.remaining_qty;
    }
    if qty.is_zero() {
        Decimal::ZERO
    } else {
        value / qty
    }
}

fn positive_quantity(quantity: Decimal) -> Result<Decimal, CostingError> {
    let quantity = round_quantity(quantity);
    if quantity <= Decimal::ZERO {
        return Err(CostingError::validation(format!(
            "quantity must be positive, got {quantity}"
        )));
    }
    Ok(quantity)
}

fn draw_fifo<S>(
    store: &mut S,
    product_id: ProductId,
    quantity: Decimal,
    consumer: ConsumerRef,
    allocated_at: DateTime<Utc>,
) -> Result<Vec<Allocation>, CostingError>
where
    S: LotRepository + AllocationRepository,
{
    let mut needed = quantity;
    let mut created = Vec::new();
    for lot in store.fifo_lots(product_id) {
        if needed.is_zero() {
            break;
        }
        if lot.remaining_qty.is_zero() {
            continue;
        }
        let take = needed.min(lot.remaining_qty);
        store.consume_remaining(lot.id, take)?;
        let id = store.insert_allocation(NewAllocation {
            lot_id: lot.id,
            consumer,
            quantity: take,
            cost_per_unit: lot.cost_per_unit,
            total_cost: round_money(take * lot.cost_per_unit),
            allocated_at,
        });
        created.push(Allocation {
            id,
            lot_id: lot.id,
            consumer,
            quantity: take,
            cost_per_unit: lot.cost_per_unit,
            total_cost: round_money(take * lot.cost_per_unit),
            allocated_at,
        });
        needed -= take;
    }
    Ok(created)
}
