//! Receiving: turning a purchase receipt into cost-bearing lots.
//!
//! `receive` and `unreceive` are a forward/compensation pair. The
//! forward step fixes each item's landed unit cost and creates one lot
//! per received item; the compensation deletes those lots and returns
//! the receipt to draft, and is only legal while none of the lots'
//! inventory has been consumed.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use saltbox_core::{
    LotId, ReceiptId, ReceiptItemStatus, ReceiptStatus, round_money, round_quantity,
};

use crate::apportion::{ApportionLine, apportion_shared_costs};
use crate::error::CostingError;
use crate::finance::{ExpenseFact, ExpenseKind, FinanceSink};
use crate::models::ItemReceipt;
use crate::store::{AllocationRepository, LotRepository, NewLot, ReceiptRepository};

/// Result of a successful receive.
#[derive(Debug, Clone)]
pub struct ReceiveSummary {
    /// Receipt that was received.
    pub receipt_id: ReceiptId,
    /// Lots created, one per received item, in item order.
    pub lot_ids: Vec<LotId>,
    /// Landed total across received items; also the amount of the
    /// purchase expense fact.
    pub purchase_total: Decimal,
}

/// Receive a draft receipt.
///
/// For every line with a positive received quantity this computes the
/// landed line total (`purchase + item extras + apportioned shared
/// costs`), derives the per-unit cost, and creates a lot carrying it.
/// Untouched lines stay pending; under-received lines are marked
/// partial. The receipt moves to `Received` and a purchase expense fact
/// for the landed total is emitted.
///
/// # Errors
///
/// - [`CostingError::InvalidReceiptState`] if the receipt is not a draft.
/// - [`CostingError::Validation`] for an unknown item ID, a negative
///   received quantity, or when nothing at all is received.
/// - [`CostingError::Store`] if the receipt doesn't exist.
#[instrument(skip(store, finance, receipts), fields(receipt_id = %receipt_id))]
pub fn receive<S>(
    store: &mut S,
    finance: &mut dyn FinanceSink,
    receipt_id: ReceiptId,
    receipts: &[ItemReceipt],
    received_at: DateTime<Utc>,
) -> Result<ReceiveSummary, CostingError>
where
    S: ReceiptRepository + LotRepository,
{
    let mut receipt = store.receipt(receipt_id)?.clone();
    if receipt.status != ReceiptStatus::Draft {
        return Err(CostingError::InvalidReceiptState {
            receipt_id,
            expected: ReceiptStatus::Draft,
            actual: receipt.status,
        });
    }

    // Index incoming quantities by item, validating as we go.
    let mut received: Vec<(usize, Decimal)> = Vec::new();
    for item_receipt in receipts {
        let position = receipt
            .items
            .iter()
            .position(|item| item.id == item_receipt.item_id)
            .ok_or_else(|| {
                CostingError::validation(format!(
                    "receipt {receipt_id} has no item {}",
                    item_receipt.item_id
                ))
            })?;
        let qty = round_quantity(item_receipt.received_qty);
        if qty < Decimal::ZERO {
            return Err(CostingError::validation(format!(
                "received quantity for item {} is negative",
                item_receipt.item_id
            )));
        }
        if qty > Decimal::ZERO {
            received.push((position, qty));
        }
    }
    if received.is_empty() {
        return Err(CostingError::validation(format!(
            "receipt {receipt_id}: nothing to receive"
        )));
    }

    // Shared costs spread over what was actually received.
    let lines: Vec<ApportionLine> = received
        .iter()
        .map(|&(position, qty)| {
            let item = &receipt.items[position];
            ApportionLine {
                quantity: qty,
                price_per_unit: item.price_per_unit,
                volume: item.volume,
                weight: item.weight,
            }
        })
        .collect();
    let shares = apportion_shared_costs(&lines, &receipt.shared_costs)?;

    let mut lot_ids = Vec::with_capacity(received.len());
    let mut purchase_total = Decimal::ZERO;
    for (&(position, qty), share) in received.iter().zip(shares) {
        let item = &mut receipt.items[position];
        let purchase = item.price_per_unit * qty;
        let total_cost = round_money(purchase + item.extra_costs.total() + share);
        let unit_cost = round_money(total_cost / qty);

        item.received_qty = qty;
        item.apportioned_shared_cost = share;
        item.unit_cost = unit_cost;
        item.total_cost = total_cost;
        item.status = if qty >= item.ordered_qty {
            ReceiptItemStatus::Received
        } else {
            ReceiptItemStatus::Partial
        };
        purchase_total += total_cost;

        let lot_id = store.insert_lot(NewLot {
            product_id: item.product_id,
            source_receipt_item_id: item.id,
            quantity: qty,
            cost_per_unit: unit_cost,
            currency_code: receipt.currency_code,
            received_at,
        });
        lot_ids.push(lot_id);
    }

    receipt.status = ReceiptStatus::Received;
    receipt.received_at = Some(received_at);
    let currency_code = receipt.currency_code;
    store.update_receipt(receipt)?;

    finance.record(ExpenseFact {
        kind: ExpenseKind::Purchase,
        receipt_id: Some(receipt_id),
        product_id: None,
        amount: purchase_total,
        currency_code,
        occurred_at: received_at,
    });
    info!(lots = lot_ids.len(), %purchase_total, "receipt received");

    Ok(ReceiveSummary {
        receipt_id,
        lot_ids,
        purchase_total,
    })
}

/// Undo a receive: the compensating half of the pair.
///
/// Deletes every lot the receipt created, resets its items to pending
/// with zeroed quantities and costs, moves the receipt back to `Draft`,
/// and emits a purchase-reversal expense fact matching the original
/// purchase amount.
///
/// # Errors
///
/// - [`CostingError::InvalidReceiptState`] if the receipt is not in
///   `Received`.
/// - [`CostingError::LotsInUse`] if any lot from this receipt has active
///   allocations or write-off consumption; reversing below what was
///   already consumed would drive remaining quantities negative.
/// - [`CostingError::Store`] if the receipt doesn't exist.
#[instrument(skip(store, finance), fields(receipt_id = %receipt_id))]
pub fn unreceive<S>(
    store: &mut S,
    finance: &mut dyn FinanceSink,
    receipt_id: ReceiptId,
    occurred_at: DateTime<Utc>,
) -> Result<(), CostingError>
where
    S: ReceiptRepository + LotRepository + AllocationRepository,
{
    let mut receipt = store.receipt(receipt_id)?.clone();
    if receipt.status != ReceiptStatus::Received {
        return Err(CostingError::InvalidReceiptState {
            receipt_id,
            expected: ReceiptStatus::Received,
            actual: receipt.status,
        });
    }

    let item_ids: Vec<_> = receipt.items.iter().map(|item| item.id).collect();
    let lots = store.lots_for_receipt_items(&item_ids);
    let lot_ids: Vec<LotId> = lots.iter().map(|lot| lot.id).collect();

    if store.any_for_lots(&lot_ids) || lots.iter().any(|lot| !lot.is_untouched()) {
        return Err(CostingError::LotsInUse { receipt_id });
    }

    let reversal_amount: Decimal = receipt.items.iter().map(|item| item.total_cost).sum();

    for lot_id in &lot_ids {
        store.remove_lot(*lot_id)?;
    }
    for item in &mut receipt.items {
        item.received_qty = Decimal::ZERO;
        item.apportioned_shared_cost = Decimal::ZERO;
        item.unit_cost = Decimal::ZERO;
        item.total_cost = Decimal::ZERO;
        item.status = ReceiptItemStatus::Pending;
    }
    receipt.status = ReceiptStatus::Draft;
    receipt.received_at = None;
    let currency_code = receipt.currency_code;
    store.update_receipt(receipt)?;

    finance.record(ExpenseFact {
        kind: ExpenseKind::PurchaseReversal,
        receipt_id: Some(receipt_id),
        product_id: None,
        amount: reversal_amount,
        currency_code,
        occurred_at,
    });
    info!(lots = lot_ids.len(), %reversal_amount, "receipt unreceived");

    Ok(())
}

/// Abandon a draft receipt.
///
/// # Errors
///
/// - [`CostingError::InvalidReceiptState`] if the receipt is not a draft.
/// - [`CostingError::Store`] if the receipt doesn't exist.
#[instrument(skip(store), fields(receipt_id = %receipt_id))]
pub fn cancel<S>(store: &mut S, receipt_id: ReceiptId) -> Result<(), CostingError>
where
    S: ReceiptRepository,
{
    let mut receipt = store.receipt(receipt_id)?.clone();
    if receipt.status != ReceiptStatus::Draft {
        return Err(CostingError::InvalidReceiptState {
            receipt_id,
            expected: ReceiptStatus::Draft,
            actual: receipt.status,
        });
    }
    receipt.status = ReceiptStatus::Cancelled;
    store.update_receipt(receipt)?;
    info!("receipt cancelled");
    Ok(())
}
