//! Costing scenario replay.
//!
//! A scenario file describes receipts (with shared costs), sales, fee
//! facts, returns, and write-offs. The command drives the full receive →
//! allocate → reverse cycle through the engine, then prints the
//! unit-economics report and the inventory valuation as JSON.

use std::path::Path;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use saltbox_core::{ProductId, SaleId, SaleItemId, SaleStatus};
use saltbox_costing::{
    ConsumerRef, CostingEngine, CostingError, FeeFact, ItemReceipt, NewReceipt,
    RecordingFinanceSink, ReportPeriod, SaleFact,
};

/// Errors raised by the simulate command.
#[derive(Debug, Error)]
pub enum SimulateError {
    /// Scenario file could not be read.
    #[error("cannot read scenario file: {0}")]
    Io(#[from] std::io::Error),

    /// Scenario file is not valid JSON for the expected shape.
    #[error("cannot parse scenario file: {0}")]
    Parse(#[from] serde_json::Error),

    /// An engine operation failed during the replay.
    #[error("costing operation failed: {0}")]
    Costing(#[from] CostingError),

    /// `--check` found integrity drift.
    #[error("integrity sweep found {0} drifted lot(s)")]
    Drift(usize),
}

/// One receipt in a scenario: drafted, then received with the given
/// per-line quantities (defaulting to the ordered quantities).
#[derive(Debug, Deserialize)]
struct ScenarioReceipt {
    /// Draft input, inlined.
    #[serde(flatten)]
    receipt: NewReceipt,
    /// When the goods arrived; the receipt stays a draft when absent.
    received_at: Option<DateTime<Utc>>,
    /// Received quantity per line, aligned with `items`; short or
    /// missing entries fall back to the line's ordered quantity.
    #[serde(default)]
    received_quantities: Vec<Decimal>,
}

/// A return event: reverses one sale line's allocations.
#[derive(Debug, Deserialize)]
struct ScenarioReturn {
    sale_id: SaleId,
    sale_item_id: SaleItemId,
}

/// A write-off event.
#[derive(Debug, Deserialize)]
struct ScenarioWriteOff {
    product_id: ProductId,
    quantity: Decimal,
    occurred_at: DateTime<Utc>,
}

/// Everything the replay needs, in event order per section.
#[derive(Debug, Deserialize)]
struct Scenario {
    #[serde(default)]
    receipts: Vec<ScenarioReceipt>,
    #[serde(default)]
    sales: Vec<SaleFact>,
    #[serde(default)]
    fees: Vec<FeeFact>,
    #[serde(default)]
    returns: Vec<ScenarioReturn>,
    #[serde(default)]
    write_offs: Vec<ScenarioWriteOff>,
    /// Reporting window for the unit-economics report.
    report_period: ReportPeriod,
}

/// Replay `input` through a fresh engine and print the reports.
///
/// # Errors
///
/// Returns [`SimulateError`] when the file cannot be read or parsed,
/// when an engine operation fails, or (with `check`) when the integrity
/// sweep finds drift.
pub fn simulate(input: &Path, check: bool) -> Result<(), SimulateError> {
    let raw = std::fs::read_to_string(input)?;
    let scenario: Scenario = serde_json::from_str(&raw)?;

    let engine = CostingEngine::<RecordingFinanceSink>::default();
    replay(&engine, &scenario)?;

    let economics = engine.unit_economics(
        &scenario.sales,
        &scenario.fees,
        scenario.report_period,
        None,
    );
    let valuation = engine.inventory_valuation();

    print_json(&serde_json::json!({
        "unit_economics": economics,
        "inventory_valuation": valuation,
        "expense_facts": engine.recorded_expenses(),
    }))?;

    if check {
        let findings = engine.reconcile();
        if !findings.is_empty() {
            print_json(&findings)?;
            return Err(SimulateError::Drift(findings.len()));
        }
        info!("integrity sweep clean");
    }
    Ok(())
}

fn replay(
    engine: &CostingEngine<RecordingFinanceSink>,
    scenario: &Scenario,
) -> Result<(), SimulateError> {
    for entry in &scenario.receipts {
        let receipt_id = engine.draft_receipt(entry.receipt.clone());
        let Some(received_at) = entry.received_at else {
            continue;
        };
        let receipt = engine.receipt(receipt_id)?;
        let item_receipts: Vec<ItemReceipt> = receipt
            .items
            .iter()
            .enumerate()
            .map(|(index, item)| ItemReceipt {
                item_id: item.id,
                received_qty: entry
                    .received_quantities
                    .get(index)
                    .copied()
                    .unwrap_or(item.ordered_qty),
            })
            .collect();
        let summary = engine.receive(receipt_id, &item_receipts, received_at)?;
        info!(
            receipt = %summary.receipt_id,
            lots = summary.lot_ids.len(),
            total = %summary.purchase_total,
            "receipt received"
        );
    }

    for sale in &scenario.sales {
        if sale.status == SaleStatus::Cancelled {
            continue;
        }
        let consumer = ConsumerRef::new(sale.sale_id, sale.sale_item_id);
        let result =
            engine.allocate_partial(sale.product_id, sale.quantity, consumer, sale.sold_at)?;
        if !result.unallocated_qty.is_zero() {
            warn!(
                %consumer,
                shortfall = %result.unallocated_qty,
                "sale allocated with shortfall"
            );
        }
    }

    for ret in &scenario.returns {
        let consumer = ConsumerRef::new(ret.sale_id, ret.sale_item_id);
        let summary = engine.reverse(consumer)?;
        info!(%consumer, restored = %summary.quantity_restored, "return reversed");
    }

    for write_off in &scenario.write_offs {
        let summary = engine.consume_for_write_off(
            write_off.product_id,
            write_off.quantity,
            write_off.occurred_at,
        )?;
        info!(
            product = %write_off.product_id,
            cost = %summary.total_cost,
            "inventory written off"
        );
    }
    Ok(())
}

/// Report output goes to stdout by design; everything diagnostic goes
/// through tracing.
#[allow(clippy::print_stdout)]
fn print_json<T: serde::Serialize>(value: &T) -> Result<(), SimulateError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_parses_minimal_file() {
        let raw = r#"{
            "receipts": [{
                "reference": "PO-1",
                "currency_code": "USD",
                "items": [{
                    "product_id": 1,
                    "ordered_qty": "10",
                    "price_per_unit": "4.00"
                }],
                "shared_costs": [{
                    "name": "freight",
                    "total_amount": "20.00",
                    "method": "by_price"
                }],
                "created_at": "2025-06-01T08:00:00Z",
                "received_at": "2025-06-02T08:00:00Z"
            }],
            "sales": [{
                "sale_id": 1,
                "sale_item_id": 1,
                "product_id": 1,
                "quantity": "2",
                "revenue": "30.00",
                "status": "completed",
                "sold_at": "2025-06-03T10:00:00Z"
            }],
            "report_period": {
                "from": "2025-06-01T00:00:00Z",
                "to": "2025-06-30T23:59:59Z"
            }
        }"#;

        let scenario: Scenario = serde_json::from_str(raw).unwrap();
        assert_eq!(scenario.receipts.len(), 1);
        assert_eq!(scenario.sales.len(), 1);
        assert!(scenario.returns.is_empty());

        let engine = CostingEngine::<RecordingFinanceSink>::default();
        replay(&engine, &scenario).unwrap();
        assert_eq!(engine.available_quantity(ProductId::new(1)), Decimal::from(8));
        assert!(engine.reconcile().is_empty());
    }
}
