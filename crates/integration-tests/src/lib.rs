//! Integration tests for the Saltbox back-office.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p saltbox-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `costing_flow` - Full receive → allocate → return → report cycle
//! - `receiving_compensation` - Unreceive semantics and blocking rules
//! - `unit_economics` - Period reports over realistic sales data
//!
//! Everything runs against the in-memory ledger; no external services
//! are needed.

#![cfg_attr(not(test), forbid(unsafe_code))]

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;

use saltbox_core::{CurrencyCode, ProductId, ReceiptId, SaleId, SaleItemId};
use saltbox_costing::{
    ApportionMethod, ConsumerRef, CostingEngine, ExtraCosts, ItemReceipt, NewReceipt,
    NewReceiptItem, RecordingFinanceSink, SharedCost,
};

/// Parse a decimal literal; test-fixture convenience.
///
/// # Panics
///
/// Panics on malformed input, which in a fixture is a test bug.
#[must_use]
pub fn dec(s: &str) -> Decimal {
    s.parse().expect("fixture decimal literal")
}

/// A timestamp on the given day of June 2025.
#[must_use]
pub fn on_day(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, day, 9, 0, 0)
        .single()
        .expect("fixture date")
}

/// Consumer reference for a sale line.
#[must_use]
pub const fn consumer(sale: i32, item: i32) -> ConsumerRef {
    ConsumerRef::new(SaleId::new(sale), SaleItemId::new(item))
}

/// Draft and receive a single-item receipt, returning the receipt ID.
///
/// # Panics
///
/// Panics when the engine rejects the fixture, which is a test bug.
pub fn receive_simple_lot(
    engine: &CostingEngine<RecordingFinanceSink>,
    product: i32,
    qty: &str,
    price: &str,
    day: u32,
) -> ReceiptId {
    let receipt_id = engine.draft_receipt(NewReceipt {
        reference: format!("PO-{product}-{day}"),
        supplier_ref: None,
        currency_code: CurrencyCode::USD,
        items: vec![NewReceiptItem {
            product_id: ProductId::new(product),
            ordered_qty: dec(qty),
            price_per_unit: dec(price),
            extra_costs: ExtraCosts::default(),
            volume: Decimal::ZERO,
            weight: Decimal::ZERO,
        }],
        shared_costs: Vec::new(),
        created_at: on_day(day),
    });
    let receipt = engine.receipt(receipt_id).expect("drafted receipt");
    let item_receipts: Vec<ItemReceipt> = receipt
        .items
        .iter()
        .map(|item| ItemReceipt {
            item_id: item.id,
            received_qty: item.ordered_qty,
        })
        .collect();
    engine
        .receive(receipt_id, &item_receipts, on_day(day))
        .expect("receive fixture receipt");
    receipt_id
}

/// Draft a two-item receipt with a shared freight cost, unreceived.
#[must_use]
pub fn draft_freight_receipt(engine: &CostingEngine<RecordingFinanceSink>) -> ReceiptId {
    engine.draft_receipt(NewReceipt {
        reference: "PO-FREIGHT".to_string(),
        supplier_ref: Some("acme-imports".to_string()),
        currency_code: CurrencyCode::USD,
        items: vec![
            NewReceiptItem {
                product_id: ProductId::new(1),
                ordered_qty: dec("5"),
                price_per_unit: dec("10"),
                extra_costs: ExtraCosts::default(),
                volume: dec("0.2"),
                weight: dec("1.5"),
            },
            NewReceiptItem {
                product_id: ProductId::new(2),
                ordered_qty: dec("5"),
                price_per_unit: dec("30"),
                extra_costs: ExtraCosts::default(),
                volume: dec("0.4"),
                weight: dec("2.0"),
            },
        ],
        shared_costs: vec![SharedCost {
            name: "sea freight".to_string(),
            total_amount: dec("80"),
            method: ApportionMethod::ByPrice,
        }],
        created_at: on_day(1),
    })
}
