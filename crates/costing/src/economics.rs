//! Unit-economics and valuation reports.
//!
//! COGS comes from allocation records; revenue and fees are read-only
//! facts from the sales/finance collaborators. The join key is the
//! `(sale_id, sale_item_id)` pair both sides carry.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};

use saltbox_core::{ProductId, SaleStatus, round_money};

use crate::models::{
    ConsumerRef, FeeFact, FeeType, ProductEconomics, ProductValuation, ProfitAndLoss,
    ReportPeriod, SaleFact, UnitEconomicsReport, ValuationReport,
};
use crate::store::{AllocationRepository, LotRepository};

/// Decimal places for margin ratios.
const MARGIN_DP: u32 = 4;

#[derive(Debug, Default)]
struct ProductAccumulator {
    quantity: Decimal,
    revenue: Decimal,
    fees_by_type: BTreeMap<FeeType, Decimal>,
    cogs: Decimal,
}

/// Build the per-product unit-economics report for a period.
///
/// Sales outside the period, cancelled sales, and (when a filter is
/// given) products outside the filter are excluded. Fees join through
/// the sale line they were charged against.
#[must_use]
pub fn unit_economics<S>(
    store: &S,
    sales: &[SaleFact],
    fees: &[FeeFact],
    period: ReportPeriod,
    product_filter: Option<&[ProductId]>,
) -> UnitEconomicsReport
where
    S: AllocationRepository,
{
    let mut rows: BTreeMap<ProductId, ProductAccumulator> = BTreeMap::new();

    for sale in sales {
        if sale.status == SaleStatus::Cancelled || !period.contains(sale.sold_at) {
            continue;
        }
        if let Some(filter) = product_filter {
            if !filter.contains(&sale.product_id) {
                continue;
            }
        }

        let row = rows.entry(sale.product_id).or_default();
        row.quantity += sale.quantity;
        row.revenue += sale.revenue;

        let consumer = ConsumerRef::new(sale.sale_id, sale.sale_item_id);
        for allocation in store.allocations_for_consumer(consumer) {
            row.cogs += allocation.total_cost;
        }
        for fee in fees {
            if fee.sale_id == sale.sale_id && fee.sale_item_id == sale.sale_item_id {
                *row.fees_by_type.entry(fee.fee_type).or_default() += fee.amount;
            }
        }
    }

    let mut products = Vec::with_capacity(rows.len());
    let mut totals = ProductAccumulator::default();
    for (product_id, row) in rows {
        totals.quantity += row.quantity;
        totals.revenue += row.revenue;
        totals.cogs += row.cogs;
        for (&fee_type, &amount) in &row.fees_by_type {
            *totals.fees_by_type.entry(fee_type).or_default() += amount;
        }

        let total_fees: Decimal = row.fees_by_type.values().copied().sum();
        let profit = row.revenue - total_fees - row.cogs;
        products.push(ProductEconomics {
            product_id,
            quantity: row.quantity,
            revenue: row.revenue,
            margin: margin(profit, row.revenue),
            fees_by_type: row.fees_by_type,
            total_fees,
            cogs: row.cogs,
            profit,
        });
    }

    let total_fees: Decimal = totals.fees_by_type.values().copied().sum();
    let operating_profit = totals.revenue - total_fees - totals.cogs;
    let totals = ProfitAndLoss {
        revenue: totals.revenue,
        cogs: totals.cogs,
        margin: margin(operating_profit, totals.revenue),
        fees_by_type: totals.fees_by_type,
        total_fees,
        operating_profit,
    };

    UnitEconomicsReport {
        period,
        products,
        totals,
    }
}

/// On-hand inventory value per product, from lots with remaining
/// quantity.
#[must_use]
pub fn inventory_valuation<S>(store: &S) -> ValuationReport
where
    S: LotRepository,
{
    let mut by_product: BTreeMap<ProductId, (Decimal, Decimal)> = BTreeMap::new();
    for lot in store.all_lots() {
        if lot.remaining_qty.is_zero() {
            continue;
        }
        let entry = by_product.entry(lot.product_id).or_default();
        entry.0 += lot.remaining_qty;
        entry.1 += lot.remaining_qty * lot.cost_per_unit;
    }

    let mut total_value = Decimal::ZERO;
    let products = by_product
        .into_iter()
        .map(|(product_id, (on_hand_qty, value))| {
            let rounded = round_money(value);
            total_value += rounded;
            ProductValuation {
                product_id,
                on_hand_qty,
                weighted_average_cost: value / on_hand_qty,
                value: rounded,
            }
        })
        .collect();

    ValuationReport {
        products,
        total_value,
    }
}

fn margin(profit: Decimal, revenue: Decimal) -> Option<Decimal> {
    if revenue.is_zero() {
        None
    } else {
        Some(
            (profit / revenue)
                .round_dp_with_strategy(MARGIN_DP, RoundingStrategy::MidpointAwayFromZero),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use saltbox_core::{CurrencyCode, ReceiptItemId, SaleId, SaleItemId};

    use crate::allocation::allocate;
    use crate::store::{InMemoryLedger, NewLot};

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn at(day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, day, 10, 0, 0).unwrap()
    }

    fn period(from_day: u32, to_day: u32) -> ReportPeriod {
        ReportPeriod {
            from: Utc.with_ymd_and_hms(2025, 7, from_day, 0, 0, 0).unwrap(),
            to: Utc.with_ymd_and_hms(2025, 7, to_day, 23, 59, 59).unwrap(),
        }
    }

    fn sale(
        sale_id: i32,
        item_id: i32,
        product: i32,
        qty: &str,
        revenue: &str,
        day: u32,
        status: SaleStatus,
    ) -> SaleFact {
        SaleFact {
            sale_id: SaleId::new(sale_id),
            sale_item_id: SaleItemId::new(item_id),
            product_id: ProductId::new(product),
            quantity: dec(qty),
            revenue: dec(revenue),
            status,
            sold_at: at(day),
        }
    }

    fn fee(sale_id: i32, item_id: i32, fee_type: FeeType, amount: &str) -> FeeFact {
        FeeFact {
            sale_id: SaleId::new(sale_id),
            sale_item_id: SaleItemId::new(item_id),
            fee_type,
            amount: dec(amount),
        }
    }

    fn ledger_with_allocated_sale() -> InMemoryLedger {
        let mut ledger = InMemoryLedger::new();
        ledger.insert_lot(NewLot {
            product_id: ProductId::new(1),
            source_receipt_item_id: ReceiptItemId::new(1),
            quantity: dec("100"),
            cost_per_unit: dec("10.00"),
            currency_code: CurrencyCode::USD,
            received_at: at(1),
        });
        allocate(
            &mut ledger,
            ProductId::new(1),
            dec("20"),
            ConsumerRef::new(SaleId::new(1), SaleItemId::new(1)),
            at(5),
        )
        .unwrap();
        ledger
    }

    #[test]
    fn test_report_joins_revenue_fees_and_cogs() {
        let ledger = ledger_with_allocated_sale();
        let sales = [sale(1, 1, 1, "20", "600", 5, SaleStatus::Completed)];
        let fees = [
            fee(1, 1, FeeType::Commission, "90"),
            fee(1, 1, FeeType::Fulfillment, "60"),
        ];

        let report = unit_economics(&ledger, &sales, &fees, period(1, 31), None);

        assert_eq!(report.products.len(), 1);
        let row = &report.products[0];
        assert_eq!(row.quantity, dec("20"));
        assert_eq!(row.revenue, dec("600"));
        assert_eq!(row.total_fees, dec("150"));
        assert_eq!(row.cogs, dec("200.00"));
        assert_eq!(row.profit, dec("250.00"));
        assert_eq!(row.margin, Some(dec("0.4167")));
        assert_eq!(row.fees_by_type.get(&FeeType::Commission), Some(&dec("90")));

        assert_eq!(report.totals.revenue, dec("600"));
        assert_eq!(report.totals.operating_profit, dec("250.00"));
    }

    #[test]
    fn test_cancelled_and_out_of_period_sales_are_excluded() {
        let ledger = ledger_with_allocated_sale();
        let sales = [
            sale(1, 1, 1, "20", "600", 5, SaleStatus::Cancelled),
            sale(2, 2, 1, "5", "150", 25, SaleStatus::Completed),
        ];

        let report = unit_economics(&ledger, &sales, &[], period(1, 10), None);
        assert!(report.products.is_empty());
        assert_eq!(report.totals.revenue, Decimal::ZERO);
        assert_eq!(report.totals.margin, None);
    }

    #[test]
    fn test_product_filter_limits_rows() {
        let ledger = ledger_with_allocated_sale();
        let sales = [
            sale(1, 1, 1, "20", "600", 5, SaleStatus::Completed),
            sale(2, 2, 2, "3", "90", 6, SaleStatus::Completed),
        ];

        let only_two = [ProductId::new(2)];
        let report = unit_economics(&ledger, &sales, &[], period(1, 31), Some(&only_two));
        assert_eq!(report.products.len(), 1);
        assert_eq!(report.products[0].product_id, ProductId::new(2));
        // No allocations for that sale line: zero COGS, full margin.
        assert_eq!(report.products[0].cogs, Decimal::ZERO);
        assert_eq!(report.products[0].margin, Some(dec("1.0000")));
    }

    #[test]
    fn test_report_serializes_to_json() {
        let ledger = ledger_with_allocated_sale();
        let sales = [sale(1, 1, 1, "20", "600", 5, SaleStatus::Completed)];
        let report = unit_economics(&ledger, &sales, &[], period(1, 31), None);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["products"][0]["product_id"], 1);
        assert_eq!(json["totals"]["revenue"], "600");
    }

    #[test]
    fn test_valuation_groups_by_product() {
        let mut ledger = InMemoryLedger::new();
        for (product, qty, cost, day) in
            [(1, "100", "10.00", 1), (1, "50", "12.00", 2), (2, "8", "2.25", 3)]
        {
            ledger.insert_lot(NewLot {
                product_id: ProductId::new(product),
                source_receipt_item_id: ReceiptItemId::new(1),
                quantity: dec(qty),
                cost_per_unit: dec(cost),
                currency_code: CurrencyCode::USD,
                received_at: at(day),
            });
        }

        let report = inventory_valuation(&ledger);
        assert_eq!(report.products.len(), 2);
        assert_eq!(report.products[0].on_hand_qty, dec("150"));
        assert_eq!(report.products[0].value, dec("1600.00"));
        assert_eq!(report.products[1].value, dec("18.00"));
        assert_eq!(report.total_value, dec("1618.00"));
    }

    #[test]
    fn test_valuation_skips_exhausted_lots() {
        let mut ledger = InMemoryLedger::new();
        ledger.insert_lot(NewLot {
            product_id: ProductId::new(1),
            source_receipt_item_id: ReceiptItemId::new(1),
            quantity: dec("10"),
            cost_per_unit: dec("5.00"),
            currency_code: CurrencyCode::USD,
            received_at: at(1),
        });
        let lot_id = ledger.all_lots()[0].id;
        ledger.consume_remaining(lot_id, dec("10")).unwrap();

        let report = inventory_valuation(&ledger);
        assert!(report.products.is_empty());
        assert_eq!(report.total_value, Decimal::ZERO);
    }
}
