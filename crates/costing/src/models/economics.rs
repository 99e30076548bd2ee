//! Unit-economics inputs and report shapes.
//!
//! Revenue and fee facts are supplied read-only by the sales/finance
//! collaborators; the engine contributes COGS from its allocation
//! records. Report types serialize to JSON for the reporting and pricing
//! consumers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saltbox_core::{ProductId, SaleId, SaleItemId, SaleStatus};

/// Marketplace/processor fee categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeType {
    Commission,
    Fulfillment,
    Storage,
    Advertising,
    Payment,
    Other,
}

/// One sold line, as reported by the sales collaborator.
///
/// Keyed by `(sale_id, sale_item_id)`, the same pair allocations carry,
/// so COGS joins to revenue without ambiguity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleFact {
    /// Sale the line belongs to.
    pub sale_id: SaleId,
    /// The line itself.
    pub sale_item_id: SaleItemId,
    /// Product sold.
    pub product_id: ProductId,
    /// Quantity sold.
    pub quantity: Decimal,
    /// Revenue for the line (net of discounts, gross of fees).
    pub revenue: Decimal,
    /// Sale state; cancelled sales are excluded from reports.
    pub status: SaleStatus,
    /// When the sale happened.
    pub sold_at: DateTime<Utc>,
}

/// One fee charged against a sold line, as reported by the finance
/// collaborator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeeFact {
    /// Sale the fee belongs to.
    pub sale_id: SaleId,
    /// Sale line the fee is attributed to.
    pub sale_item_id: SaleItemId,
    /// Fee category.
    pub fee_type: FeeType,
    /// Fee amount.
    pub amount: Decimal,
}

/// Inclusive reporting period.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ReportPeriod {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl ReportPeriod {
    /// Whether `at` falls inside the period (inclusive on both ends).
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.from <= at && at <= self.to
    }
}

/// Per-product unit economics over a period.
#[derive(Debug, Clone, Serialize)]
pub struct ProductEconomics {
    /// Product the row describes.
    pub product_id: ProductId,
    /// Units sold in the period.
    pub quantity: Decimal,
    /// Revenue in the period.
    pub revenue: Decimal,
    /// Fees broken down by category.
    pub fees_by_type: BTreeMap<FeeType, Decimal>,
    /// Sum of all fees.
    pub total_fees: Decimal,
    /// Cost of goods sold, from allocation records.
    pub cogs: Decimal,
    /// `revenue − total_fees − cogs`.
    pub profit: Decimal,
    /// `profit / revenue`, 4 decimal places; `None` when revenue is zero.
    pub margin: Option<Decimal>,
}

/// Aggregate P&L across all products in a report.
#[derive(Debug, Clone, Serialize)]
pub struct ProfitAndLoss {
    /// Total revenue.
    pub revenue: Decimal,
    /// Total cost of goods sold.
    pub cogs: Decimal,
    /// Fees broken down by category.
    pub fees_by_type: BTreeMap<FeeType, Decimal>,
    /// Sum of all fees.
    pub total_fees: Decimal,
    /// `revenue − total_fees − cogs`.
    pub operating_profit: Decimal,
    /// `operating_profit / revenue`, 4 decimal places; `None` when
    /// revenue is zero.
    pub margin: Option<Decimal>,
}

/// Unit-economics report: per-product rows plus the aggregate P&L.
#[derive(Debug, Clone, Serialize)]
pub struct UnitEconomicsReport {
    /// Period the report covers.
    pub period: ReportPeriod,
    /// Per-product rows, ordered by product ID.
    pub products: Vec<ProductEconomics>,
    /// Aggregate across all rows.
    pub totals: ProfitAndLoss,
}

/// On-hand valuation for one product.
#[derive(Debug, Clone, Serialize)]
pub struct ProductValuation {
    /// Product the row describes.
    pub product_id: ProductId,
    /// Total remaining quantity across lots.
    pub on_hand_qty: Decimal,
    /// Inventory-value-weighted mean unit cost; zero when nothing remains.
    pub weighted_average_cost: Decimal,
    /// `Σ(remaining × cost_per_unit)` across lots, money precision.
    pub value: Decimal,
}

/// Inventory valuation report across all products with stock.
#[derive(Debug, Clone, Serialize)]
pub struct ValuationReport {
    /// Per-product rows, ordered by product ID.
    pub products: Vec<ProductValuation>,
    /// Sum of per-product values.
    pub total_value: Decimal,
}
