//! Purchase receipt records and landed-cost components.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use saltbox_core::{CurrencyCode, ProductId, ReceiptId, ReceiptItemId, ReceiptItemStatus, ReceiptStatus};

/// Weighting method for apportioning a shared cost across receipt items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApportionMethod {
    /// Weight each item by `price_per_unit × quantity`.
    ByPrice,
    /// Weight each item by `volume × quantity`.
    ByVolume,
    /// Weight each item by `weight × quantity`.
    ByWeight,
    /// Every item gets the same share.
    Equal,
}

/// A cost spanning the whole receipt (freight, customs brokerage, ...),
/// split across its items by the chosen weighting method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedCost {
    /// Human-readable label ("sea freight", "import duty").
    pub name: String,
    /// Total amount to distribute.
    pub total_amount: Decimal,
    /// Weighting method.
    pub method: ApportionMethod,
}

/// Item-level cost components beyond the supplier price.
///
/// All four are line totals, not per-unit amounts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtraCosts {
    /// Packaging cost for the line.
    pub packaging: Decimal,
    /// Line-specific logistics cost.
    pub logistics: Decimal,
    /// Customs/duty charged for the line.
    pub customs: Decimal,
    /// Anything else attributable to the line alone.
    pub other: Decimal,
}

impl ExtraCosts {
    /// Sum of all item-level cost components.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.packaging + self.logistics + self.customs + self.other
    }
}

/// One line of a purchase receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiptItem {
    /// Unique receipt item ID.
    pub id: ReceiptItemId,
    /// Product being purchased.
    pub product_id: ProductId,
    /// Quantity ordered from the supplier.
    pub ordered_qty: Decimal,
    /// Quantity actually received; zero until the receipt is received.
    pub received_qty: Decimal,
    /// Supplier price per unit.
    pub price_per_unit: Decimal,
    /// Item-level cost components (line totals).
    pub extra_costs: ExtraCosts,
    /// Unit volume, used by volume-weighted apportionment.
    pub volume: Decimal,
    /// Unit weight, used by weight-weighted apportionment.
    pub weight: Decimal,
    /// Share of the receipt's shared costs assigned to this line.
    pub apportioned_shared_cost: Decimal,
    /// Landed cost per received unit; zero until received.
    pub unit_cost: Decimal,
    /// Full landed cost of the line; zero until received.
    pub total_cost: Decimal,
    /// Line state.
    pub status: ReceiptItemStatus,
}

impl ReceiptItem {
    /// Supplier cost of the received quantity (`price_per_unit ×
    /// received_qty`), before item-level extras and shared costs.
    #[must_use]
    pub fn purchase_cost(&self) -> Decimal {
        self.price_per_unit * self.received_qty
    }
}

/// A purchase receipt: the unit of receiving and of shared-cost
/// apportionment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// Unique receipt ID.
    pub id: ReceiptId,
    /// External reference (supplier invoice number, PO number, ...).
    pub reference: String,
    /// Supplier identifier from the purchasing workflow, if known.
    pub supplier_ref: Option<String>,
    /// Currency of every amount on this receipt.
    pub currency_code: CurrencyCode,
    /// Lifecycle state.
    pub status: ReceiptStatus,
    /// Lines of the receipt.
    pub items: Vec<ReceiptItem>,
    /// Costs shared across the whole receipt.
    pub shared_costs: Vec<SharedCost>,
    /// When the draft was created.
    pub created_at: DateTime<Utc>,
    /// Set when the receipt transitions to `Received`.
    pub received_at: Option<DateTime<Utc>>,
}

impl Receipt {
    /// Find a line by its ID.
    #[must_use]
    pub fn item(&self, id: ReceiptItemId) -> Option<&ReceiptItem> {
        self.items.iter().find(|item| item.id == id)
    }
}

/// Input for drafting a receipt line.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReceiptItem {
    /// Product being purchased.
    pub product_id: ProductId,
    /// Quantity ordered from the supplier.
    pub ordered_qty: Decimal,
    /// Supplier price per unit.
    pub price_per_unit: Decimal,
    /// Item-level cost components (line totals).
    #[serde(default)]
    pub extra_costs: ExtraCosts,
    /// Unit volume.
    #[serde(default)]
    pub volume: Decimal,
    /// Unit weight.
    #[serde(default)]
    pub weight: Decimal,
}

/// Input for drafting a receipt.
#[derive(Debug, Clone, Deserialize)]
pub struct NewReceipt {
    /// External reference (supplier invoice number, PO number, ...).
    pub reference: String,
    /// Supplier identifier, if known.
    #[serde(default)]
    pub supplier_ref: Option<String>,
    /// Currency of every amount on this receipt.
    #[serde(default)]
    pub currency_code: CurrencyCode,
    /// Lines to draft.
    pub items: Vec<NewReceiptItem>,
    /// Costs shared across the whole receipt.
    #[serde(default)]
    pub shared_costs: Vec<SharedCost>,
    /// When the draft was created.
    pub created_at: DateTime<Utc>,
}

/// Received quantity for one line, as reported by the warehouse.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ItemReceipt {
    /// Receipt line the quantity applies to.
    pub item_id: ReceiptItemId,
    /// Quantity actually received.
    pub received_qty: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_extra_costs_total() {
        let extras = ExtraCosts {
            packaging: dec("1.50"),
            logistics: dec("2.00"),
            customs: dec("0.25"),
            other: dec("0.25"),
        };
        assert_eq!(extras.total(), dec("4.00"));
        assert_eq!(ExtraCosts::default().total(), Decimal::ZERO);
    }

    #[test]
    fn test_apportion_method_serde_snake_case() {
        assert_eq!(
            serde_json::to_string(&ApportionMethod::ByPrice).unwrap(),
            "\"by_price\""
        );
        let back: ApportionMethod = serde_json::from_str("\"by_volume\"").unwrap();
        assert_eq!(back, ApportionMethod::ByVolume);
    }

    #[test]
    fn test_purchase_cost_uses_received_qty() {
        let item = ReceiptItem {
            id: ReceiptItemId::new(1),
            product_id: ProductId::new(1),
            ordered_qty: dec("10"),
            received_qty: dec("8"),
            price_per_unit: dec("2.50"),
            extra_costs: ExtraCosts::default(),
            volume: Decimal::ZERO,
            weight: Decimal::ZERO,
            apportioned_shared_cost: Decimal::ZERO,
            unit_cost: Decimal::ZERO,
            total_cost: Decimal::ZERO,
            status: ReceiptItemStatus::Pending,
        };
        assert_eq!(item.purchase_cost(), dec("20.00"));
    }
}
