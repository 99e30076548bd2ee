//! Domain records for the costing engine.

pub mod economics;
pub mod lot;
pub mod receipt;

pub use economics::{
    FeeFact, FeeType, ProductEconomics, ProductValuation, ProfitAndLoss, ReportPeriod, SaleFact,
    UnitEconomicsReport, ValuationReport,
};
pub use lot::{Allocation, ConsumerRef, Lot};
pub use receipt::{
    ApportionMethod, ExtraCosts, ItemReceipt, NewReceipt, NewReceiptItem, Receipt, ReceiptItem,
    SharedCost,
};
