//! Shared-cost apportionment across the items of one receipt.
//!
//! Freight, customs brokerage, and similar costs arrive attached to a
//! receipt as a whole. Each [`SharedCost`] is split across the receipt's
//! items according to its weighting method, and the split must conserve
//! the cost total to the cent.

use rust_decimal::Decimal;

use saltbox_core::round_money;

use crate::error::CostingError;
use crate::models::{ApportionMethod, SharedCost};

/// One receipt line as seen by the apportioner.
#[derive(Debug, Clone)]
pub struct ApportionLine {
    /// Quantity being received for the line.
    pub quantity: Decimal,
    /// Supplier price per unit.
    pub price_per_unit: Decimal,
    /// Unit volume.
    pub volume: Decimal,
    /// Unit weight.
    pub weight: Decimal,
}

/// Split every shared cost across the lines and accumulate per line.
///
/// Returns one amount per input line, same order, each quantized to
/// money precision. For each shared cost the rounded shares are summed
/// and any residual cent is assigned to the last line, so
/// `Σ result == Σ cost totals` exactly. A cost whose weights sum to zero
/// (missing volume/weight data) falls back to an equal split.
///
/// # Errors
///
/// Returns [`CostingError::Validation`] when a non-zero shared cost has
/// no lines to land on.
pub fn apportion_shared_costs(
    lines: &[ApportionLine],
    costs: &[SharedCost],
) -> Result<Vec<Decimal>, CostingError> {
    let mut accumulated = vec![Decimal::ZERO; lines.len()];

    for cost in costs {
        if lines.is_empty() {
            if cost.total_amount.is_zero() {
                continue;
            }
            return Err(CostingError::validation(format!(
                "shared cost {:?} has no receipt items to apportion over",
                cost.name
            )));
        }

        let weights = effective_weights(lines, cost.method);
        let total_weight: Decimal = weights.iter().copied().sum();

        let mut assigned = Decimal::ZERO;
        let mut shares = Vec::with_capacity(lines.len());
        for weight in weights {
            let share = round_money(cost.total_amount * weight / total_weight);
            assigned += share;
            shares.push(share);
        }

        // Residual cent lands on the last line.
        let residual = cost.total_amount - assigned;
        if let Some(last) = shares.last_mut() {
            *last += residual;
        }

        for (slot, share) in accumulated.iter_mut().zip(shares) {
            *slot += share;
        }
    }

    Ok(accumulated)
}

fn effective_weights(lines: &[ApportionLine], method: ApportionMethod) -> Vec<Decimal> {
    let raw: Vec<Decimal> = lines.iter().map(|line| weight_for(line, method)).collect();
    if raw.iter().copied().sum::<Decimal>().is_zero() {
        // Missing volume/weight data: fall back to an equal split.
        return vec![Decimal::ONE; lines.len()];
    }
    raw
}

fn weight_for(line: &ApportionLine, method: ApportionMethod) -> Decimal {
    match method {
        ApportionMethod::ByPrice => line.price_per_unit * line.quantity,
        ApportionMethod::ByVolume => line.volume * line.quantity,
        ApportionMethod::ByWeight => line.weight * line.quantity,
        ApportionMethod::Equal => Decimal::ONE,
    }
}
