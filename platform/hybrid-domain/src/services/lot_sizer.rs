use crate::entities::allocation::{Allocation, AllocationEntry, AllocationPlan, LotSize};
use crate::errors::CoreError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LotPolicy {
    /// Shares per tradable lot on the target exchange.
    pub unit_size: u64,
}

impl Default for LotPolicy {
    fn default() -> Self {
        Self { unit_size: 100 }
    }
}

/// Converts a weight of `budget` into whole lots at `price`. Whatever cannot
/// be spent in whole lots stays unallocated.
pub fn size(weight: f64, price: f64, budget: f64, unit_size: u64) -> LotSize {
    let allocated_amount = budget * weight;
    let lot_cost = price * unit_size as f64;
    if !(allocated_amount.is_finite() && lot_cost.is_finite()) || lot_cost <= 0.0 {
        return LotSize {
            allocated_amount,
            lots: 0,
            executed_value: 0.0,
        };
    }

    let raw = (allocated_amount / lot_cost).floor();
    let mut lots = if raw >= 1.0 { raw as u64 } else { 0 };
    // Rounding in the division can land one lot above the allocation.
    while lots > 0 && lots as f64 * lot_cost > allocated_amount {
        lots -= 1;
    }

    LotSize {
        allocated_amount,
        lots,
        executed_value: lots as f64 * lot_cost,
    }
}

/// Sizes every weighted instrument and assembles the purchase plan.
/// `prices` must contain a positive price for each weighted symbol.
pub fn build_plan(
    budget: f64,
    allocation: &Allocation,
    prices: &[(String, f64)],
    policy: &LotPolicy,
) -> Result<AllocationPlan, CoreError> {
    if !budget.is_finite() || budget <= 0.0 {
        return Err(CoreError::invalid(format!(
            "investment amount must be finite and > 0, got {budget}"
        )));
    }
    if policy.unit_size == 0 {
        return Err(CoreError::invalid("lot unit size must be at least 1"));
    }

    let entries = allocation
        .weights
        .iter()
        .map(|(symbol, weight)| {
            let price = prices
                .iter()
                .find(|(s, _)| s == symbol)
                .map(|(_, p)| *p)
                .ok_or_else(|| CoreError::NotFound(format!("no price for {symbol}")))?;
            if !price.is_finite() || price <= 0.0 {
                return Err(CoreError::invalid(format!(
                    "price for {symbol} must be > 0, got {price}"
                )));
            }
            let lot = size(*weight, price, budget, policy.unit_size);
            Ok(AllocationEntry {
                symbol: symbol.clone(),
                price,
                weight: *weight,
                allocated_amount: lot.allocated_amount,
                lots: lot.lots,
                executed_value: lot.executed_value,
            })
        })
        .collect::<Result<Vec<_>, CoreError>>()?;

    Ok(AllocationPlan::new(
        budget,
        policy.unit_size,
        entries,
        allocation.status.clone(),
    ))
}

#[cfg(test)]
mod tests {
    use super::{build_plan, size, LotPolicy};
    use crate::entities::allocation::{Allocation, OptimizationStatus};
    use crate::errors::ErrorKind;

    #[test]
    fn exact_lot_multiple() {
        let lot = size(0.25, 1000.0, 10_000_000.0, 100);
        assert_eq!(lot.allocated_amount, 2_500_000.0);
        assert_eq!(lot.lots, 25);
        assert_eq!(lot.executed_value, 2_500_000.0);
        assert_eq!(lot.remainder(), 0.0);
    }

    #[test]
    fn rounds_down_and_reports_remainder() {
        let lot = size(0.3, 4_130.0, 10_000_000.0, 100);
        assert_eq!(lot.lots, 7);
        assert!((lot.executed_value - 2_891_000.0).abs() < 1e-6);
        assert!((lot.remainder() - 109_000.0).abs() < 1e-6);
    }

    #[test]
    fn unaffordable_lot_buys_nothing() {
        let lot = size(0.05, 9_000.0, 1_000_000.0, 100);
        assert_eq!(lot.lots, 0);
        assert_eq!(lot.executed_value, 0.0);
        assert_eq!(lot.allocated_amount, 50_000.0);
    }

    #[test]
    fn plan_residual_equals_unspent_remainders() {
        let allocation = Allocation {
            weights: vec![
                ("BBCA.JK".to_string(), 0.4),
                ("TLKM.JK".to_string(), 0.3),
                ("ASII.JK".to_string(), 0.2),
                ("UNVR.JK".to_string(), 0.1),
            ],
            status: OptimizationStatus::Optimized {
                iterations: 12,
                sharpe: 1.4,
            },
        };
        let prices = vec![
            ("BBCA.JK".to_string(), 9_875.0),
            ("TLKM.JK".to_string(), 3_120.0),
            ("ASII.JK".to_string(), 5_025.0),
            ("UNVR.JK".to_string(), 2_730.0),
        ];
        let plan = build_plan(7_500_000.0, &allocation, &prices, &LotPolicy::default()).unwrap();
        assert_eq!(plan.entries.len(), 4);
        assert!(plan.residual >= 0.0);
        assert!((plan.residual - plan.unspent_remainders()).abs() < 1e-6);
        assert!(plan
            .entries
            .iter()
            .all(|e| e.executed_value <= e.allocated_amount));
        assert!(plan.is_optimized());
    }

    #[test]
    fn plan_rejects_bad_budget_and_missing_price() {
        let allocation = Allocation {
            weights: vec![("A".to_string(), 1.0)],
            status: OptimizationStatus::Unoptimized {
                reason: "test".to_string(),
            },
        };
        let prices = vec![("A".to_string(), 100.0)];
        let err = build_plan(0.0, &allocation, &prices, &LotPolicy::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = build_plan(1_000.0, &allocation, &[], &LotPolicy::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
