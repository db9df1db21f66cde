use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OptimizationStatus {
    Optimized { iterations: usize, sharpe: f64 },
    Unoptimized { reason: String },
}

impl OptimizationStatus {
    pub fn is_optimized(&self) -> bool {
        matches!(self, OptimizationStatus::Optimized { .. })
    }
}

/// Continuous weights over the selected subset, in selection order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Allocation {
    pub weights: Vec<(String, f64)>,
    pub status: OptimizationStatus,
}

impl Allocation {
    pub fn weight_of(&self, symbol: &str) -> Option<f64> {
        self.weights
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, w)| *w)
    }

    pub fn total_weight(&self) -> f64 {
        self.weights.iter().map(|(_, w)| w).sum()
    }
}

/// Discrete purchase for one instrument.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LotSize {
    pub allocated_amount: f64,
    pub lots: u64,
    pub executed_value: f64,
}

impl LotSize {
    /// Part of the allocation that could not be spent in whole lots.
    pub fn remainder(&self) -> f64 {
        self.allocated_amount - self.executed_value
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationEntry {
    pub symbol: String,
    pub price: f64,
    pub weight: f64,
    pub allocated_amount: f64,
    pub lots: u64,
    pub executed_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationPlan {
    pub budget: f64,
    pub unit_size: u64,
    pub entries: Vec<AllocationEntry>,
    pub status: OptimizationStatus,
    pub total_executed: f64,
    /// `budget - total_executed`; never negative.
    pub residual: f64,
}

impl AllocationPlan {
    pub fn new(
        budget: f64,
        unit_size: u64,
        entries: Vec<AllocationEntry>,
        status: OptimizationStatus,
    ) -> Self {
        let total_executed: f64 = entries.iter().map(|e| e.executed_value).sum();
        Self {
            budget,
            unit_size,
            residual: budget - total_executed,
            total_executed,
            entries,
            status,
        }
    }

    pub fn is_optimized(&self) -> bool {
        self.status.is_optimized()
    }

    pub fn unspent_remainders(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| e.allocated_amount - e.executed_value)
            .sum()
    }
}
