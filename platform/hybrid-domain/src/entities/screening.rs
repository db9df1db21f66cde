use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub symbol: String,
    pub risk_adjusted_score: f64,
}

/// Ordered selection produced by the screener. `dropped` lists instruments
/// that could not be ranked (empty or zero-variance return series).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Screening {
    pub selected: Vec<RankedCandidate>,
    pub dropped: Vec<String>,
}

impl Screening {
    pub fn symbols(&self) -> Vec<String> {
        self.selected.iter().map(|c| c.symbol.clone()).collect()
    }
}
