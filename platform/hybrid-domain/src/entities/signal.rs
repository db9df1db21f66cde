use crate::value_objects::call::{Call, SentimentBucket, TechnicalDirection};
use serde::Serialize;

/// Outcome of one fusion evaluation. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub call: Call,
    pub technical: TechnicalDirection,
    pub sentiment_bucket: SentimentBucket,
    /// Forecast move in percent, `(predicted - current) / current * 100`.
    pub change_pct: f64,
    pub reason: &'static str,
}

impl Signal {
    /// Percent move rendered with two decimals, e.g. `"0.60%"`.
    pub fn change_label(&self) -> String {
        format!("{:.2}%", self.change_pct)
    }
}
