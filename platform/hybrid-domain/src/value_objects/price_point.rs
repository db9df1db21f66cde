use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One daily close. Trading days only; non-trading days are simply absent.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub date: NaiveDate,
    pub close: f64,
}

impl PricePoint {
    pub fn new(date: NaiveDate, close: f64) -> Self {
        Self { date, close }
    }
}
