use chrono::NaiveDate;
use serde::Serialize;

/// Defects found while loading a close-price file. Rows counted here were
/// dropped or merged; the loaded series is always clean.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PriceQualityReport {
    pub rows: usize,
    pub duplicates: usize,
    pub out_of_order: usize,
    pub invalid_close: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    pub first_duplicate: Option<NaiveDate>,
    pub first_invalid_close: Option<NaiveDate>,
}

impl PriceQualityReport {
    pub fn is_clean(&self) -> bool {
        self.duplicates == 0 && self.out_of_order == 0 && self.invalid_close == 0
    }

    pub fn issues(&self) -> usize {
        self.duplicates + self.out_of_order + self.invalid_close
    }
}
