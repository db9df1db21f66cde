use crate::entities::price_series::PriceSeries;
use serde::Serialize;

/// What the forecast adapter hands to the core: the history it used plus the
/// latest close and the one-step-ahead prediction for the same instrument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub history: PriceSeries,
    pub current_price: f64,
    pub predicted_price: f64,
}
