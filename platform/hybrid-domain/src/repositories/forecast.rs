use crate::entities::forecast::Forecast;
use crate::entities::price_series::PriceSeries;
use crate::value_objects::ticker::Ticker;

/// Supplies history, latest close and a one-step-ahead prediction.
pub trait ForecastRepository {
    fn forecast(&self, ticker: &Ticker) -> Result<Forecast, String>;
}

/// One-step-ahead price model over a validated history.
pub trait ForecastModel {
    fn predict_next(&self, ticker: &Ticker, history: &PriceSeries) -> Result<f64, String>;

    fn name(&self) -> &'static str;
}
