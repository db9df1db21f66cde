use crate::entities::price_series::PriceSeries;
use crate::repositories::forecast::ForecastModel;
use crate::services::stats;
use crate::value_objects::ticker::Ticker;

/// Baseline one-step model: last close scaled by the mean of recent daily
/// returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriftForecaster {
    pub lookback: usize,
}

impl Default for DriftForecaster {
    fn default() -> Self {
        Self { lookback: 20 }
    }
}

impl DriftForecaster {
    pub fn new(lookback: usize) -> Self {
        Self { lookback }
    }
}

impl ForecastModel for DriftForecaster {
    fn predict_next(&self, _ticker: &Ticker, history: &PriceSeries) -> Result<f64, String> {
        let last = history
            .last()
            .ok_or_else(|| "cannot forecast an empty history".to_string())?;
        if self.lookback == 0 {
            return Err("drift lookback must be at least 1".to_string());
        }
        let returns = history.daily_returns();
        if returns.is_empty() {
            return Err(format!(
                "need at least 2 closes to forecast, got {}",
                history.len()
            ));
        }
        let start = returns.len().saturating_sub(self.lookback);
        let drift = stats::mean(&returns[start..])
            .ok_or_else(|| "drift undefined".to_string())?;
        Ok(last.close * (1.0 + drift))
    }

    fn name(&self) -> &'static str {
        "drift"
    }
}
