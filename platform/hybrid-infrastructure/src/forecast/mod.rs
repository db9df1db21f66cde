pub mod remote;

pub use remote::{ForecastCallInfo, RemoteForecastClient};

use hybrid_domain::entities::forecast::Forecast;
use hybrid_domain::repositories::forecast::{ForecastModel, ForecastRepository};
use hybrid_domain::repositories::prices::PriceHistoryRepository;
use hybrid_domain::value_objects::period::Period;
use hybrid_domain::value_objects::ticker::Ticker;
use std::time::Instant;

/// Forecasts from locally stored history: loads the trailing window for the
/// ticker and hands it to a one-step model.
pub struct LocalForecastRepository<P> {
    prices: P,
    model: Box<dyn ForecastModel>,
    window: Period,
}

impl<P: PriceHistoryRepository> LocalForecastRepository<P> {
    pub fn new(prices: P, model: Box<dyn ForecastModel>, window: Period) -> Self {
        Self {
            prices,
            model,
            window,
        }
    }
}

impl<P: PriceHistoryRepository> ForecastRepository for LocalForecastRepository<P> {
    fn forecast(&self, ticker: &Ticker) -> Result<Forecast, String> {
        let _span = tracing::info_span!(
            "infra.forecast",
            ticker = %ticker,
            model = self.model.name(),
            window = %self.window
        )
        .entered();
        let start = Instant::now();

        let (history, _report) = self.prices.history(ticker, &self.window)?;
        let current_price = history
            .last()
            .map(|p| p.close)
            .ok_or_else(|| format!("no price history for {ticker}"))?;
        let predicted_price = self.model.predict_next(ticker, &history)?;
        if !predicted_price.is_finite() {
            return Err(format!(
                "{} model returned a non-finite prediction for {ticker}",
                self.model.name()
            ));
        }

        metrics::histogram!("hybrid.infra.forecast.call_ms", "model" => self.model.name())
            .record(start.elapsed().as_millis() as f64);
        tracing::debug!(current_price, predicted_price, rows = history.len(), "forecast ready");
        Ok(Forecast {
            history,
            current_price,
            predicted_price,
        })
    }
}
