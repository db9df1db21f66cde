use chrono::{DateTime, Utc};
use hybrid_domain::entities::forecast::Forecast;
use hybrid_domain::entities::sentiment::SentimentResult;
use hybrid_domain::entities::signal::Signal;
use hybrid_domain::errors::CoreError;
use hybrid_domain::repositories::forecast::ForecastRepository;
use hybrid_domain::repositories::headlines::HeadlineRepository;
use hybrid_domain::services::fusion::FusionPolicy;
use hybrid_domain::services::sentiment::{summarize_headlines, SentimentPolicy};
use hybrid_domain::value_objects::ticker::Ticker;
use serde::Serialize;
use std::time::Instant;
use tracing::info_span;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub ticker: Ticker,
    pub keyword: String,
    pub generated_at: DateTime<Utc>,
    pub forecast: Forecast,
    pub sentiment: SentimentResult,
    pub signal: Signal,
}

impl Recommendation {
    /// Compact view without the price history, for stdout and `signal.json`.
    pub fn summary_json(&self) -> serde_json::Value {
        serde_json::json!({
            "ticker": self.ticker,
            "keyword": self.keyword,
            "generated_at": self.generated_at.to_rfc3339(),
            "current_price": self.forecast.current_price,
            "predicted_price": self.forecast.predicted_price,
            "history_rows": self.forecast.history.len(),
            "change": self.signal.change_label(),
            "sentiment": {
                "score": self.sentiment.score,
                "label": self.sentiment.label.as_str(),
                "headlines": self.sentiment.headlines,
            },
            "signal": self.signal.call.as_str(),
            "reason": self.signal.reason,
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct RecommendPolicies {
    pub fusion: FusionPolicy,
    pub sentiment: SentimentPolicy,
}

/// News search phrase used when the caller gives none: the symbol without
/// its exchange suffix, e.g. `GOTO.JK` -> `GOTO stock`.
pub fn default_keyword(ticker: &Ticker) -> String {
    let base = ticker
        .as_str()
        .split(['.', '='])
        .next()
        .unwrap_or(ticker.as_str());
    format!("{base} stock")
}

pub fn recommend(
    ticker: &Ticker,
    keyword: &str,
    forecasts: &dyn ForecastRepository,
    headlines: &dyn HeadlineRepository,
    policies: &RecommendPolicies,
    now: DateTime<Utc>,
) -> Result<Recommendation, CoreError> {
    let _span = info_span!("app.recommend", ticker = %ticker, keyword = %keyword).entered();
    metrics::counter!("hybrid.app.recommend.calls_total").increment(1);
    let start = Instant::now();

    let forecast = forecasts.forecast(ticker).map_err(|err| {
        metrics::counter!("hybrid.app.recommend.errors_total", "stage" => "forecast")
            .increment(1);
        tracing::warn!(error = %err, "forecast unavailable");
        CoreError::NotFound(format!("no forecast for {ticker}: {err}"))
    })?;

    let since = now - policies.sentiment.window.as_duration();
    let sentiment = match headlines.headlines(keyword, since) {
        Ok(items) => summarize_headlines(items, now, &policies.sentiment),
        Err(err) => {
            metrics::counter!("hybrid.app.recommend.errors_total", "stage" => "headlines")
                .increment(1);
            tracing::warn!(error = %err, "headline source failed; sentiment marked as error");
            SentimentResult::error()
        }
    };

    let signal = policies.fusion.fuse(
        forecast.current_price,
        forecast.predicted_price,
        sentiment.score,
    )?;
    metrics::counter!("hybrid.app.recommend.signals_total", "call" => signal.call.as_str())
        .increment(1);
    metrics::histogram!("hybrid.app.recommend.call_ms")
        .record(start.elapsed().as_millis() as f64);
    tracing::info!(
        call = signal.call.as_str(),
        change = %signal.change_label(),
        sentiment = sentiment.score,
        headlines = sentiment.headlines.len(),
        "recommendation ready"
    );

    Ok(Recommendation {
        ticker: ticker.clone(),
        keyword: keyword.to_string(),
        generated_at: now,
        forecast,
        sentiment,
        signal,
    })
}
