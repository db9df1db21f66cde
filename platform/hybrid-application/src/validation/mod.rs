use crate::config::Config;
use hybrid_domain::repositories::prices::PriceHistoryRepository;
use hybrid_domain::services::quality::PriceQualityReport;
use hybrid_domain::value_objects::period::Period;
use hybrid_domain::value_objects::ticker::Ticker;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::info_span;

/// Closes needed for at least two daily returns (sample statistics).
pub const MIN_UNIVERSE_ROWS: usize = 3;
/// Closes needed for one return (drift forecast).
pub const MIN_FORECAST_ROWS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolCheck {
    pub ticker: String,
    pub role: &'static str,
    pub rows: usize,
    pub required: usize,
    pub error: Option<String>,
    pub quality: Option<PriceQualityReport>,
}

impl SymbolCheck {
    pub fn ok(&self) -> bool {
        self.error.is_none() && self.rows >= self.required
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationReport {
    pub strict: bool,
    pub symbols: Vec<SymbolCheck>,
    pub passed: bool,
}

impl ValidationReport {
    pub fn failures(&self) -> impl Iterator<Item = &SymbolCheck> {
        self.symbols.iter().filter(|c| !c.ok())
    }
}

/// Checks that every universe symbol and catalog ticker has enough price
/// history. In strict mode quality defects in the files also fail the run.
pub fn validate(
    config: &Config,
    strict: bool,
    prices: &dyn PriceHistoryRepository,
) -> ValidationReport {
    let _span = info_span!("app.validate", strict = strict).entered();

    let mut checks = Vec::new();
    for ticker in &config.universe.symbols {
        checks.push(check(
            prices,
            ticker,
            &config.universe.window,
            "universe",
            MIN_UNIVERSE_ROWS,
        ));
    }
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    for asset in &config.assets {
        if !seen.insert(asset.ticker.as_str()) {
            continue;
        }
        checks.push(check(
            prices,
            &asset.ticker,
            &config.forecast.history_window,
            "catalog",
            MIN_FORECAST_ROWS,
        ));
    }

    let passed = checks.iter().all(|c| {
        c.ok()
            && (!strict
                || c.quality
                    .as_ref()
                    .map(PriceQualityReport::is_clean)
                    .unwrap_or(true))
    });
    let missing = checks.iter().filter(|c| !c.ok()).count();
    metrics::gauge!("hybrid.app.validate.missing_symbols").set(missing as f64);
    if passed {
        tracing::info!(symbols = checks.len(), "price data validated");
    } else {
        tracing::warn!(symbols = checks.len(), missing, "price data validation found problems");
    }

    ValidationReport {
        strict,
        symbols: checks,
        passed,
    }
}

fn check(
    prices: &dyn PriceHistoryRepository,
    ticker: &Ticker,
    window: &Period,
    role: &'static str,
    required: usize,
) -> SymbolCheck {
    match prices.history(ticker, window) {
        Ok((series, quality)) => SymbolCheck {
            ticker: ticker.to_string(),
            role,
            rows: series.len(),
            required,
            error: None,
            quality: Some(quality),
        },
        Err(err) => SymbolCheck {
            ticker: ticker.to_string(),
            role,
            rows: 0,
            required,
            error: Some(err),
            quality: None,
        },
    }
}
