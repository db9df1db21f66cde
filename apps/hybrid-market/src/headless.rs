use crate::CommandError;
use chrono::Utc;
use hybrid_application::allocation::{build_plan_detailed, PlanPolicies};
use hybrid_application::config::{Config, ForecastMode};
use hybrid_application::daily::{daily_snapshot, write_daily};
use hybrid_application::recommendation::{default_keyword, recommend, RecommendPolicies};
use hybrid_application::reporting::{plan_json, write_plan_artifacts, write_signal_artifact};
use hybrid_application::validation::validate;
use hybrid_domain::repositories::forecast::ForecastModel;
use hybrid_domain::repositories::headlines::HeadlineRepository;
use hybrid_domain::services::forecast::DriftForecaster;
use hybrid_domain::value_objects::ticker::Ticker;
use hybrid_infrastructure::artifacts::FilesystemArtifactWriter;
use hybrid_infrastructure::forecast::{LocalForecastRepository, RemoteForecastClient};
use hybrid_infrastructure::headlines::{HeadlineFileStore, NoHeadlines};
use hybrid_infrastructure::market_data::CsvPriceStore;
use std::path::{Path, PathBuf};

pub enum SignalTarget {
    Ticker {
        ticker: String,
        keyword: Option<String>,
    },
    Asset(String),
}

pub fn recommend_policies(config: &Config) -> RecommendPolicies {
    RecommendPolicies {
        fusion: config.fusion_policy(),
        sentiment: config.sentiment_policy(),
    }
}

pub fn plan_policies(config: &Config) -> PlanPolicies {
    PlanPolicies {
        screen: config.screen_policy(),
        optimizer: config.optimizer_policy(),
        lots: config.lot_policy(),
    }
}

pub fn build_price_store(config: &Config) -> CsvPriceStore {
    CsvPriceStore::new(&config.data.prices_dir)
}

pub fn build_forecast_repo(
    config: &Config,
) -> Result<LocalForecastRepository<CsvPriceStore>, String> {
    let model: Box<dyn ForecastModel> = match config.forecast.mode {
        ForecastMode::Drift => Box::new(DriftForecaster::new(config.forecast.drift_lookback)),
        ForecastMode::Remote => {
            let url = config
                .forecast
                .url
                .clone()
                .ok_or_else(|| "forecast.url is required for remote mode".to_string())?;
            let client = RemoteForecastClient::new(
                url.clone(),
                config.forecast.timeout_ms,
                config.forecast.retries,
            )
            .map_err(|err| format!("failed to init forecast client (url={url}): {err}"))?;
            Box::new(client)
        }
    };
    Ok(LocalForecastRepository::new(
        build_price_store(config),
        model,
        config.forecast.history_window.clone(),
    ))
}

pub fn build_headline_repo(config: &Config) -> Box<dyn HeadlineRepository> {
    match config.data.headlines_path.as_deref() {
        Some(path) if !path.trim().is_empty() => Box::new(HeadlineFileStore::new(path)),
        _ => Box::new(NoHeadlines),
    }
}

/// `(ticker, keyword)` for a target, consulting the asset catalog.
pub fn resolve_target(config: &Config, target: &SignalTarget) -> Result<(Ticker, String), String> {
    match target {
        SignalTarget::Asset(name) => config
            .find_asset(name)
            .map(|asset| (asset.ticker.clone(), asset.keyword.clone()))
            .ok_or_else(|| {
                let known: Vec<&str> = config.assets.iter().map(|a| a.name.as_str()).collect();
                format!("unknown asset {name}; catalog has {}", known.join(", "))
            }),
        SignalTarget::Ticker { ticker, keyword } => {
            let ticker = Ticker::parse(ticker).map_err(|err| err.to_string())?;
            let keyword = keyword
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| default_keyword(&ticker));
            Ok((ticker, keyword))
        }
    }
}

fn out_dir(config: &Config, out: Option<&Path>) -> PathBuf {
    out.map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&config.run.out_dir))
}

pub fn run_signal(
    config: &Config,
    target: &SignalTarget,
    out: Option<&Path>,
) -> Result<serde_json::Value, CommandError> {
    let (ticker, keyword) = resolve_target(config, target)?;
    let forecasts = build_forecast_repo(config)?;
    let headlines = build_headline_repo(config);
    let rec = recommend(
        &ticker,
        &keyword,
        &forecasts,
        headlines.as_ref(),
        &recommend_policies(config),
        Utc::now(),
    )?;
    let path = write_signal_artifact(&rec, &out_dir(config, out), &FilesystemArtifactWriter)?;
    Ok(serde_json::json!({
        "status": "ok",
        "mode": "signal",
        "recommendation": rec.summary_json(),
        "artifact": path.display().to_string(),
    }))
}

pub fn run_plan(
    config: &Config,
    amount: f64,
    out: Option<&Path>,
) -> Result<serde_json::Value, CommandError> {
    let prices = build_price_store(config);
    let report = build_plan_detailed(
        amount,
        &prices,
        &config.universe_symbols(),
        &config.universe.window,
        &plan_policies(config),
    )?;
    let written = write_plan_artifacts(&report, &out_dir(config, out), &FilesystemArtifactWriter)?;
    Ok(serde_json::json!({
        "status": "ok",
        "mode": "plan",
        "plan": plan_json(&report),
        "artifacts": written.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
    }))
}

pub fn run_daily(config: &Config, out: Option<&Path>) -> Result<serde_json::Value, CommandError> {
    let forecasts = build_forecast_repo(config)?;
    let headlines = build_headline_repo(config);
    let snapshot = daily_snapshot(
        &config.assets,
        &forecasts,
        headlines.as_ref(),
        &recommend_policies(config),
        Utc::now(),
    );
    let path = write_daily(&snapshot, &out_dir(config, out), &FilesystemArtifactWriter)?;
    Ok(serde_json::json!({
        "status": if snapshot.failures() == 0 { "ok" } else { "partial" },
        "mode": "daily",
        "failures": snapshot.failures(),
        "snapshot": snapshot,
        "artifact": path.display().to_string(),
    }))
}

pub fn run_validate(config: &Config, strict: bool) -> Result<serde_json::Value, CommandError> {
    let prices = build_price_store(config);
    let report = validate(config, strict, &prices);
    if strict && !report.passed {
        let missing: Vec<String> = report.failures().map(|c| c.ticker.clone()).collect();
        let detail = if missing.is_empty() {
            "price files have data-quality issues".to_string()
        } else {
            format!("missing or short price history: {}", missing.join(", "))
        };
        return Err(CommandError::new(
            format!("strict validation failed: {detail}"),
            2,
        ));
    }
    Ok(serde_json::json!({
        "status": if report.passed { "ok" } else { "warn" },
        "mode": "validate",
        "strict": strict,
        "prices_dir": config.data.prices_dir,
        "report": report,
    }))
}
