use crate::config::{AssetConfig, AssetKind};
use crate::recommendation::{recommend, RecommendPolicies, Recommendation};
use chrono::{DateTime, Utc};
use hybrid_domain::errors::ErrorKind;
use hybrid_domain::repositories::artifacts::ArtifactWriter;
use hybrid_domain::repositories::forecast::ForecastRepository;
use hybrid_domain::repositories::headlines::HeadlineRepository;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info_span;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyEntry {
    pub name: String,
    pub kind: AssetKind,
    pub ticker: String,
    pub recommendation: Option<serde_json::Value>,
    pub error: Option<DailyError>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyError {
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySnapshot {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<DailyEntry>,
}

impl DailySnapshot {
    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.error.is_some()).count()
    }
}

/// Evaluates every catalog asset. One asset failing does not stop the rest.
pub fn daily_snapshot(
    assets: &[AssetConfig],
    forecasts: &dyn ForecastRepository,
    headlines: &dyn HeadlineRepository,
    policies: &RecommendPolicies,
    now: DateTime<Utc>,
) -> DailySnapshot {
    let _span = info_span!("app.daily", assets = assets.len()).entered();

    let entries = assets
        .iter()
        .map(|asset| {
            let outcome: Result<Recommendation, _> = recommend(
                &asset.ticker,
                &asset.keyword,
                forecasts,
                headlines,
                policies,
                now,
            );
            match outcome {
                Ok(rec) => DailyEntry {
                    name: asset.name.clone(),
                    kind: asset.kind,
                    ticker: asset.ticker.to_string(),
                    recommendation: Some(rec.summary_json()),
                    error: None,
                },
                Err(err) => {
                    metrics::counter!("hybrid.app.daily.failures_total").increment(1);
                    tracing::warn!(asset = %asset.name, error = %err, "asset skipped");
                    DailyEntry {
                        name: asset.name.clone(),
                        kind: asset.kind,
                        ticker: asset.ticker.to_string(),
                        recommendation: None,
                        error: Some(DailyError {
                            kind: err.kind(),
                            message: err.to_string(),
                        }),
                    }
                }
            }
        })
        .collect();

    DailySnapshot {
        generated_at: now,
        entries,
    }
}

pub fn write_daily(
    snapshot: &DailySnapshot,
    out_dir: &Path,
    writer: &dyn ArtifactWriter,
) -> Result<PathBuf, String> {
    writer.ensure_dir(out_dir)?;
    let path = out_dir.join("daily.json");
    let value = serde_json::to_value(snapshot)
        .map_err(|err| format!("failed to encode daily snapshot: {err}"))?;
    writer.write_json(&path, &value)?;
    Ok(path)
}
