use chrono::NaiveDate;
use hybrid_domain::entities::price_series::PriceSeries;
use hybrid_domain::repositories::forecast::ForecastModel;
use hybrid_domain::value_objects::ticker::Ticker;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Serialize)]
pub struct ForecastRequest<'a> {
    pub ticker: &'a str,
    pub history: Vec<HistoryPoint>,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct HistoryPoint {
    pub date: NaiveDate,
    pub close: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ForecastResponse {
    pub predicted_price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ForecastCallInfo {
    pub attempts: u32,
    pub duration_ms: u64,
    pub status: Option<u16>,
    pub error: Option<String>,
}

/// Model service reached over HTTP: `POST {url}/v1/forecast`.
pub struct RemoteForecastClient {
    pub url: String,
    pub timeout_ms: u64,
    pub retries: u32,
    client: Client,
}

impl RemoteForecastClient {
    pub fn new(url: String, timeout_ms: u64, retries: u32) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|err| format!("failed to build http client: {err}"))?;
        Ok(Self {
            url,
            timeout_ms,
            retries,
            client,
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/v1/forecast", self.url.trim_end_matches('/'))
    }

    pub fn predict_detailed(
        &self,
        ticker: &str,
        history: &PriceSeries,
    ) -> (Result<f64, String>, ForecastCallInfo) {
        let endpoint = self.endpoint();
        let span = tracing::info_span!(
            "infra.forecast.remote",
            endpoint = %endpoint,
            ticker = %ticker,
            timeout_ms = self.timeout_ms,
            retries = self.retries
        );
        let _enter = span.enter();

        let request = ForecastRequest {
            ticker,
            history: history
                .points()
                .iter()
                .map(|p| HistoryPoint {
                    date: p.date,
                    close: p.close,
                })
                .collect(),
        };

        let start = Instant::now();
        let mut attempts = 0u32;
        let mut last_status: Option<u16> = None;
        let mut last_error: Option<String> = None;
        let mut last_error_kind: &'static str = "unknown";

        while attempts <= self.retries {
            attempts += 1;
            if attempts > 1 {
                metrics::counter!("hybrid.infra.forecast.retries_total").increment(1);
                tracing::debug!(attempt = attempts, "retrying forecast request");
            }
            metrics::counter!("hybrid.infra.forecast.requests_total").increment(1);

            let attempt_start = Instant::now();
            match self.client.post(&endpoint).json(&request).send() {
                Ok(resp) => {
                    let status = resp.status();
                    last_status = Some(status.as_u16());
                    metrics::histogram!(
                        "hybrid.infra.forecast.attempt_ms",
                        "status" => status.as_u16().to_string()
                    )
                    .record(attempt_start.elapsed().as_millis() as f64);

                    if status == StatusCode::OK {
                        match resp.json::<ForecastResponse>() {
                            Ok(parsed) if parsed.predicted_price.is_finite() => {
                                let duration_ms = start.elapsed().as_millis() as u64;
                                metrics::histogram!(
                                    "hybrid.infra.forecast.call_ms",
                                    "model" => "remote",
                                    "result" => "ok"
                                )
                                .record(duration_ms as f64);
                                return (
                                    Ok(parsed.predicted_price),
                                    ForecastCallInfo {
                                        attempts,
                                        duration_ms,
                                        status: last_status,
                                        error: None,
                                    },
                                );
                            }
                            Ok(parsed) => {
                                last_error = Some(format!(
                                    "forecast service returned non-finite prediction {}",
                                    parsed.predicted_price
                                ));
                                last_error_kind = "validate";
                                break;
                            }
                            Err(err) => {
                                last_error =
                                    Some(format!("failed to parse forecast response: {err}"));
                                last_error_kind = "decode";
                                break;
                            }
                        }
                    }

                    if status.is_server_error() && attempts <= self.retries {
                        continue;
                    }
                    last_error = Some(format!(
                        "forecast http error: status {}",
                        status.as_u16()
                    ));
                    last_error_kind = "http_status";
                    break;
                }
                Err(err) => {
                    metrics::histogram!(
                        "hybrid.infra.forecast.attempt_ms",
                        "status" => "err"
                    )
                    .record(attempt_start.elapsed().as_millis() as f64);
                    last_error = Some(format!("forecast request failed: {err}"));
                    last_error_kind = "transport";
                    if attempts <= self.retries {
                        continue;
                    }
                    break;
                }
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        metrics::counter!("hybrid.infra.forecast.errors_total", "kind" => last_error_kind)
            .increment(1);
        metrics::histogram!(
            "hybrid.infra.forecast.call_ms",
            "model" => "remote",
            "result" => "err"
        )
        .record(duration_ms as f64);
        let error =
            last_error.unwrap_or_else(|| "forecast request failed after retries".to_string());
        tracing::warn!(attempts, status = ?last_status, error = %error, "forecast request failed");

        (
            Err(error.clone()),
            ForecastCallInfo {
                attempts,
                duration_ms,
                status: last_status,
                error: Some(error),
            },
        )
    }
}

impl ForecastModel for RemoteForecastClient {
    fn predict_next(&self, ticker: &Ticker, history: &PriceSeries) -> Result<f64, String> {
        self.predict_detailed(ticker.as_str(), history).0
    }

    fn name(&self) -> &'static str {
        "remote"
    }
}
