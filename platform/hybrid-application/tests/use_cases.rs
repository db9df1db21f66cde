use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use hybrid_application::allocation::{build_plan, build_plan_detailed, PlanPolicies};
use hybrid_application::cache::{CachedPlanner, CachedRecommender};
use hybrid_application::config::{default_assets, Config};
use hybrid_application::daily::{daily_snapshot, write_daily};
use hybrid_application::recommendation::{recommend, RecommendPolicies};
use hybrid_application::reporting::write_plan_artifacts;
use hybrid_application::validation::validate;
use hybrid_domain::entities::allocation::AllocationPlan;
use hybrid_domain::entities::forecast::Forecast;
use hybrid_domain::entities::price_series::PriceSeries;
use hybrid_domain::entities::sentiment::Headline;
use hybrid_domain::errors::ErrorKind;
use hybrid_domain::repositories::artifacts::ArtifactWriter;
use hybrid_domain::repositories::forecast::ForecastRepository;
use hybrid_domain::repositories::headlines::HeadlineRepository;
use hybrid_domain::repositories::prices::{PriceHistoryRepository, PriceTableRepository};
use hybrid_domain::services::optimizer::FallbackPolicy;
use hybrid_domain::services::price_table::PriceTable;
use hybrid_domain::services::quality::PriceQualityReport;
use hybrid_domain::value_objects::call::Call;
use hybrid_domain::value_objects::period::Period;
use hybrid_domain::value_objects::price_point::PricePoint;
use hybrid_domain::value_objects::sentiment_label::SentimentLabel;
use hybrid_domain::value_objects::ticker::Ticker;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
}

fn series(closes: &[f64]) -> PriceSeries {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    PriceSeries::new(
        closes
            .iter()
            .enumerate()
            .map(|(i, c)| PricePoint::new(start + Duration::days(i as i64), *c))
            .collect(),
    )
    .unwrap()
}

/// Wavy upward path; `drift` sets the trend, `phase` decorrelates symbols.
fn path(drift: f64, phase: f64, len: usize) -> Vec<f64> {
    (0..len)
        .map(|t| {
            let t = t as f64;
            1_000.0 * (1.0 + drift * t) * (1.0 + 0.02 * (t * 0.7 + phase).sin())
        })
        .collect()
}

#[derive(Default)]
struct FakeForecasts {
    forecasts: HashMap<String, Forecast>,
    calls: Cell<usize>,
}

impl FakeForecasts {
    fn with(mut self, ticker: &str, current: f64, predicted: f64) -> Self {
        self.forecasts.insert(
            ticker.to_string(),
            Forecast {
                history: series(&[current * 0.99, current]),
                current_price: current,
                predicted_price: predicted,
            },
        );
        self
    }
}

impl ForecastRepository for FakeForecasts {
    fn forecast(&self, ticker: &Ticker) -> Result<Forecast, String> {
        self.calls.set(self.calls.get() + 1);
        self.forecasts
            .get(ticker.as_str())
            .cloned()
            .ok_or_else(|| format!("no price history for {ticker}"))
    }
}

struct FakeHeadlines {
    result: Result<Vec<Headline>, String>,
    seen_since: RefCell<Vec<DateTime<Utc>>>,
}

impl FakeHeadlines {
    fn polarities(values: &[f64]) -> Self {
        let headlines = values
            .iter()
            .enumerate()
            .map(|(i, p)| Headline {
                title: format!("story {i}"),
                link: format!("https://news.example/{i}"),
                published: now() - Duration::hours(i as i64 + 1),
                polarity: *p,
            })
            .collect();
        Self {
            result: Ok(headlines),
            seen_since: RefCell::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            result: Err("feed unreachable".to_string()),
            seen_since: RefCell::new(Vec::new()),
        }
    }
}

impl HeadlineRepository for FakeHeadlines {
    fn headlines(&self, _keyword: &str, since: DateTime<Utc>) -> Result<Vec<Headline>, String> {
        self.seen_since.borrow_mut().push(since);
        self.result.clone()
    }
}

struct FakePrices {
    series: Vec<(String, PriceSeries)>,
    loads: Cell<usize>,
}

impl FakePrices {
    fn new(series: Vec<(&str, Vec<f64>)>) -> Self {
        Self {
            series: series
                .into_iter()
                .map(|(s, closes)| (s.to_string(), self::series(&closes)))
                .collect(),
            loads: Cell::new(0),
        }
    }

    fn universe(&self) -> Vec<String> {
        self.series.iter().map(|(s, _)| s.clone()).collect()
    }
}

impl PriceTableRepository for FakePrices {
    fn price_table(&self, symbols: &[String], _window: &Period) -> Result<PriceTable, String> {
        self.loads.set(self.loads.get() + 1);
        let wanted = self
            .series
            .iter()
            .filter(|(s, _)| symbols.contains(s))
            .cloned()
            .collect();
        PriceTable::from_series(wanted).map_err(|err| err.to_string())
    }
}

impl PriceHistoryRepository for FakePrices {
    fn history(
        &self,
        ticker: &Ticker,
        _window: &Period,
    ) -> Result<(PriceSeries, PriceQualityReport), String> {
        self.series
            .iter()
            .find(|(s, _)| s == ticker.as_str())
            .map(|(_, s)| {
                (
                    s.clone(),
                    PriceQualityReport {
                        rows: s.len(),
                        ..PriceQualityReport::default()
                    },
                )
            })
            .ok_or_else(|| format!("no price file for {ticker}"))
    }
}

#[derive(Default)]
struct RecordingWriter {
    ensured_dirs: RefCell<Vec<PathBuf>>,
    plans: RefCell<Vec<(PathBuf, usize)>>,
    json: RefCell<Vec<(PathBuf, serde_json::Value)>>,
}

impl ArtifactWriter for RecordingWriter {
    fn ensure_dir(&self, path: &Path) -> Result<(), String> {
        self.ensured_dirs.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn write_plan_csv(&self, path: &Path, plan: &AllocationPlan) -> Result<(), String> {
        self.plans
            .borrow_mut()
            .push((path.to_path_buf(), plan.entries.len()));
        Ok(())
    }

    fn write_json(&self, path: &Path, value: &serde_json::Value) -> Result<(), String> {
        self.json
            .borrow_mut()
            .push((path.to_path_buf(), value.clone()));
        Ok(())
    }
}

fn universe_prices() -> FakePrices {
    FakePrices::new(vec![
        ("AAAA.JK", path(0.004, 0.0, 120)),
        ("BBBB.JK", path(0.002, 1.0, 120)),
        ("CCCC.JK", path(0.001, 2.0, 120)),
        ("DDDD.JK", path(0.0005, 3.0, 120)),
        ("EEEE.JK", path(-0.001, 4.0, 120)),
        ("FLAT.JK", vec![500.0; 120]),
    ])
}

fn window() -> Period {
    Period::parse("6mo").unwrap()
}

#[test]
fn recommend_fuses_forecast_and_news() {
    let forecasts = FakeForecasts::default().with("BBRI.JK", 1_000.0, 1_006.0);
    let headlines = FakeHeadlines::polarities(&[0.4, 0.2]);
    let ticker = Ticker::parse("BBRI.JK").unwrap();

    let rec = recommend(
        &ticker,
        "Bank BRI Indonesia stock",
        &forecasts,
        &headlines,
        &RecommendPolicies::default(),
        now(),
    )
    .expect("recommendation");

    assert_eq!(rec.signal.call, Call::StrongBuy);
    assert_eq!(rec.signal.reason, "Tech Up + News Good");
    assert_eq!(rec.signal.change_label(), "0.60%");
    assert_eq!(rec.sentiment.label, SentimentLabel::Positive);
    assert!((rec.sentiment.score - 0.3).abs() < 1e-12);
    assert_eq!(headlines.seen_since.borrow()[0], now() - Duration::days(2));

    let summary = rec.summary_json();
    assert_eq!(summary["signal"], "STRONG_BUY");
    assert_eq!(summary["ticker"], "BBRI.JK");
}

#[test]
fn headline_failure_degrades_to_error_sentiment() {
    let forecasts = FakeForecasts::default().with("TLKM.JK", 1_000.0, 990.0);
    let ticker = Ticker::parse("TLKM.JK").unwrap();

    let rec = recommend(
        &ticker,
        "Telkom Indonesia stock",
        &forecasts,
        &FakeHeadlines::failing(),
        &RecommendPolicies::default(),
        now(),
    )
    .expect("forecast still usable");

    assert_eq!(rec.sentiment.label, SentimentLabel::Error);
    assert_eq!(rec.sentiment.score, 0.0);
    assert_eq!(rec.signal.call, Call::Sell);
}

#[test]
fn missing_forecast_is_not_found() {
    let ticker = Ticker::parse("ZZZZ.JK").unwrap();
    let err = recommend(
        &ticker,
        "nothing",
        &FakeForecasts::default(),
        &FakeHeadlines::polarities(&[]),
        &RecommendPolicies::default(),
        now(),
    )
    .expect_err("unknown ticker");
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn plan_selects_best_and_respects_budget() {
    let prices = universe_prices();
    let report = build_plan_detailed(
        10_000_000.0,
        &prices,
        &prices.universe(),
        &window(),
        &PlanPolicies::default(),
    )
    .expect("plan");

    let plan = &report.plan;
    assert_eq!(plan.entries.len(), 4);
    assert_eq!(report.screening.dropped, vec!["FLAT.JK".to_string()]);
    assert!(plan.entries.iter().all(|e| e.symbol != "FLAT.JK"));
    assert!(plan.entries.iter().all(|e| e.executed_value <= e.allocated_amount));
    assert!(plan.total_executed <= plan.budget);
    assert!((plan.budget - plan.total_executed - plan.residual).abs() < 1e-6);
    let weights: f64 = plan.entries.iter().map(|e| e.weight).sum();
    assert!((weights - 1.0).abs() < 1e-6);
    for entry in &plan.entries {
        assert!(entry.weight >= 0.05 - 1e-9 && entry.weight <= 0.5 + 1e-9);
        assert_eq!(entry.executed_value, entry.lots as f64 * (entry.price * 100.0));
    }
}

#[test]
fn plan_rejects_bad_amount_and_empty_data() {
    let prices = universe_prices();
    let err = build_plan(-5.0, &prices, &prices.universe(), &window(), &PlanPolicies::default())
        .expect_err("negative amount");
    assert_eq!(err.kind(), ErrorKind::InvalidInput);

    let empty = FakePrices::new(Vec::new());
    let err = build_plan(
        1_000_000.0,
        &empty,
        &["AAAA.JK".to_string()],
        &window(),
        &PlanPolicies::default(),
    )
    .expect_err("no data");
    assert_eq!(err.kind(), ErrorKind::InsufficientData);
}

#[test]
fn plan_with_too_few_rankable_instruments_is_insufficient() {
    let prices = FakePrices::new(vec![
        ("AAAA.JK", path(0.004, 0.0, 60)),
        ("BBBB.JK", path(0.002, 1.0, 60)),
        ("FLAT.JK", vec![500.0; 60]),
    ]);
    let err = build_plan(
        1_000_000.0,
        &prices,
        &prices.universe(),
        &window(),
        &PlanPolicies::default(),
    )
    .expect_err("needs four");
    assert_eq!(err.kind(), ErrorKind::InsufficientData);
}

#[test]
fn fail_fast_optimizer_surfaces_fallback() {
    let prices = universe_prices();
    let mut policies = PlanPolicies::default();
    policies.optimizer.max_iterations = 0;
    policies.optimizer.on_failure = FallbackPolicy::Error;
    let err = build_plan(5_000_000.0, &prices, &prices.universe(), &window(), &policies)
        .expect_err("no iterations allowed");
    assert_eq!(err.kind(), ErrorKind::OptimizationFallback);

    policies.optimizer.on_failure = FallbackPolicy::EqualWeight;
    let plan = build_plan(5_000_000.0, &prices, &prices.universe(), &window(), &policies)
        .expect("equal weight fallback");
    assert!(!plan.is_optimized());
    assert!(plan.entries.iter().all(|e| (e.weight - 0.25).abs() < 1e-12));
}

#[test]
fn plan_artifacts_are_written() {
    let prices = universe_prices();
    let report = build_plan_detailed(
        2_000_000.0,
        &prices,
        &prices.universe(),
        &window(),
        &PlanPolicies::default(),
    )
    .expect("plan");
    let writer = RecordingWriter::default();
    let out = PathBuf::from("out/plan");
    let written = write_plan_artifacts(&report, &out, &writer).expect("write");

    assert_eq!(written, vec![out.join("plan.csv"), out.join("plan.json")]);
    assert_eq!(writer.ensured_dirs.borrow().as_slice(), &[out.clone()]);
    assert_eq!(writer.plans.borrow()[0].1, 4);
    let json = writer.json.borrow();
    assert_eq!(json[0].1["entries"].as_array().map(|a| a.len()), Some(4));
    assert_eq!(json[0].1["window"], "6mo");
}

#[test]
fn cached_planner_reuses_results_until_cleared() {
    let prices = universe_prices();
    let mut planner = CachedPlanner::new(
        &prices,
        prices.universe(),
        window(),
        PlanPolicies::default(),
        std::time::Duration::from_secs(3_600),
    );

    let first = planner.plan(10_000_000.0).expect("plan");
    let second = planner.plan(10_000_000.0).expect("cached");
    assert_eq!(first, second);
    assert_eq!(prices.loads.get(), 1);

    planner.plan(20_000_000.0).expect("other amount");
    assert_eq!(prices.loads.get(), 2);

    assert!(planner.plan(f64::NAN).is_err());
    planner.clear();
    planner.plan(10_000_000.0).expect("recomputed");
    assert_eq!(prices.loads.get(), 3);
}

#[test]
fn cached_recommender_does_not_cache_failures() {
    let forecasts = FakeForecasts::default().with("BBRI.JK", 1_000.0, 1_000.0);
    let headlines = FakeHeadlines::polarities(&[0.5]);
    let mut recommender = CachedRecommender::new(
        &forecasts,
        &headlines,
        RecommendPolicies::default(),
        std::time::Duration::from_secs(3_600),
    );
    let bbri = Ticker::parse("BBRI.JK").unwrap();
    let missing = Ticker::parse("NONE.JK").unwrap();

    let rec = recommender.recommend(&bbri, "bri", now()).expect("rec");
    assert_eq!(rec.signal.call, Call::Watchlist);
    recommender.recommend(&bbri, "bri", now()).expect("cached");
    assert_eq!(forecasts.calls.get(), 1);

    assert!(recommender.recommend(&missing, "none", now()).is_err());
    assert!(recommender.recommend(&missing, "none", now()).is_err());
    assert_eq!(forecasts.calls.get(), 3);
}

#[test]
fn daily_snapshot_keeps_going_past_failures() {
    let forecasts = FakeForecasts::default()
        .with("USDIDR=X", 16_000.0, 16_200.0)
        .with("BBRI.JK", 4_500.0, 4_400.0)
        .with("TLKM.JK", 3_000.0, 3_001.0);
    let headlines = FakeHeadlines::polarities(&[-0.3]);

    let snapshot = daily_snapshot(
        &default_assets(),
        &forecasts,
        &headlines,
        &RecommendPolicies::default(),
        now(),
    );
    assert_eq!(snapshot.entries.len(), 4);
    assert_eq!(snapshot.failures(), 1);
    let jpy = snapshot
        .entries
        .iter()
        .find(|e| e.name == "JPY")
        .expect("jpy entry");
    assert_eq!(jpy.error.as_ref().map(|e| e.kind), Some(ErrorKind::NotFound));

    let usd = &snapshot.entries[0];
    let rec = usd.recommendation.as_ref().expect("usd recommendation");
    assert_eq!(rec["signal"], "WEAK_BUY");

    let writer = RecordingWriter::default();
    let path = write_daily(&snapshot, Path::new("out"), &writer).expect("write");
    assert_eq!(path, Path::new("out").join("daily.json"));
    assert_eq!(writer.json.borrow()[0].1["entries"].as_array().map(|a| a.len()), Some(4));
}

#[test]
fn validation_reports_missing_history() {
    let prices = FakePrices::new(vec![
        ("BBRI.JK", path(0.001, 0.0, 30)),
        ("TLKM.JK", path(0.001, 1.0, 30)),
    ]);
    let mut config = Config::default();
    config.universe.symbols = vec![
        Ticker::parse("BBRI.JK").unwrap(),
        Ticker::parse("TLKM.JK").unwrap(),
    ];
    config.universe.select = 2;
    config.assets.retain(|a| a.kind == hybrid_application::config::AssetKind::Stock);

    let report = validate(&config, true, &prices);
    assert!(report.passed);
    assert_eq!(report.symbols.len(), 4);
    assert!(report.symbols.iter().any(|c| c.role == "catalog"));

    config.assets = default_assets();
    let report = validate(&config, false, &prices);
    assert!(!report.passed);
    let missing: Vec<&str> = report.failures().map(|c| c.ticker.as_str()).collect();
    assert_eq!(missing, vec!["USDIDR=X", "JPYIDR=X"]);
}
