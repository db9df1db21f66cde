use chrono::{Duration, NaiveDate, TimeZone, Utc};
use hybrid_application::allocation::{build_plan_detailed, PlanPolicies};
use hybrid_application::recommendation::{recommend, RecommendPolicies};
use hybrid_domain::services::forecast::DriftForecaster;
use hybrid_domain::value_objects::call::Call;
use hybrid_domain::value_objects::period::Period;
use hybrid_domain::value_objects::sentiment_label::SentimentLabel;
use hybrid_domain::value_objects::ticker::Ticker;
use hybrid_infrastructure::forecast::LocalForecastRepository;
use hybrid_infrastructure::headlines::HeadlineFileStore;
use hybrid_infrastructure::market_data::CsvPriceStore;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn unique_tmp_dir(name: &str) -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let dir = std::env::temp_dir().join(format!("hybrid_{name}_{}_{}", std::process::id(), now));
    fs::create_dir_all(&dir).expect("mkdir");
    dir
}

fn write_prices(dir: &PathBuf, symbol: &str, drift: f64, phase: f64, days: i64) {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
    let mut body = String::from("date,close\n");
    for t in 0..days {
        let x = t as f64;
        let close = 2_000.0 * (1.0 + drift * x) * (1.0 + 0.015 * (x * 0.9 + phase).sin());
        body.push_str(&format!("{},{close:.2}\n", start + Duration::days(t)));
    }
    fs::write(dir.join(format!("{symbol}.csv")), body).expect("write prices");
}

#[test]
fn plan_from_csv_files() {
    let dir = unique_tmp_dir("pipeline_plan");
    let symbols = ["BBCA.JK", "BBRI.JK", "TLKM.JK", "ASII.JK", "UNVR.JK"];
    for (i, symbol) in symbols.iter().enumerate() {
        write_prices(&dir, symbol, 0.001 * (i as f64 + 1.0), i as f64, 200);
    }
    let store = CsvPriceStore::new(&dir);
    let mut universe: Vec<String> = symbols.iter().map(|s| s.to_string()).collect();
    universe.push("GONE.JK".to_string());

    let report = build_plan_detailed(
        25_000_000.0,
        &store,
        &universe,
        &Period::parse("6mo").unwrap(),
        &PlanPolicies::default(),
    )
    .expect("plan");

    assert_eq!(report.plan.entries.len(), 4);
    assert!(report.return_rows > 100 && report.return_rows <= 180);
    assert!(report.plan.residual >= 0.0);
    assert!(report.plan.entries.iter().all(|e| e.symbol != "GONE.JK"));
    let _ = fs::remove_dir_all(dir);
}

#[test]
fn recommendation_from_csv_files() {
    let dir = unique_tmp_dir("pipeline_signal");
    write_prices(&dir, "BBRI.JK", 0.01, 0.0, 60);
    let headlines = dir.join("headlines.csv");
    fs::write(
        &headlines,
        "keyword,title,link,published,polarity\n\
Bank BRI Indonesia stock,BRI profit jumps,https://n.example/1,2024-06-03T07:00:00Z,0.7\n\
Bank BRI Indonesia stock,BRI expands lending,https://n.example/2,2024-06-02T12:00:00Z,0.3\n",
    )
    .expect("write headlines");

    let forecasts = LocalForecastRepository::new(
        CsvPriceStore::new(&dir),
        Box::new(DriftForecaster::default()),
        Period::parse("1y").unwrap(),
    );
    let news = HeadlineFileStore::new(&headlines);
    let now = Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap();

    let rec = recommend(
        &Ticker::parse("BBRI.JK").unwrap(),
        "Bank BRI Indonesia stock",
        &forecasts,
        &news,
        &RecommendPolicies::default(),
        now,
    )
    .expect("recommendation");

    assert_eq!(rec.sentiment.label, SentimentLabel::Positive);
    assert_eq!(rec.sentiment.headlines.len(), 2);
    assert!(rec.forecast.predicted_price.is_finite());
    assert!(Call::ALL.contains(&rec.signal.call));
    let _ = fs::remove_dir_all(dir);
}
