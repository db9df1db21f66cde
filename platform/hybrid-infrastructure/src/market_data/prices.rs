use chrono::NaiveDate;
use hybrid_domain::entities::price_series::PriceSeries;
use hybrid_domain::repositories::prices::{PriceHistoryRepository, PriceTableRepository};
use hybrid_domain::services::price_table::PriceTable;
use hybrid_domain::services::quality::PriceQualityReport;
use hybrid_domain::value_objects::period::Period;
use hybrid_domain::value_objects::price_point::PricePoint;
use hybrid_domain::value_objects::ticker::Ticker;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Debug, Deserialize)]
pub struct CloseRecord {
    pub date: String,
    pub close: f64,
}

/// Reads a `date,close` file. Rows with a non-positive close are skipped,
/// duplicate dates keep the last row, and out-of-order rows are sorted; each
/// of these is counted in the report.
pub fn load_csv(path: &Path) -> Result<(PriceSeries, PriceQualityReport), String> {
    let file = File::open(path)
        .map_err(|err| format!("failed to open prices CSV {}: {}", path.display(), err))?;
    let mut reader = csv::Reader::from_reader(file);

    let mut by_date: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    let mut report = PriceQualityReport::default();
    let mut last_seen: Option<NaiveDate> = None;

    for result in reader.deserialize::<CloseRecord>() {
        let record = result.map_err(|err| {
            format!("failed to parse prices CSV row in {}: {}", path.display(), err)
        })?;
        report.rows += 1;
        let date = parse_date(&record.date)?;

        if !record.close.is_finite() || record.close <= 0.0 {
            report.invalid_close += 1;
            if report.first_invalid_close.is_none() {
                report.first_invalid_close = Some(date);
            }
            continue;
        }

        if let Some(prev) = last_seen {
            if date < prev {
                report.out_of_order += 1;
            }
        }
        last_seen = Some(date);

        if by_date.insert(date, record.close).is_some() {
            report.duplicates += 1;
            if report.first_duplicate.is_none() {
                report.first_duplicate = Some(date);
            }
        }
    }

    report.first_date = by_date.keys().next().copied();
    report.last_date = by_date.keys().next_back().copied();
    let points = by_date
        .into_iter()
        .map(|(date, close)| PricePoint::new(date, close))
        .collect();
    let series = PriceSeries::new(points).map_err(|err| err.to_string())?;
    Ok((series, report))
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    let trimmed = value.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    // Exports sometimes carry a time component; only the calendar day matters.
    if let Some((day, _)) = trimmed.split_once(['T', ' ']) {
        if let Ok(date) = NaiveDate::parse_from_str(day, "%Y-%m-%d") {
            return Ok(date);
        }
    }
    Err(format!("unsupported date format: {value}"))
}

/// One `<TICKER>.csv` per instrument under `dir`.
#[derive(Debug, Clone)]
pub struct CsvPriceStore {
    dir: PathBuf,
}

impl CsvPriceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path_for(&self, symbol: &str) -> PathBuf {
        self.dir.join(format!("{symbol}.csv"))
    }

    fn load(&self, symbol: &str) -> Result<(PriceSeries, PriceQualityReport), String> {
        let start = Instant::now();
        let loaded = load_csv(&self.path_for(symbol));
        metrics::histogram!("hybrid.infra.prices.load_ms")
            .record(start.elapsed().as_millis() as f64);
        match &loaded {
            Ok((_, report)) if !report.is_clean() => {
                tracing::warn!(
                    symbol,
                    duplicates = report.duplicates,
                    out_of_order = report.out_of_order,
                    invalid_close = report.invalid_close,
                    "price file has data-quality issues"
                );
            }
            Ok(_) => {}
            Err(_) => {
                metrics::counter!("hybrid.infra.prices.errors_total").increment(1);
            }
        }
        loaded
    }
}

/// Start of a trailing `window` that ends on `last`.
fn window_start(last: NaiveDate, window: &Period) -> NaiveDate {
    last - window.as_duration()
}

impl PriceHistoryRepository for CsvPriceStore {
    fn history(
        &self,
        ticker: &Ticker,
        window: &Period,
    ) -> Result<(PriceSeries, PriceQualityReport), String> {
        let _span = tracing::debug_span!("infra.prices.history", ticker = %ticker).entered();
        let (series, report) = self.load(ticker.as_str())?;
        let trimmed = match series.last() {
            Some(last) => series.since(window_start(last.date, window)),
            None => series,
        };
        Ok((trimmed, report))
    }
}

impl PriceTableRepository for CsvPriceStore {
    fn price_table(&self, symbols: &[String], window: &Period) -> Result<PriceTable, String> {
        let _span = tracing::info_span!(
            "infra.prices.table",
            dir = %self.dir.display(),
            symbols = symbols.len(),
            window = %window
        )
        .entered();

        let mut loaded = Vec::with_capacity(symbols.len());
        for symbol in symbols {
            let path = self.path_for(symbol);
            if !path.exists() {
                tracing::info!(symbol = %symbol, "no price file; instrument left out");
                continue;
            }
            let (series, _report) = self.load(symbol)?;
            loaded.push((symbol.clone(), series));
        }

        let Some(last) = loaded
            .iter()
            .filter_map(|(_, s)| s.last().map(|p| p.date))
            .max()
        else {
            return PriceTable::from_series(Vec::new()).map_err(|err| err.to_string());
        };
        let start = window_start(last, window);
        let trimmed = loaded
            .into_iter()
            .map(|(symbol, series)| (symbol, series.since(start)))
            .collect();
        PriceTable::from_series(trimmed).map_err(|err| err.to_string())
    }
}
