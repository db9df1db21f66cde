use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use hybrid_domain::entities::sentiment::Headline;
use hybrid_domain::repositories::headlines::HeadlineRepository;
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadlineFormat {
    Csv,
    Json,
}

impl HeadlineFormat {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or("")
            .to_lowercase();
        if ext == "json" {
            HeadlineFormat::Json
        } else {
            HeadlineFormat::Csv
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct HeadlineRecord {
    pub keyword: String,
    pub title: String,
    #[serde(default)]
    pub link: String,
    pub published: String,
    pub polarity: f64,
}

/// Pre-scored headlines kept in a CSV or JSON file, one row per
/// `(keyword, headline)`. The file is read on every lookup so an external
/// scraper can refresh it between calls.
#[derive(Debug, Clone)]
pub struct HeadlineFileStore {
    path: PathBuf,
    format: HeadlineFormat,
}

impl HeadlineFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let format = HeadlineFormat::from_path(&path);
        Self { path, format }
    }

    fn records(&self) -> Result<Vec<HeadlineRecord>, String> {
        let file = File::open(&self.path).map_err(|err| {
            format!("failed to open headlines {}: {}", self.path.display(), err)
        })?;
        match self.format {
            HeadlineFormat::Json => serde_json::from_reader(file).map_err(|err| {
                format!("failed to parse headlines JSON {}: {}", self.path.display(), err)
            }),
            HeadlineFormat::Csv => csv::Reader::from_reader(file)
                .deserialize::<HeadlineRecord>()
                .map(|row| row.map_err(|err| format!("failed to parse headlines CSV row: {err}")))
                .collect(),
        }
    }
}

impl HeadlineRepository for HeadlineFileStore {
    fn headlines(&self, keyword: &str, since: DateTime<Utc>) -> Result<Vec<Headline>, String> {
        let _span = tracing::debug_span!("infra.headlines", keyword = %keyword).entered();
        let wanted = keyword.trim();
        let mut out = Vec::new();
        let mut skipped = 0usize;
        for record in self.records()? {
            if !record.keyword.trim().eq_ignore_ascii_case(wanted) {
                continue;
            }
            let published = match parse_timestamp(&record.published) {
                Ok(ts) => ts,
                Err(err) => {
                    skipped += 1;
                    tracing::debug!(error = %err, title = %record.title, "headline skipped");
                    continue;
                }
            };
            if published < since {
                continue;
            }
            out.push(Headline {
                title: record.title,
                link: record.link,
                published,
                polarity: record.polarity,
            });
        }
        if skipped > 0 {
            metrics::counter!("hybrid.infra.headlines.skipped_total").increment(skipped as u64);
        }
        metrics::counter!("hybrid.infra.headlines.lookups_total").increment(1);
        Ok(out)
    }
}

/// Source used when no headline file is configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoHeadlines;

impl HeadlineRepository for NoHeadlines {
    fn headlines(&self, _keyword: &str, _since: DateTime<Utc>) -> Result<Vec<Headline>, String> {
        Ok(Vec::new())
    }
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    // RSS pubDate, e.g. "Mon, 03 Jun 2024 08:00:00 GMT".
    if let Ok(dt) = DateTime::parse_from_rfc2822(value) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(format!("unsupported timestamp format: {value}"))
}
