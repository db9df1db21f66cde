use crate::value_objects::sentiment_label::SentimentLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A scored news headline. `polarity` is produced upstream and lies in [-1, 1].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Headline {
    pub title: String,
    pub link: String,
    pub published: DateTime<Utc>,
    pub polarity: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SentimentResult {
    pub score: f64,
    pub label: SentimentLabel,
    pub headlines: Vec<Headline>,
}

impl SentimentResult {
    pub fn no_news() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::NoNews,
            headlines: Vec::new(),
        }
    }

    /// Value used when the news source itself failed.
    pub fn error() -> Self {
        Self {
            score: 0.0,
            label: SentimentLabel::Error,
            headlines: Vec::new(),
        }
    }
}
