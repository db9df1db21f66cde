use crate::entities::sentiment::{Headline, SentimentResult};
use crate::value_objects::period::Period;
use crate::value_objects::sentiment_label::SentimentLabel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SentimentPolicy {
    pub window: Period,
    pub max_headlines: usize,
    /// Mean polarity beyond which the label leaves `Neutral`.
    pub label_threshold: f64,
}

impl Default for SentimentPolicy {
    fn default() -> Self {
        Self {
            window: Period::days(2),
            max_headlines: 5,
            label_threshold: 0.1,
        }
    }
}

/// Reduces scored headlines to a single sentiment reading: the mean polarity
/// of the most recent headlines inside the recency window.
pub fn summarize_headlines(
    headlines: Vec<Headline>,
    now: DateTime<Utc>,
    policy: &SentimentPolicy,
) -> SentimentResult {
    let since = now - policy.window.as_duration();
    let mut recent: Vec<Headline> = headlines
        .into_iter()
        .filter(|h| h.published >= since && h.polarity.is_finite())
        .collect();
    recent.sort_by(|a, b| b.published.cmp(&a.published));
    recent.truncate(policy.max_headlines);

    if recent.is_empty() {
        return SentimentResult::no_news();
    }

    for headline in &mut recent {
        headline.polarity = headline.polarity.clamp(-1.0, 1.0);
    }
    let score = recent.iter().map(|h| h.polarity).sum::<f64>() / recent.len() as f64;
    let label = if score > policy.label_threshold {
        SentimentLabel::Positive
    } else if score < -policy.label_threshold {
        SentimentLabel::Negative
    } else {
        SentimentLabel::Neutral
    };

    SentimentResult {
        score,
        label,
        headlines: recent,
    }
}
