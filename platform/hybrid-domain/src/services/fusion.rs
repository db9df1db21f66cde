use crate::entities::signal::Signal;
use crate::errors::CoreError;
use crate::value_objects::call::{Call, SentimentBucket, TechnicalDirection};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FusionPolicy {
    /// Relative forecast move needed before the forecast counts as directional.
    pub technical_threshold: f64,
    /// Sentiment inside `±sentiment_deadband` counts as no opinion.
    pub sentiment_deadband: f64,
    /// A flat forecast with `|sentiment|` above this is flagged for the watchlist.
    pub watchlist_threshold: f64,
}

impl Default for FusionPolicy {
    fn default() -> Self {
        Self {
            technical_threshold: 0.005,
            sentiment_deadband: 0.05,
            watchlist_threshold: 0.15,
        }
    }
}

impl FusionPolicy {
    pub fn technical_direction(&self, diff: f64) -> TechnicalDirection {
        if diff > self.technical_threshold {
            TechnicalDirection::Buy
        } else if diff < -self.technical_threshold {
            TechnicalDirection::Sell
        } else {
            TechnicalDirection::Hold
        }
    }

    pub fn sentiment_bucket(&self, sentiment: f64) -> SentimentBucket {
        if sentiment > self.sentiment_deadband {
            SentimentBucket::Positive
        } else if sentiment < -self.sentiment_deadband {
            SentimentBucket::Negative
        } else {
            SentimentBucket::Neutral
        }
    }

    pub fn fuse(&self, current: f64, predicted: f64, sentiment: f64) -> Result<Signal, CoreError> {
        if !current.is_finite() || current <= 0.0 {
            return Err(CoreError::invalid(format!(
                "current price must be finite and > 0, got {current}"
            )));
        }
        if !predicted.is_finite() {
            return Err(CoreError::invalid(format!(
                "predicted price must be finite, got {predicted}"
            )));
        }
        if !sentiment.is_finite() || !(-1.0..=1.0).contains(&sentiment) {
            return Err(CoreError::invalid(format!(
                "sentiment must lie in [-1, 1], got {sentiment}"
            )));
        }

        let diff = (predicted - current) / current;
        let technical = self.technical_direction(diff);
        let bucket = self.sentiment_bucket(sentiment);

        let (call, reason) = match (technical, bucket) {
            (TechnicalDirection::Buy, SentimentBucket::Positive) => {
                (Call::StrongBuy, "Tech Up + News Good")
            }
            (TechnicalDirection::Buy, SentimentBucket::Negative) => {
                (Call::WeakBuy, "Tech Up but News Bad")
            }
            (TechnicalDirection::Buy, SentimentBucket::Neutral) => {
                (Call::Buy, "Technical Breakout")
            }
            (TechnicalDirection::Sell, SentimentBucket::Positive) => {
                (Call::Wait, "Tech Down but News Good")
            }
            (TechnicalDirection::Sell, SentimentBucket::Negative) => {
                (Call::StrongSell, "Tech Down + News Bad")
            }
            (TechnicalDirection::Sell, SentimentBucket::Neutral) => {
                (Call::Sell, "Technical Correction")
            }
            (TechnicalDirection::Hold, _) if sentiment.abs() > self.watchlist_threshold => {
                (Call::Watchlist, "High Volatility News")
            }
            (TechnicalDirection::Hold, _) => (Call::Hold, "Wait & See"),
        };

        Ok(Signal {
            call,
            technical,
            sentiment_bucket: bucket,
            change_pct: diff * 100.0,
            reason,
        })
    }
}

/// Fusion with the default thresholds.
pub fn fuse(current: f64, predicted: f64, sentiment: f64) -> Result<Signal, CoreError> {
    FusionPolicy::default().fuse(current, predicted, sentiment)
}
