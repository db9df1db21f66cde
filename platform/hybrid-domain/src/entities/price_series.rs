use crate::errors::CoreError;
use crate::value_objects::price_point::PricePoint;
use chrono::NaiveDate;
use serde::Serialize;

/// Daily closes in strictly ascending date order with finite, positive prices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    pub fn new(points: Vec<PricePoint>) -> Result<Self, CoreError> {
        for pair in points.windows(2) {
            if pair[1].date <= pair[0].date {
                return Err(CoreError::invalid(format!(
                    "price series not strictly ascending at {}",
                    pair[1].date
                )));
            }
        }
        if let Some(bad) = points
            .iter()
            .find(|p| !p.close.is_finite() || p.close <= 0.0)
        {
            return Err(CoreError::invalid(format!(
                "non-positive close {} on {}",
                bad.close, bad.date
            )));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    pub fn closes(&self) -> impl Iterator<Item = f64> + '_ {
        self.points.iter().map(|p| p.close)
    }

    /// Day-over-day fractional changes, one shorter than the series.
    pub fn daily_returns(&self) -> Vec<f64> {
        self.points
            .windows(2)
            .map(|pair| pair[1].close / pair[0].close - 1.0)
            .collect()
    }

    /// Keeps only points dated on or after `start`.
    pub fn since(&self, start: NaiveDate) -> Self {
        Self {
            points: self
                .points
                .iter()
                .copied()
                .filter(|p| p.date >= start)
                .collect(),
        }
    }

    /// Last `n` points (or everything when shorter).
    pub fn tail(&self, n: usize) -> &[PricePoint] {
        let start = self.points.len().saturating_sub(n);
        &self.points[start..]
    }
}
