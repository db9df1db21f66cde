use crate::entities::screening::{RankedCandidate, Screening};
use crate::errors::CoreError;
use crate::services::price_table::ReturnTable;
use crate::services::stats;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenPolicy {
    /// How many instruments the screener hands to the optimizer.
    pub select: usize,
}

impl Default for ScreenPolicy {
    fn default() -> Self {
        Self { select: 4 }
    }
}

/// Dispersion below this is rounding noise from a constant series.
const MIN_STD: f64 = 1e-12;

/// `mean / sample std` of a return series; `None` when it cannot be computed
/// (fewer than two observations, zero or non-finite dispersion).
pub fn risk_adjusted_score(returns: &[f64]) -> Option<f64> {
    let mean = stats::mean(returns)?;
    let std = stats::sample_std(returns)?;
    if !std.is_finite() || std <= MIN_STD {
        return None;
    }
    let score = mean / std;
    score.is_finite().then_some(score)
}

/// Ranks every column of `returns` by [`risk_adjusted_score`] and keeps the
/// best `policy.select`. Equal scores keep the table's column order.
pub fn screen(returns: &ReturnTable, policy: &ScreenPolicy) -> Result<Screening, CoreError> {
    if policy.select == 0 {
        return Err(CoreError::invalid("screen size must be at least 1"));
    }

    let mut ranked = Vec::with_capacity(returns.columns().len());
    let mut dropped = Vec::new();
    for (symbol, values) in returns.columns() {
        match risk_adjusted_score(values) {
            Some(score) => ranked.push(RankedCandidate {
                symbol: symbol.clone(),
                risk_adjusted_score: score,
            }),
            None => dropped.push(symbol.clone()),
        }
    }

    if ranked.len() < policy.select {
        return Err(CoreError::insufficient(
            "instruments with a computable risk-adjusted score",
            policy.select,
            ranked.len(),
        ));
    }

    // `sort_by` is stable, which keeps universe order for ties.
    ranked.sort_by(|a, b| b.risk_adjusted_score.total_cmp(&a.risk_adjusted_score));
    ranked.truncate(policy.select);

    Ok(Screening {
        selected: ranked,
        dropped,
    })
}

#[cfg(test)]
mod tests {
    use super::{risk_adjusted_score, screen, ScreenPolicy};
    use crate::errors::ErrorKind;
    use crate::services::price_table::ReturnTable;
    use chrono::NaiveDate;

    fn table(columns: Vec<(&str, Vec<f64>)>) -> ReturnTable {
        let rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        let dates = (0..rows)
            .map(|i| NaiveDate::from_ymd_opt(2024, 1, 1).unwrap() + chrono::Duration::days(i as i64))
            .collect();
        ReturnTable::new(
            dates,
            columns
                .into_iter()
                .map(|(s, v)| (s.to_string(), v))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn score_is_undefined_for_flat_or_short_series() {
        assert_eq!(risk_adjusted_score(&[]), None);
        assert_eq!(risk_adjusted_score(&[0.01]), None);
        assert_eq!(risk_adjusted_score(&[0.01, 0.01, 0.01]), None);
        assert!(risk_adjusted_score(&[0.01, 0.02]).is_some());
    }

    #[test]
    fn selects_top_scores_in_descending_order() {
        let returns = table(vec![
            ("LOW", vec![0.00, 0.01, -0.01, 0.00]),
            ("HIGH", vec![0.02, 0.03, 0.02, 0.03]),
            ("MID", vec![0.01, 0.02, 0.00, 0.01]),
            ("NEG", vec![-0.02, -0.01, -0.03, -0.02]),
            ("FLAT", vec![0.01, 0.01, 0.01, 0.01]),
        ]);
        let screening = screen(&returns, &ScreenPolicy { select: 3 }).unwrap();
        assert_eq!(screening.symbols(), vec!["HIGH", "MID", "LOW"]);
        assert_eq!(screening.dropped, vec!["FLAT".to_string()]);
        let scores: Vec<f64> = screening
            .selected
            .iter()
            .map(|c| c.risk_adjusted_score)
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn ties_keep_universe_order() {
        let same = vec![0.01, 0.02, 0.00, 0.01];
        let returns = table(vec![
            ("B", same.clone()),
            ("A", same.clone()),
            ("C", same),
        ]);
        let screening = screen(&returns, &ScreenPolicy { select: 2 }).unwrap();
        assert_eq!(screening.symbols(), vec!["B", "A"]);
    }

    #[test]
    fn fails_when_too_few_rankable_instruments() {
        let returns = table(vec![
            ("A", vec![0.01, 0.02, 0.00]),
            ("B", vec![0.02, 0.01, 0.03]),
            ("C", vec![0.01, 0.03, 0.02]),
            ("FLAT", vec![0.0, 0.0, 0.0]),
        ]);
        let err = screen(&returns, &ScreenPolicy::default()).expect_err("only 3 rankable");
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }

    #[test]
    fn empty_table_is_insufficient() {
        let err = screen(&ReturnTable::default(), &ScreenPolicy::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InsufficientData);
    }
}
