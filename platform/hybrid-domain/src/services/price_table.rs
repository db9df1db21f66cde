use crate::entities::price_series::PriceSeries;
use crate::errors::CoreError;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceColumn {
    pub symbol: String,
    pub closes: Vec<Option<f64>>,
}

/// Closes for several instruments on a shared, ascending date axis. A cell is
/// `None` when that instrument did not trade (or has no data) on that date.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PriceTable {
    dates: Vec<NaiveDate>,
    columns: Vec<PriceColumn>,
}

impl PriceTable {
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<PriceColumn>) -> Result<Self, CoreError> {
        for pair in dates.windows(2) {
            if pair[1] <= pair[0] {
                return Err(CoreError::invalid(format!(
                    "price table dates not strictly ascending at {}",
                    pair[1]
                )));
            }
        }
        let mut seen = BTreeSet::new();
        for column in &columns {
            if column.closes.len() != dates.len() {
                return Err(CoreError::invalid(format!(
                    "column {} has {} rows, expected {}",
                    column.symbol,
                    column.closes.len(),
                    dates.len()
                )));
            }
            if !seen.insert(column.symbol.as_str()) {
                return Err(CoreError::invalid(format!(
                    "duplicate column {}",
                    column.symbol
                )));
            }
            if let Some(bad) = column
                .closes
                .iter()
                .flatten()
                .find(|c| !c.is_finite() || **c <= 0.0)
            {
                return Err(CoreError::invalid(format!(
                    "non-positive price {bad} for {}",
                    column.symbol
                )));
            }
        }
        Ok(Self { dates, columns })
    }

    /// Outer-joins per-instrument series on date, keeping the input order of
    /// symbols. Series with no points are left out of the table.
    pub fn from_series(series: Vec<(String, PriceSeries)>) -> Result<Self, CoreError> {
        let series: Vec<(String, PriceSeries)> =
            series.into_iter().filter(|(_, s)| !s.is_empty()).collect();
        let dates: Vec<NaiveDate> = series
            .iter()
            .flat_map(|(_, s)| s.points().iter().map(|p| p.date))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let columns = series
            .into_iter()
            .map(|(symbol, s)| {
                let mut closes = vec![None; dates.len()];
                let mut cursor = 0usize;
                for point in s.points() {
                    while dates[cursor] < point.date {
                        cursor += 1;
                    }
                    closes[cursor] = Some(point.close);
                }
                PriceColumn { symbol, closes }
            })
            .collect();

        Self::new(dates, columns)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[PriceColumn] {
        &self.columns
    }

    pub fn symbols(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.symbol.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty() || self.dates.is_empty()
    }

    pub fn column(&self, symbol: &str) -> Option<&PriceColumn> {
        self.columns.iter().find(|c| c.symbol == symbol)
    }

    /// Day-over-day fractional changes. A row is kept only when every
    /// instrument has a return for it, so all columns share one date axis.
    pub fn daily_returns(&self) -> ReturnTable {
        let mut dates = Vec::new();
        let mut columns: Vec<(String, Vec<f64>)> = self
            .columns
            .iter()
            .map(|c| (c.symbol.clone(), Vec::new()))
            .collect();

        for t in 1..self.dates.len() {
            let row: Option<Vec<f64>> = self
                .columns
                .iter()
                .map(|c| match (c.closes[t - 1], c.closes[t]) {
                    (Some(prev), Some(curr)) => Some(curr / prev - 1.0),
                    _ => None,
                })
                .collect();
            let Some(row) = row else {
                continue;
            };
            dates.push(self.dates[t]);
            for (column, value) in columns.iter_mut().zip(row) {
                column.1.push(value);
            }
        }

        ReturnTable { dates, columns }
    }

    /// Closes of `symbols` from the latest row in which all of them traded.
    pub fn latest_prices(&self, symbols: &[String]) -> Option<Vec<(String, f64)>> {
        let columns: Vec<&PriceColumn> = symbols
            .iter()
            .map(|s| self.column(s))
            .collect::<Option<_>>()?;
        (0..self.dates.len()).rev().find_map(|t| {
            columns
                .iter()
                .map(|c| c.closes[t].map(|p| (c.symbol.clone(), p)))
                .collect::<Option<Vec<_>>>()
        })
    }
}

/// Aligned daily returns; every column has one value per entry in `dates`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ReturnTable {
    dates: Vec<NaiveDate>,
    columns: Vec<(String, Vec<f64>)>,
}

impl ReturnTable {
    pub fn new(dates: Vec<NaiveDate>, columns: Vec<(String, Vec<f64>)>) -> Result<Self, CoreError> {
        if let Some((symbol, values)) = columns.iter().find(|(_, v)| v.len() != dates.len()) {
            return Err(CoreError::invalid(format!(
                "return column {symbol} has {} rows, expected {}",
                values.len(),
                dates.len()
            )));
        }
        Ok(Self { dates, columns })
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn rows(&self) -> usize {
        self.dates.len()
    }

    pub fn columns(&self) -> &[(String, Vec<f64>)] {
        &self.columns
    }

    pub fn column(&self, symbol: &str) -> Option<&[f64]> {
        self.columns
            .iter()
            .find(|(s, _)| s == symbol)
            .map(|(_, v)| v.as_slice())
    }

    /// Sub-table with the given symbols in the given order.
    pub fn select(&self, symbols: &[String]) -> Result<ReturnTable, CoreError> {
        let columns = symbols
            .iter()
            .map(|s| {
                self.column(s)
                    .map(|v| (s.clone(), v.to_vec()))
                    .ok_or_else(|| CoreError::NotFound(format!("no return series for {s}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ReturnTable {
            dates: self.dates.clone(),
            columns,
        })
    }
}
