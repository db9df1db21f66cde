use crate::entities::price_series::PriceSeries;
use crate::services::price_table::PriceTable;
use crate::services::quality::PriceQualityReport;
use crate::value_objects::period::Period;
use crate::value_objects::ticker::Ticker;

pub trait PriceHistoryRepository {
    /// Closes for `ticker` over the trailing `window`. An unknown ticker is an
    /// error.
    fn history(
        &self,
        ticker: &Ticker,
        window: &Period,
    ) -> Result<(PriceSeries, PriceQualityReport), String>;
}

pub trait PriceTableRepository {
    /// Aligned closes for `symbols` over the trailing `window`. Symbols without
    /// data are left out of the table rather than failing the call.
    fn price_table(&self, symbols: &[String], window: &Period) -> Result<PriceTable, String>;
}
