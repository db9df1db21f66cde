pub mod prices;

pub use prices::{load_csv, CsvPriceStore};
