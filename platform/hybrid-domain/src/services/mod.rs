pub mod forecast;
pub mod fusion;
pub mod lot_sizer;
pub mod optimizer;
pub mod price_table;
pub mod quality;
pub mod screener;
pub mod sentiment;
pub mod stats;
