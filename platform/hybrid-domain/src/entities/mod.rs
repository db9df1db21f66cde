pub mod allocation;
pub mod forecast;
pub mod price_series;
pub mod screening;
pub mod sentiment;
pub mod signal;
