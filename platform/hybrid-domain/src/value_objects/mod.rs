pub mod call;
pub mod period;
pub mod price_point;
pub mod sentiment_label;
pub mod ticker;
