pub mod allocation;
pub mod cache;
pub mod config;
pub mod daily;
pub mod recommendation;
pub mod reporting;
pub mod validation;
