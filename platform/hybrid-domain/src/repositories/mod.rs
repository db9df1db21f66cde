pub mod artifacts;
pub mod forecast;
pub mod headlines;
pub mod prices;
