use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction implied by the price forecast alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TechnicalDirection {
    Buy,
    Sell,
    Hold,
}

/// Which side of the deadband the news polarity falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentBucket {
    Positive,
    Negative,
    Neutral,
}

/// Final recommendation after fusing technical direction and news sentiment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Call {
    StrongBuy,
    Buy,
    WeakBuy,
    StrongSell,
    Sell,
    Wait,
    Watchlist,
    Hold,
}

impl Call {
    pub const ALL: [Call; 8] = [
        Call::StrongBuy,
        Call::Buy,
        Call::WeakBuy,
        Call::StrongSell,
        Call::Sell,
        Call::Wait,
        Call::Watchlist,
        Call::Hold,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Call::StrongBuy => "STRONG_BUY",
            Call::Buy => "BUY",
            Call::WeakBuy => "WEAK_BUY",
            Call::StrongSell => "STRONG_SELL",
            Call::Sell => "SELL",
            Call::Wait => "WAIT",
            Call::Watchlist => "WATCHLIST",
            Call::Hold => "HOLD",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Call::StrongBuy | Call::Buy | Call::WeakBuy)
    }

    pub fn is_sell(&self) -> bool {
        matches!(self, Call::StrongSell | Call::Sell)
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
