use crate::errors::CoreError;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_TICKER_LEN: usize = 24;

/// Exchange symbol as used by the price source (`BBRI.JK`, `USDIDR=X`, `^JKSE`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Ticker(String);

impl Ticker {
    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let normalized = raw.trim().to_uppercase();
        if normalized.is_empty() {
            return Err(CoreError::invalid("empty ticker"));
        }
        if normalized.len() > MAX_TICKER_LEN {
            return Err(CoreError::invalid(format!(
                "ticker too long ({} > {MAX_TICKER_LEN}): {normalized}",
                normalized.len()
            )));
        }
        if let Some(bad) = normalized
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '.' | '=' | '^' | '-')))
        {
            return Err(CoreError::invalid(format!(
                "ticker {normalized} contains invalid character {bad:?}"
            )));
        }
        Ok(Self(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Ticker {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ticker::parse(&value)
    }
}

impl From<Ticker> for String {
    fn from(value: Ticker) -> Self {
        value.0
    }
}

impl AsRef<str> for Ticker {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::Ticker;
    use crate::errors::ErrorKind;

    #[test]
    fn parse_normalizes_case_and_whitespace() {
        let ticker = Ticker::parse("  goto.jk ").expect("valid");
        assert_eq!(ticker.as_str(), "GOTO.JK");
    }

    #[test]
    fn parse_accepts_forex_and_index_symbols() {
        assert!(Ticker::parse("USDIDR=X").is_ok());
        assert!(Ticker::parse("^JKSE").is_ok());
        assert!(Ticker::parse("BRK-B").is_ok());
    }

    #[test]
    fn parse_rejects_malformed_symbols() {
        for raw in ["", "   ", "BBRI JK", "TLKM;DROP", "ABCDEFGHIJKLMNOPQRSTUVWXYZ"] {
            let err = Ticker::parse(raw).expect_err("should reject");
            assert_eq!(err.kind(), ErrorKind::InvalidInput, "input {raw:?}");
        }
    }
}
