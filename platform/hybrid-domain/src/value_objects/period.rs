use serde::{Deserialize, Serialize};
use std::fmt;

/// Calendar look-back window expressed in whole days.
///
/// Accepts plain day counts (`"30"`) or a number with a unit suffix:
/// `d`/`day`, `w`/`week`, `mo`/`month` (30 days), `y`/`year` (365 days).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    pub label: String,
    pub days: i64,
}

impl Period {
    pub fn days(days: i64) -> Self {
        Self {
            label: format!("{days}d"),
            days,
        }
    }

    pub fn parse(value: &str) -> Result<Self, String> {
        let days = parse_period_days(value)?;
        if days <= 0 {
            return Err(format!("period must be positive: {value}"));
        }
        Ok(Self {
            label: value.trim().to_lowercase(),
            days,
        })
    }

    pub fn as_duration(&self) -> chrono::Duration {
        chrono::Duration::days(self.days)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

impl TryFrom<String> for Period {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Period::parse(&value)
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.label
    }
}

pub fn parse_period_days(value: &str) -> Result<i64, String> {
    let trimmed = value.trim().to_lowercase();
    if trimmed.is_empty() {
        return Err("empty period".to_string());
    }
    if let Ok(days) = trimmed.parse::<i64>() {
        return Ok(days);
    }

    let (number_part, unit) = if let Some(stripped) = trimmed.strip_suffix("month") {
        (stripped, "month")
    } else if let Some(stripped) = trimmed.strip_suffix("mo") {
        (stripped, "mo")
    } else if let Some(stripped) = trimmed.strip_suffix("year") {
        (stripped, "year")
    } else if let Some(stripped) = trimmed.strip_suffix("week") {
        (stripped, "week")
    } else if let Some(stripped) = trimmed.strip_suffix("day") {
        (stripped, "day")
    } else {
        trimmed.split_at(trimmed.len().saturating_sub(1))
    };

    let multiplier = match unit {
        "d" | "day" => 1,
        "w" | "week" => 7,
        "mo" | "month" => 30,
        "y" | "year" => 365,
        _ => return Err(format!("unsupported period unit: {unit}")),
    };

    let number: i64 = number_part
        .trim()
        .parse()
        .map_err(|_| format!("invalid period: {value}"))?;
    Ok(number * multiplier)
}

#[cfg(test)]
mod tests {
    use super::{parse_period_days, Period};

    #[test]
    fn parses_supported_units() {
        assert_eq!(parse_period_days("2d").unwrap(), 2);
        assert_eq!(parse_period_days("4w").unwrap(), 28);
        assert_eq!(parse_period_days("6mo").unwrap(), 180);
        assert_eq!(parse_period_days("1y").unwrap(), 365);
        assert_eq!(parse_period_days("90").unwrap(), 90);
        assert!(parse_period_days("3 months").is_err());
    }

    #[test]
    fn rejects_unknown_unit_and_non_positive() {
        assert!(parse_period_days("5h").is_err());
        assert!(Period::parse("0d").is_err());
        assert!(Period::parse("").is_err());
    }

    #[test]
    fn period_deserializes_from_string() {
        #[derive(serde::Deserialize)]
        struct Wrapper {
            window: Period,
        }
        let parsed: Wrapper = serde_json::from_str(r#"{"window":"6mo"}"#).unwrap();
        assert_eq!(parsed.window.days, 180);
        assert_eq!(parsed.window.to_string(), "6mo");
    }
}
