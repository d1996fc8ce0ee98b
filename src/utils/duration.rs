use chrono::Duration;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid duration {input:?}: {reason}")]
pub struct DurationError {
    pub input: String,
    pub reason: &'static str,
}

impl DurationError {
    fn new(input: &str, reason: &'static str) -> Self {
        Self {
            input: input.to_string(),
            reason,
        }
    }
}

/// Nanoseconds per unit suffix. Two-letter units are listed first so that
/// `ms` is not read as `m` followed by garbage.
const UNITS: [(&str, i64); 8] = [
    ("ns", 1),
    ("us", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 3_600 * 1_000_000_000),
    ("d", 24 * 3_600 * 1_000_000_000),
    ("w", 168 * 3_600 * 1_000_000_000),
];

/// Parse a duration such as `"30d"`, `"1d12h"` or `"250ms"`.
///
/// The input is a sequence of `<integer><unit>` pairs with units
/// `ns, us, ms, s, m, h, d, w`. Signs, fractions and whitespace are rejected.
pub fn parse_duration(input: &str) -> Result<Duration, DurationError> {
    if input.is_empty() {
        return Err(DurationError::new(input, "empty string"));
    }

    let mut total: i64 = 0;
    let mut rest = input;

    while !rest.is_empty() {
        let digits = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        if digits == 0 {
            return Err(DurationError::new(input, "expected a number"));
        }
        if digits == rest.len() {
            return Err(DurationError::new(input, "missing unit"));
        }

        let amount: i64 = rest[..digits]
            .parse()
            .map_err(|_| DurationError::new(input, "number out of range"))?;
        rest = &rest[digits..];

        let (unit, nanos) = UNITS
            .iter()
            .find(|(unit, _)| rest.starts_with(unit))
            .ok_or_else(|| DurationError::new(input, "unknown unit"))?;
        rest = &rest[unit.len()..];

        total = amount
            .checked_mul(*nanos)
            .and_then(|n| total.checked_add(n))
            .ok_or_else(|| DurationError::new(input, "duration out of range"))?;
    }

    Ok(Duration::nanoseconds(total))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_units() {
        assert_eq!(parse_duration("90s").unwrap(), Duration::seconds(90));
        assert_eq!(parse_duration("250ms").unwrap(), Duration::milliseconds(250));
        assert_eq!(parse_duration("15us").unwrap(), Duration::microseconds(15));
        assert_eq!(parse_duration("7ns").unwrap(), Duration::nanoseconds(7));
        assert_eq!(parse_duration("5m").unwrap(), Duration::minutes(5));
        assert_eq!(parse_duration("3h").unwrap(), Duration::hours(3));
    }

    #[test]
    fn test_days_and_weeks() {
        assert_eq!(parse_duration("1d").unwrap(), Duration::hours(24));
        assert_eq!(parse_duration("2w").unwrap(), Duration::hours(336));
        assert_eq!(parse_duration("30d").unwrap(), Duration::days(30));
    }

    #[test]
    fn test_composite_durations() {
        assert_eq!(parse_duration("1d12h").unwrap(), Duration::hours(36));
        assert_eq!(
            parse_duration("1h30m15s").unwrap(),
            Duration::seconds(3600 + 1800 + 15)
        );
        assert_eq!(parse_duration("1m500ms").unwrap(), Duration::milliseconds(60_500));
    }

    #[test]
    fn test_invalid_durations() {
        for input in ["", "d", "10", "1d2", "5x", "1.5h", "-3h", " 3h", "h3"] {
            assert!(parse_duration(input).is_err(), "{input:?} should not parse");
        }
    }

    #[test]
    fn test_overflow_is_reported() {
        let err = parse_duration("99999999999w").unwrap_err();
        assert_eq!(err.reason, "duration out of range");
    }
}
