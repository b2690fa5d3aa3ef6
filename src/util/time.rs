use std::fmt;
use std::time::Duration;

const UNITS: &[(&str, u128)] = &[
    ("ns", 1),
    ("us", 1_000),
    ("µs", 1_000),
    ("μs", 1_000),
    ("ms", 1_000_000),
    ("s", 1_000_000_000),
    ("m", 60 * 1_000_000_000),
    ("h", 3_600 * 1_000_000_000),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntervalError {
    Empty,
    Invalid(String),
    NonPositive(String),
}

impl fmt::Display for IntervalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntervalError::Empty => write!(f, "interval is empty"),
            IntervalError::Invalid(s) => write!(f, "invalid duration {:?} (expected e.g. 30s, 1m, 1h30m)", s),
            IntervalError::NonPositive(s) => write!(f, "interval must be greater than zero, got {:?}", s),
        }
    }
}

impl std::error::Error for IntervalError {}

// Parse a duration string like "30s", "1m", "1h30m", "1.5s" or "250ms".
// A bare "0" is accepted by the grammar but rejected as non-positive, as is
// anything with a leading minus sign.
pub fn parse_interval(s: &str) -> Result<Duration, IntervalError> {
    let raw = s.trim();
    if raw.is_empty() { return Err(IntervalError::Empty); }

    let invalid = || IntervalError::Invalid(raw.to_string());
    let (negative, mut rest) = match raw.as_bytes()[0] {
        b'-' => (true, &raw[1..]),
        b'+' => (false, &raw[1..]),
        _ => (false, raw),
    };
    if rest == "0" { return Err(IntervalError::NonPositive(raw.to_string())); }
    if rest.is_empty() { return Err(invalid()); }

    let mut total: u128 = 0;
    while !rest.is_empty() {
        let int_len = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
        let int_part = &rest[..int_len];
        rest = &rest[int_len..];

        let mut frac_part = "";
        if let Some(after_dot) = rest.strip_prefix('.') {
            let frac_len = after_dot.find(|c: char| !c.is_ascii_digit()).unwrap_or(after_dot.len());
            frac_part = &after_dot[..frac_len];
            rest = &after_dot[frac_len..];
        }
        if int_part.is_empty() && frac_part.is_empty() { return Err(invalid()); }

        let unit_len = rest.find(|c: char| c.is_ascii_digit() || c == '.').unwrap_or(rest.len());
        let unit = &rest[..unit_len];
        rest = &rest[unit_len..];
        let scale = UNITS.iter().find(|(name, _)| *name == unit).map(|(_, n)| *n).ok_or_else(invalid)?;

        let whole: u128 = if int_part.is_empty() { 0 } else { int_part.parse().map_err(|_| invalid())? };
        let mut nanos = whole.checked_mul(scale).ok_or_else(invalid)?;
        if !frac_part.is_empty() {
            // digits past nanosecond precision cannot contribute
            let digits = &frac_part[..frac_part.len().min(18)];
            let frac: u128 = digits.parse().map_err(|_| invalid())?;
            nanos += frac * scale / 10u128.pow(digits.len() as u32);
        }
        total = total.checked_add(nanos).ok_or_else(invalid)?;
    }

    if negative || total == 0 { return Err(IntervalError::NonPositive(raw.to_string())); }
    let nanos = u64::try_from(total).map_err(|_| invalid())?;
    Ok(Duration::from_nanos(nanos))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_simple_units() {
        assert_eq!(parse_interval("30s").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_interval("1m").unwrap(), Duration::from_secs(60));
        assert_eq!(parse_interval("2h").unwrap(), Duration::from_secs(7200));
        assert_eq!(parse_interval("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_interval("10us").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_interval("7ns").unwrap(), Duration::from_nanos(7));
    }

    #[test]
    fn parses_compound_and_fractional() {
        assert_eq!(parse_interval("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_interval("1m30s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_interval("1.5s").unwrap(), Duration::from_millis(1500));
        assert_eq!(parse_interval(".5m").unwrap(), Duration::from_secs(30));
        assert_eq!(parse_interval(" +45s ").unwrap(), Duration::from_secs(45));
    }

    #[test]
    fn rejects_zero_and_negative() {
        assert_eq!(parse_interval("0"), Err(IntervalError::NonPositive("0".into())));
        assert_eq!(parse_interval("0s"), Err(IntervalError::NonPositive("0s".into())));
        assert_eq!(parse_interval("-1m"), Err(IntervalError::NonPositive("-1m".into())));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(parse_interval(""), Err(IntervalError::Empty));
        assert!(matches!(parse_interval("10"), Err(IntervalError::Invalid(_))));
        assert!(matches!(parse_interval("abc"), Err(IntervalError::Invalid(_))));
        assert!(matches!(parse_interval("5d"), Err(IntervalError::Invalid(_))));
        assert!(matches!(parse_interval("."), Err(IntervalError::Invalid(_))));
        assert!(matches!(parse_interval("-"), Err(IntervalError::Invalid(_))));
    }
}
