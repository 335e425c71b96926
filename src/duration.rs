//! Duration parsing for relative time claims
//!
//! Accepts either a number of seconds or a shorthand duration string
//! (`"30m"`, `"1h"`, `"15d"`, `"2 weeks"`, `"1.5h"`) and normalizes it to
//! whole, non-negative seconds. A bare numeric string such as `"100"` is read
//! as milliseconds, matching the shorthand grammar's default unit.

use crate::error::{Error, Result};
use crate::limits::MAX_DURATION_STRING_LENGTH;
use crate::options::Value;

const SECOND_MS: f64 = 1000.0;
const MINUTE_MS: f64 = SECOND_MS * 60.0;
const HOUR_MS: f64 = MINUTE_MS * 60.0;
const DAY_MS: f64 = HOUR_MS * 24.0;
const WEEK_MS: f64 = DAY_MS * 7.0;
const YEAR_MS: f64 = DAY_MS * 365.25;

/// Parse an option value into whole seconds
///
/// `claim` names the option or claim in the returned error.
pub fn parse_duration(value: &Value, claim: &str) -> Result<u64> {
    match value {
        Value::Number(seconds) => seconds_from_f64(*seconds, claim),
        Value::String(text) => parse_duration_str(text, claim),
        other => Err(invalid(
            claim,
            format!("expected a number or duration string, got {}", other.kind()),
        )),
    }
}

/// Parse a shorthand duration string into whole seconds
pub fn parse_duration_str(text: &str, claim: &str) -> Result<u64> {
    let millis = parse_millis(text).ok_or_else(|| {
        invalid(claim, format!("'{text}' is not a valid duration"))
    })?;
    seconds_from_f64((millis / SECOND_MS).floor(), claim)
}

fn seconds_from_f64(seconds: f64, claim: &str) -> Result<u64> {
    if !seconds.is_finite() {
        return Err(invalid(claim, "expected a finite number".into()));
    }
    if seconds < 0.0 {
        return Err(invalid(claim, "negative numbers are invalid".into()));
    }
    Ok(seconds.floor() as u64)
}

fn invalid(claim: &str, reason: String) -> Error {
    Error::InvalidClaimValue {
        claim: claim.to_string(),
        reason,
    }
}

/// `<number><spaces><unit?>` into milliseconds, `None` if it does not parse
fn parse_millis(text: &str) -> Option<f64> {
    if text.is_empty() || text.len() > MAX_DURATION_STRING_LENGTH {
        return None;
    }

    let (sign, unsigned) = match text.strip_prefix('-') {
        Some(rest) => (-1.0, rest),
        None => (1.0, text),
    };

    let number_end = unsigned
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(unsigned.len());
    let (number, rest) = unsigned.split_at(number_end);

    // digits with at most one '.', and the number ends in a digit
    if number.is_empty()
        || number.matches('.').count() > 1
        || !number.ends_with(|c: char| c.is_ascii_digit())
    {
        return None;
    }
    let amount: f64 = number.parse().ok()?;

    let unit = rest.trim_start_matches(' ').to_ascii_lowercase();
    let multiplier = match unit.as_str() {
        "" | "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1.0,
        "s" | "sec" | "secs" | "second" | "seconds" => SECOND_MS,
        "m" | "min" | "mins" | "minute" | "minutes" => MINUTE_MS,
        "h" | "hr" | "hrs" | "hour" | "hours" => HOUR_MS,
        "d" | "day" | "days" => DAY_MS,
        "w" | "week" | "weeks" => WEEK_MS,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR_MS,
        _ => return None,
    };

    Some(sign * amount * multiplier)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<u64> {
        parse_duration_str(text, "exp")
    }

    #[test]
    fn test_shorthand_units() {
        assert_eq!(parse("30m").unwrap(), 60 * 30);
        assert_eq!(parse("1h").unwrap(), 60 * 60);
        assert_eq!(parse("15d").unwrap(), 60 * 60 * 24 * 15);
        assert_eq!(parse("2w").unwrap(), 60 * 60 * 24 * 14);
        assert_eq!(parse("45s").unwrap(), 45);
        assert_eq!(parse("1y").unwrap(), 31_557_600);
    }

    #[test]
    fn test_unit_multipliers_hold_for_any_count() {
        for n in [0u64, 1, 7, 24, 365, 10_000] {
            assert_eq!(parse(&format!("{n}h")).unwrap(), n * 3600);
            assert_eq!(parse(&format!("{n}m")).unwrap(), n * 60);
            assert_eq!(parse(&format!("{n}d")).unwrap(), n * 86400);
        }
    }

    #[test]
    fn test_long_unit_names_and_spacing() {
        assert_eq!(parse("2 days").unwrap(), 2 * 86400);
        assert_eq!(parse("1 HOUR").unwrap(), 3600);
        assert_eq!(parse("10 mins").unwrap(), 600);
        assert_eq!(parse("1.5h").unwrap(), 5400);
        assert_eq!(parse(".5m").unwrap(), 30);
    }

    #[test]
    fn test_bare_number_string_is_milliseconds() {
        assert_eq!(parse("100").unwrap(), 0);
        assert_eq!(parse("2500").unwrap(), 2);
        assert_eq!(parse("1500ms").unwrap(), 1);
    }

    #[test]
    fn test_numbers_are_seconds() {
        assert_eq!(parse_duration(&Value::from(100), "exp").unwrap(), 100);
        assert_eq!(parse_duration(&Value::from(12.9), "exp").unwrap(), 12);
        assert_eq!(parse_duration(&Value::from(0), "exp").unwrap(), 0);
    }

    #[test]
    fn test_negative_values_rejected() {
        assert!(matches!(
            parse("-1h"),
            Err(Error::InvalidClaimValue { claim, .. }) if claim == "exp"
        ));
        assert!(parse_duration(&Value::from(-100), "maxAge").is_err());
        assert!(parse_duration(&Value::from(-0.5), "maxAge").is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        for input in ["", "h", "1x", "1..5h", "1.h", "--1h", "1h2m", "one hour", " 1h"] {
            assert!(parse(input).is_err(), "{input:?} should not parse");
        }
        assert!(parse(&"1".repeat(101)).is_err());
        assert!(parse_duration(&Value::from(f64::NAN), "exp").is_err());
        assert!(parse_duration(&Value::from(f64::INFINITY), "exp").is_err());
        assert!(matches!(
            parse_duration(&Value::from(true), "nbf"),
            Err(Error::InvalidClaimValue { claim, .. }) if claim == "nbf"
        ));
        assert!(parse_duration(&Value::from(vec!["1h"]), "nbf").is_err());
    }
}
