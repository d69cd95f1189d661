//! Compact duration notation: `<integer><unit>` with units d, h, m, s.
//!
//! The state TTL is configured in this notation. Parsing happens once
//! at startup; an invalid value is a fatal configuration error, never
//! a runtime one.

use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid ttl {input:?}: expected <integer><unit> with unit one of d, h, m, s")]
pub struct TtlParseError {
    pub input: String,
}

/// Parse a compact duration like "5d", "2h", "30m", or "15s".
pub fn parse_ttl(input: &str) -> Result<Duration, TtlParseError> {
    let err = || TtlParseError {
        input: input.to_string(),
    };

    let trimmed = input.trim();
    let mut chars = trimmed.chars();
    let unit = chars.next_back().ok_or_else(err)?;
    let digits = chars.as_str();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }
    let value: u64 = digits.parse().map_err(|_| err())?;

    let unit_seconds = match unit.to_ascii_lowercase() {
        'd' => 86_400,
        'h' => 3_600,
        'm' => 60,
        's' => 1,
        _ => return Err(err()),
    };
    let seconds = value.checked_mul(unit_seconds).ok_or_else(err)?;
    Ok(Duration::from_secs(seconds))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_units() {
        assert_eq!(parse_ttl("5d"), Ok(Duration::from_secs(5 * 86_400)));
        assert_eq!(parse_ttl("2h"), Ok(Duration::from_secs(7_200)));
        assert_eq!(parse_ttl("30m"), Ok(Duration::from_secs(1_800)));
        assert_eq!(parse_ttl("15s"), Ok(Duration::from_secs(15)));
        assert_eq!(parse_ttl("1s"), Ok(Duration::from_secs(1)));
    }

    #[test]
    fn test_unit_case_insensitive() {
        assert_eq!(parse_ttl("2H"), Ok(Duration::from_secs(7_200)));
    }

    #[test]
    fn test_rejects_bad_shapes() {
        for bad in ["", "d", "5", "5w", "h5", "5.5h", "-5h", " 5 h ", "5hh"] {
            assert!(parse_ttl(bad).is_err(), "{bad:?} should not parse");
        }
    }

    #[test]
    fn test_rejects_overflow() {
        assert!(parse_ttl("999999999999999999999d").is_err());
    }
}
