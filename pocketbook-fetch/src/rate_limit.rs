//! Retry-after hint parsing for 429 responses.

use std::sync::LazyLock;

use regex::Regex;

use pocketbook_store::DEFAULT_RETRY_AFTER_SECS;

/// First run of decimal digits, e.g. `45` in `"45s"`.
static DIGITS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("Invalid regex"));

/// Extracts the wait time in seconds from a `retryAfter` hint.
///
/// Takes the first integer in the string. Falls back to
/// [`DEFAULT_RETRY_AFTER_SECS`] when the hint is absent, has no digits,
/// overflows, or is zero.
pub fn parse_retry_after(hint: Option<&str>) -> u64 {
    hint.and_then(|raw| DIGITS_RE.find(raw))
        .and_then(|digits| digits.as_str().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seconds_suffix() {
        assert_eq!(parse_retry_after(Some("45s")), 45);
        assert_eq!(parse_retry_after(Some("120")), 120);
    }

    #[test]
    fn test_first_digit_run_wins() {
        assert_eq!(parse_retry_after(Some("retry in 15s (or 30s)")), 15);
    }

    #[test]
    fn test_defaults() {
        assert_eq!(parse_retry_after(None), 60);
        assert_eq!(parse_retry_after(Some("")), 60);
        assert_eq!(parse_retry_after(Some("soon")), 60);
        assert_eq!(parse_retry_after(Some("0s")), 60);
        assert_eq!(parse_retry_after(Some("99999999999999999999999")), 60);
    }
}
