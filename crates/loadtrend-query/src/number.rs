//! Numeric normalisation of report values.
//!
//! Reports are written with the load-testing tool's locale, so values look
//! like `"1,5"`, `"12 %"`, `"+3.5"` or `"1 234,5"`. A value that still is not
//! a finite number after normalisation (`"+INF"`, `"NaN"`, `"-"`) is treated
//! as missing, which is a normal outcome.

/// Sentinel written by the tool for rates below one hundredth.
const LESS_THAN_SENTINEL: &str = "<0.01";

/// Applies, in order: trim, `,` to `.`, strip spaces, strip `%`, strip `+`.
///
/// No-break spaces used as thousands separators are stripped with the
/// regular spaces.
#[must_use]
pub fn normalize(raw: &str) -> String {
    raw.trim()
        .replace(',', ".")
        .replace([' ', '\u{a0}', '\u{202f}'], "")
        .replace('%', "")
        .replace('+', "")
}

/// Parses a report value, returning `None` when it is not a finite number.
#[must_use]
pub fn parse_report_number(raw: &str) -> Option<f64> {
    let normalized = normalize(raw);
    if normalized == LESS_THAN_SENTINEL {
        return Some(0.0);
    }

    match normalized.parse::<f64>() {
        Ok(value) if value.is_finite() => Some(value),
        _ => {
            tracing::trace!(raw, "report value is not numeric");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(actual: Option<f64>, expected: f64) {
        let actual = actual.unwrap_or_else(|| panic!("expected {expected}, got no value"));
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn test_decimal_comma() {
        approx(parse_report_number("1,234"), 1.234);
        approx(parse_report_number("1,200"), 1.2);
    }

    #[test]
    fn test_whitespace_percent_and_sign() {
        approx(parse_report_number(" 56.7 "), 56.7);
        approx(parse_report_number("12%"), 12.0);
        approx(parse_report_number("12 %"), 12.0);
        approx(parse_report_number("+3.5"), 3.5);
        approx(parse_report_number("-0.25"), -0.25);
    }

    #[test]
    fn test_grouping_spaces() {
        approx(parse_report_number("1 234,5"), 1234.5);
        approx(parse_report_number("1\u{a0}234,5"), 1234.5);
    }

    #[test]
    fn test_less_than_sentinel() {
        approx(parse_report_number("<0.01"), 0.0);
        approx(parse_report_number("<0,01"), 0.0);
        approx(parse_report_number(" < 0.01 % "), 0.0);
    }

    #[test]
    fn test_non_numeric_residues_are_missing() {
        for raw in ["NaN", "+INF", "-INF", "  -  ", "", "Infinity", "n/a", "1.2.3"] {
            assert_eq!(parse_report_number(raw), None, "value {raw:?}");
        }
    }

    #[test]
    fn test_normalize_order() {
        assert_eq!(normalize("  +1 234,5 % "), "1234.5");
    }
}
