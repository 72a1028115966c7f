//! Issue number canonicalisation.

use crate::consts::DIGIT_RUN_REGEX;

/// Canonicalise a numeric-looking issue token.
///
/// Integers come back without leading zeros (`"007"` becomes `"7"`), other
/// finite numbers in their shortest round-trippable decimal form (`"3.50"`
/// becomes `"3.5"`). Anything else, like `"Annual"`, is returned unchanged.
pub fn normalize(raw: &str) -> String {
    if let Ok(integer) = raw.parse::<i64>() {
        return integer.to_string();
    }
    match raw.parse::<f64>() {
        Ok(float) if float.is_finite() => float.to_string(),
        _ => raw.to_string(),
    }
}

/// The first maximal run of ASCII digits in `text`, normalised, or an empty
/// string if `text` has no digits.
pub fn first_digit_run(text: &str) -> String {
    DIGIT_RUN_REGEX.find(text).map(|run| normalize(run.as_str())).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("007", "7")]
    #[case("0", "0")]
    #[case("000", "0")]
    #[case("42", "42")]
    #[case("+12", "12")]
    #[case("-3", "-3")]
    #[case("3.50", "3.5")]
    #[case("3.0", "3")]
    #[case("0.25", "0.25")]
    #[case("Annual", "Annual")]
    #[case("12a", "12a")]
    #[case("", "")]
    #[case("inf", "inf")]
    #[case("NaN", "NaN")]
    fn test_normalize(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize(raw), expected);
    }

    #[test]
    fn test_normalize_beyond_integer_range() {
        // Too large for an integer, still a valid float.
        assert_eq!(normalize("99999999999999999999"), "100000000000000000000");
    }

    #[rstest]
    #[case("Issue 007 (2019)", "7")]
    #[case("#12", "12")]
    #[case("v2 010", "2")]
    #[case("Annual", "")]
    #[case("", "")]
    #[case("١٢", "")]
    fn test_first_digit_run(#[case] text: &str, #[case] expected: &str) {
        assert_eq!(first_digit_run(text), expected);
    }
}
