//! Series name and issue number inference from file names.
//!
//! Used when an archive carries no usable sidecar. Two independent signals
//! are combined for each field:
//!
//! - **Series name**: the case-insensitive common prefix of the archive's
//!   file name and its first entry's name ([`cross_names`]), overridden by the
//!   `<title> <1-3 digits>` pattern match when that is strictly shorter.
//! - **Number**: the token directly following the resolved series name,
//!   falling back to the digits of the pattern match.
//!
//! The order of these overrides matters on ambiguous names and must not be
//! turned into a scored comparison.

use crate::consts::SERIES_NUMBER_REGEX;
use crate::models::ResolvedMetadata;
use crate::number::{first_digit_run, normalize};
use tracing::instrument;

/// Resolves series name and number for one archive file name.
#[derive(Debug, Clone, Copy)]
pub struct NameResolver<'a> {
    file_name: &'a str,
}

impl<'a> NameResolver<'a> {
    pub fn new(file_name: &'a str) -> Self {
        Self { file_name }
    }

    /// Build the full record for an archive without a sidecar.
    #[instrument(level = "debug", skip(self), fields(file_name = self.file_name))]
    pub fn metadata(&self, first_entry: &str, pages_count: u32) -> ResolvedMetadata {
        let series_name = self.series_name(first_entry);
        let number = self.number(&series_name);
        tracing::debug!(%series_name, %number, "resolved from names");
        ResolvedMetadata { series_name, number, pages_count, ..Default::default() }
    }

    /// Series name from the file name and the first entry's name.
    pub fn series_name(&self, first_entry: &str) -> String {
        let crossed = cross_names(self.file_name, first_entry);
        let matched = series_name_from_file_name(self.file_name);

        let mut series_name = self.file_name.to_string();
        if !crossed.is_empty() && crossed != self.file_name {
            series_name = crossed;
        }
        if !matched.is_empty() && matched != self.file_name && char_len(&matched) < char_len(&series_name) {
            series_name = matched;
        }
        series_name
    }

    /// Issue number, given the series name already resolved for this file.
    pub fn number(&self, series_name: &str) -> String {
        let by_suffix = number_after_series(self.file_name, series_name);
        if !by_suffix.is_empty() {
            return by_suffix;
        }
        number_from_file_name(self.file_name)
    }
}

/// Common prefix of two names, compared case-insensitively.
///
/// A space in either name always matches (and is emitted as a space); the
/// walk stops at the first real mismatch. Characters are taken from `left`,
/// and trailing whitespace is trimmed from the result.
pub fn cross_names(left: &str, right: &str) -> String {
    let mut crossed = String::new();
    for (l, r) in left.chars().zip(right.chars()) {
        if l == ' ' || r == ' ' {
            crossed.push(' ');
            continue;
        }
        if !l.to_lowercase().eq(r.to_lowercase()) {
            break;
        }
        crossed.push(l);
    }
    crossed.truncate(crossed.trim_end().len());
    crossed
}

/// Everything before the issue number in a `<title> <1-3 digits>` file name.
///
/// Underscores count as spaces. Returns `file_name` unchanged when the
/// pattern does not match.
pub fn series_name_from_file_name(file_name: &str) -> String {
    match split_series_number(file_name) {
        Some((series, _)) => series,
        None => file_name.to_string(),
    }
}

/// The issue number in a `<title> <1-3 digits>` file name, normalised, or an
/// empty string when the pattern does not match.
pub fn number_from_file_name(file_name: &str) -> String {
    split_series_number(file_name).map(|(_, number)| normalize(&number)).unwrap_or_default()
}

/// The number in the space-delimited token right after `series_name` (plus
/// one separator character) in `file_name`.
///
/// Empty when there is no room for such a token, when the token is not
/// followed by a space, or when it has no digits.
pub fn number_after_series(file_name: &str, series_name: &str) -> String {
    let offset = char_len(series_name) + 1;
    if char_len(file_name) <= offset {
        return String::new();
    }
    let rest: String = file_name.chars().skip(offset).collect();
    match rest.split_once(' ') {
        Some((token, _)) => first_digit_run(token.trim()),
        None => String::new(),
    }
}

fn split_series_number(file_name: &str) -> Option<(String, String)> {
    let normalized = file_name.replace('_', " ");
    let matched = SERIES_NUMBER_REGEX.find(&normalized)?.as_str();
    // The pattern always ends in "<space><digits>".
    let (series, number) = matched.rsplit_once(' ')?;
    Some((series.trim().to_string(), number.trim().to_string()))
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Batman_01.cbz", "Batman 01/page001.jpg", "Batman 01")]
    #[case("BATMAN 01.cbz", "batman 01/page001.jpg", "BATMAN 01")]
    #[case("Saga 054 (2018).cbz", "Saga 054-000.jpg", "Saga 054")]
    #[case("Hellboy.cbz", "Hell_01.jpg", "Hell")]
    #[case("abc.cbz", "xyz.jpg", "")]
    #[case("", "page.jpg", "")]
    #[case("Café 1.cbz", "CAFÉ 1/01.jpg", "Café 1")]
    fn test_cross_names(#[case] left: &str, #[case] right: &str, #[case] expected: &str) {
        let crossed = cross_names(left, right);
        assert_eq!(crossed, expected);
        assert!(crossed.chars().count() <= left.chars().count().min(right.chars().count()));
    }

    #[rstest]
    #[case("Spiderman 5.cbz", "Spiderman")]
    #[case("Batman_01.cbz", "Batman")]
    #[case("Batman (2016) 012.cbz", "Batman (2016)")]
    #[case("X-Men 001 Special.cbz", "X-Men")]
    #[case("Saga 0123.cbz", "Saga")]
    #[case("Invincible.cbz", "Invincible.cbz")]
    #[case("2000AD.cbz", "2000AD.cbz")]
    fn test_series_name_from_file_name(#[case] file_name: &str, #[case] expected: &str) {
        assert_eq!(series_name_from_file_name(file_name), expected);
    }

    #[rstest]
    #[case("Spiderman 5.cbz", "5")]
    #[case("Batman_01.cbz", "1")]
    #[case("Saga 0123.cbz", "12")]
    #[case("Invincible.cbz", "")]
    fn test_number_from_file_name(#[case] file_name: &str, #[case] expected: &str) {
        assert_eq!(number_from_file_name(file_name), expected);
    }

    #[rstest]
    #[case("Saga 054 (2018).cbz", "Saga", "54")]
    #[case("Saga v2 (2018).cbz", "Saga", "2")]
    #[case("Spiderman 5.cbz", "Spiderman", "")]
    #[case("Saga (2018) x.cbz", "Saga", "2018")]
    #[case("Saga.cbz", "Saga.cbz", "")]
    #[case("Saga x.cbz", "Saga x.cbz", "")]
    #[case("Saga 1", "Saga", "")]
    fn test_number_after_series(#[case] file_name: &str, #[case] series: &str, #[case] expected: &str) {
        assert_eq!(number_after_series(file_name, series), expected);
    }

    #[rstest]
    #[case::pattern_is_tighter("Spiderman 5.cbz", "Spiderman 5/001.jpg", "Spiderman", "5")]
    #[case::underscores("Batman_01.cbz", "Batman 01/page001.jpg", "Batman", "1")]
    #[case::token_after_series("Saga 054 (2018) (Digital).cbz", "Saga 054-000.jpg", "Saga", "54")]
    #[case::year_in_title("Batman (2016) 012.cbz", "Batman (2016) 012 - p00.jpg", "Batman (2016)", "12")]
    #[case::cross_name_is_tighter("Hellboy Seed 01.cbz", "Hell_01.jpg", "Hell", "1")]
    #[case::cross_name_only("Invincible.cbz", "Invincible/01.jpg", "Invincible", "")]
    #[case::no_signal("abc.cbz", "xyz.jpg", "abc.cbz", "")]
    fn test_resolve(
        #[case] file_name: &str,
        #[case] first_entry: &str,
        #[case] series_name: &str,
        #[case] number: &str,
    ) {
        let metadata = NameResolver::new(file_name).metadata(first_entry, 2);
        assert_eq!(metadata.series_name, series_name);
        assert_eq!(metadata.number, number);
        assert_eq!(metadata.pages_count, 2);
        assert!(metadata.summary.is_empty());
        assert!(metadata.publisher.is_empty());
    }
}
