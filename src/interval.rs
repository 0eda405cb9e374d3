//! Desktop-distribution intervals for `MV_SEPARATE`.
//!
//! Accepted forms, tried in this order:
//!
//! * `*`: one distinct desktop per window, `0..N`
//! * `1,3,5`: an explicit list of two or more ids, used as given
//! * `N-M`, `N-`, `-M`, `N`: the half-open range `[from, to)`, where a
//!   missing `from` is `0` and a missing `to` is the number of windows
//!   being distributed

use crate::error::QueryError;
use crate::token::WILDCARD;
use regex::Regex;
use std::sync::LazyLock;

static SEQUENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+(?:\s*,\s*\d+)+$").expect("static regex"));

static RANGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?P<from>\d+)?-?(?P<to>\d+)?$").expect("static regex"));

/// A parsed interval, independent of the number of windows it will be
/// applied to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Interval {
    Wildcard,
    Sequence(Vec<usize>),
    Range { from: Option<usize>, to: Option<usize> },
}

impl Interval {
    /// Parse interval syntax.
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let text = text.trim();
        let invalid = || {
            QueryError::WrongQueryParameter(format!("not a valid desktop interval: {:?}", text))
        };

        if text == WILDCARD {
            return Ok(Interval::Wildcard);
        }

        if SEQUENCE.is_match(text) {
            let ids = text
                .split(',')
                .map(|n| n.trim().parse::<usize>().map_err(|_| invalid()))
                .collect::<Result<Vec<_>, _>>()?;
            return Ok(Interval::Sequence(ids));
        }

        let caps = RANGE.captures(text).ok_or_else(invalid)?;
        let bound = |name: &str| -> Result<Option<usize>, QueryError> {
            caps.name(name)
                .map(|m| m.as_str().parse::<usize>().map_err(|_| invalid()))
                .transpose()
        };
        Ok(Interval::Range {
            from: bound("from")?,
            to: bound("to")?,
        })
    }

    /// Resolve to concrete desktop ids for `window_count` windows.
    ///
    /// A range never yields more ids than there are windows; ids past that
    /// would never be paired with one.
    pub fn desktops(&self, window_count: usize) -> Vec<usize> {
        match self {
            Interval::Wildcard => (0..window_count).collect(),
            Interval::Sequence(ids) => ids.clone(),
            Interval::Range { from, to } => (from.unwrap_or(0)..to.unwrap_or(window_count))
                .take(window_count)
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(text: &str, n: usize) -> Vec<usize> {
        Interval::parse(text).unwrap().desktops(n)
    }

    #[test]
    fn closed_range_is_half_open() {
        assert_eq!(resolve("1-3", 5), [1, 2]);
    }

    #[test]
    fn explicit_sequence_is_kept_in_order() {
        assert_eq!(resolve("1,3,5", 5), [1, 3, 5]);
        assert_eq!(resolve("4, 0,2", 2), [4, 0, 2]);
    }

    #[test]
    fn open_start_defaults_to_zero() {
        assert_eq!(resolve("-3", 5), [0, 1, 2]);
    }

    #[test]
    fn open_end_defaults_to_window_count() {
        assert_eq!(resolve("2-", 5), [2, 3, 4]);
        assert_eq!(resolve("2", 5), [2, 3, 4]);
    }

    #[test]
    fn wildcard_is_one_desktop_per_window() {
        assert_eq!(Interval::parse("*").unwrap(), Interval::Wildcard);
        assert_eq!(resolve("*", 3), [0, 1, 2]);
    }

    #[test]
    fn inverted_range_is_empty() {
        assert!(resolve("4-2", 5).is_empty());
    }

    #[test]
    fn huge_range_is_capped_to_window_count() {
        assert_eq!(resolve("0-18446744073709551615", 3), [0, 1, 2]);
        assert_eq!(resolve("18446744073709551614-", 3), Vec::<usize>::new());
        assert_eq!(
            resolve("99999999999-99999999999999", 2),
            [99_999_999_999, 100_000_000_000]
        );
    }

    #[test]
    fn garbage_is_rejected() {
        for bad in ["a", "1-2-3", "1,", ",1", "1..3", "-1-", "x-3"] {
            assert!(
                matches!(Interval::parse(bad), Err(QueryError::WrongQueryParameter(_))),
                "{bad:?} should be rejected"
            );
        }
    }
}
