//! Numeric token extraction shared by the draw parsers.
//!
//! A token either converts into an in-range ball or is discarded; nothing is
//! coerced.

use std::collections::HashSet;
use std::ops::RangeInclusive;

use regex::Regex;

use crate::error::Result;

/// Parses `token` as a ball number inside `range`.
#[must_use]
pub fn parse_ball(token: &str, range: &RangeInclusive<u8>) -> Option<u8> {
    token
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|n| range.contains(n))
}

/// Returns `true` when no value occurs twice.
#[must_use]
pub fn all_distinct(numbers: &[u8]) -> bool {
    let mut seen = HashSet::with_capacity(numbers.len());
    numbers.iter().all(|n| seen.insert(*n))
}

/// One way of pulling ball numbers out of markup: a pattern whose first
/// capture group is the number, plus the range a capture must fall in.
pub struct BallPattern {
    pattern: Regex,
    range: RangeInclusive<u8>,
}

impl BallPattern {
    /// Compiles a ball pattern.
    ///
    /// # Errors
    ///
    /// Returns `KujiError::RegexError` if `pattern` fails to compile.
    pub fn new(pattern: &str, range: RangeInclusive<u8>) -> Result<Self> {
        Ok(Self {
            pattern: Regex::new(pattern)?,
            range,
        })
    }

    /// Every in-range ball in `text`, in document order.
    pub fn extract<'t>(&'t self, text: &'t str) -> impl Iterator<Item = u8> + 't {
        self.pattern
            .captures_iter(text)
            .filter_map(move |caps| parse_ball(&caps[1], &self.range))
    }

    /// Number of raw matches, regardless of range. Used for diagnostics.
    #[must_use]
    pub fn count_matches(&self, text: &str) -> usize {
        self.pattern.find_iter(text).count()
    }
}

/// Runs `patterns` in order, moving on to the next one only while fewer
/// than `wanted` balls have been collected. Results accumulate in
/// extraction order.
#[must_use]
pub fn cascade(patterns: &[BallPattern], text: &str, wanted: usize) -> Vec<u8> {
    let mut balls = Vec::new();
    for pattern in patterns {
        if balls.len() >= wanted {
            break;
        }
        balls.extend(pattern.extract(text));
    }
    balls
}

/// Splits extracted balls into `(main, bonus)`.
///
/// The first `picks` balls are the main numbers (sorted ascending). When a
/// bonus is expected the very next ball, in extraction order, is the bonus.
/// Returns `None` when fewer than `picks` balls were found or the main
/// numbers repeat.
#[must_use]
pub fn split_main_and_bonus(
    balls: &[u8],
    picks: usize,
    bonus: bool,
) -> Option<(Vec<u8>, Option<u8>)> {
    if balls.len() < picks {
        return None;
    }
    let mut main = balls[..picks].to_vec();
    main.sort_unstable();
    if !all_distinct(&main) {
        return None;
    }
    let bonus = if bonus {
        balls.get(picks).copied()
    } else {
        None
    };
    Some((main, bonus))
}
