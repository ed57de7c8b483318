use chrono::NaiveDate;
use regex::Regex;
use tracing::trace;

use crate::error::Result;
use crate::parser::balls::{all_distinct, parse_ball};
use crate::types::{Draw, DrawShape};

/// Column positions of an open-data CSV export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvLayout {
    /// Column holding the `MM/DD/YYYY` draw date.
    pub date_column: usize,
    /// Columns holding whitespace-separated winning numbers, one per session.
    pub session_columns: Vec<usize>,
}

impl Default for CsvLayout {
    /// `Draw Date, Evening Numbers, Evening Bonus, Midday Numbers, Midday Bonus`.
    fn default() -> Self {
        Self {
            date_column: 0,
            session_columns: vec![1, 3],
        }
    }
}

/// Parses CSV exports where each row is a calendar date that may carry
/// several independent sessions (e.g. midday and evening).
///
/// Each valid session becomes its own draw, so a double-draw game yields
/// two draws sharing a date. A bad session never affects its siblings.
/// This source has no bonus number.
pub struct CsvDrawParser {
    layout: CsvLayout,
    re_date: Regex,
}

impl CsvDrawParser {
    /// Constructs a parser for the default layout.
    ///
    /// # Errors
    ///
    /// Returns `KujiError::RegexError` if the date pattern fails to compile.
    pub fn new() -> Result<Self> {
        Self::with_layout(CsvLayout::default())
    }

    /// Constructs a parser for a custom column layout.
    ///
    /// # Errors
    ///
    /// Returns `KujiError::RegexError` if the date pattern fails to compile.
    pub fn with_layout(layout: CsvLayout) -> Result<Self> {
        Ok(Self {
            layout,
            re_date: Regex::new(r"(\d{2})/(\d{2})/(\d{4})")?,
        })
    }

    /// Extracts draws from `csv`. The first line is a header and is skipped.
    #[must_use]
    pub fn parse(&self, csv: &str, shape: DrawShape) -> Vec<Draw> {
        csv.lines()
            .skip(1)
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .flat_map(|line| self.parse_line(line, shape))
            .collect()
    }

    fn parse_line(&self, line: &str, shape: DrawShape) -> Vec<Draw> {
        let fields: Vec<&str> = line.split(',').map(unquote).collect();
        if fields.len() < 2 {
            return Vec::new();
        }
        let Some(date) = fields
            .get(self.layout.date_column)
            .and_then(|field| self.parse_date(field))
        else {
            trace!(line, "csv row skipped: no MM/DD/YYYY date");
            return Vec::new();
        };

        self.layout
            .session_columns
            .iter()
            .filter_map(|column| fields.get(*column))
            .filter(|field| !field.is_empty())
            .filter_map(|field| parse_session(field, shape))
            .map(|numbers| Draw::new(date, numbers, None))
            .collect()
    }

    fn parse_date(&self, field: &str) -> Option<NaiveDate> {
        let caps = self.re_date.captures(field)?;
        let month = caps[1].parse().ok()?;
        let day = caps[2].parse().ok()?;
        let year = caps[3].parse().ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

fn unquote(field: &str) -> &str {
    field.trim().trim_matches('"').trim()
}

/// In-range tokens of one session, accepted only if exactly `picks` distinct
/// numbers remain.
fn parse_session(field: &str, shape: DrawShape) -> Option<Vec<u8>> {
    let range = shape.range();
    let numbers: Vec<u8> = field
        .split_whitespace()
        .filter_map(|token| parse_ball(token, &range))
        .collect();
    (numbers.len() == shape.picks && all_distinct(&numbers)).then_some(numbers)
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: &str = "\"Draw Date\",\"Evening Winning Numbers\",\"Evening Bonus #\",\"Midday Winning Numbers\",\"Midday Bonus #\"";

    fn parser() -> CsvDrawParser {
        CsvDrawParser::new().unwrap()
    }

    fn take5() -> DrawShape {
        DrawShape::new(5, 39, false)
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn double_draw_row_yields_two_draws() {
        let csv = format!("{HEADER}\n\"02/19/2026\",\"3 8 15 22 27\",\"\",\"1 5 9 14 33\",\"\"\n");
        let draws = parser().parse(&csv, take5());
        assert_eq!(
            draws,
            vec![
                Draw::new(date(2026, 2, 19), vec![3, 8, 15, 22, 27], None),
                Draw::new(date(2026, 2, 19), vec![1, 5, 9, 14, 33], None),
            ]
        );
        assert_ne!(draws[0].composite_key(), draws[1].composite_key());
    }

    #[test]
    fn bad_session_does_not_affect_sibling() {
        let csv = format!(
            "{HEADER}\n\"02/18/2026\",\"3 8 15 22 40\",\"\",\"1 5 9 14 33\",\"\"\n\"02/17/2026\",\"2 2 15 22 27\",\"\",\"\",\"\""
        );
        let draws = parser().parse(&csv, take5());
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].numbers, vec![1, 5, 9, 14, 33]);
    }

    #[test]
    fn numbers_are_sorted_and_windows_line_endings_tolerated() {
        let csv = format!("{HEADER}\r\n\"01/02/2026\",\"27 3 22 8 15\",\"\",\"\",\"\"\r\n");
        let draws = parser().parse(&csv, take5());
        assert_eq!(draws[0].numbers, vec![3, 8, 15, 22, 27]);
        assert_eq!(draws[0].date, date(2026, 1, 2));
    }

    #[test]
    fn rows_without_a_valid_date_are_skipped() {
        let csv = format!(
            "{HEADER}\n\"2026-02-19\",\"3 8 15 22 27\"\n\"13/45/2026\",\"3 8 15 22 27\"\n\n\"lonely\""
        );
        assert!(parser().parse(&csv, take5()).is_empty());
    }

    #[test]
    fn header_only_document_is_empty() {
        assert!(parser().parse(HEADER, take5()).is_empty());
        assert!(parser().parse("", take5()).is_empty());
    }

    #[test]
    fn custom_layout() {
        let layout = CsvLayout {
            date_column: 1,
            session_columns: vec![0],
        };
        let parser = CsvDrawParser::with_layout(layout).unwrap();
        let draws = parser.parse("numbers,date\n1 2 3 4 5,03/01/2026", take5());
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].date, date(2026, 3, 1));
    }
}
