use chrono::NaiveDate;
use regex::{Captures, Regex};
use tracing::{debug, trace};

use crate::error::Result;
use crate::parser::balls::{cascade, split_main_and_bonus, BallPattern};
use crate::types::{Draw, DrawShape, SAFETY_CEILING};

/// Month names accepted in textual dates, January first.
const MONTHS: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Proximity constants for the section strategy, plus the numeric bounds
/// both strategies apply before the game's own ceiling is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HtmlParserConfig {
    /// Two occurrences of the same date closer than this (bytes) are one header.
    pub dedup_distance: usize,
    /// Longest stretch of text (bytes) searched for the numbers of one date.
    pub window: usize,
    /// Upper bound for main numbers emitted by the row strategy.
    pub safety_ceiling: u8,
    /// Upper bound for table-cell and section numbers.
    pub cell_ceiling: u8,
}

impl Default for HtmlParserConfig {
    fn default() -> Self {
        Self {
            dedup_distance: 50,
            window: 2000,
            safety_ceiling: SAFETY_CEILING,
            cell_ceiling: 70,
        }
    }
}

impl HtmlParserConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum section window.
    pub fn with_window(mut self, window: usize) -> Self {
        self.window = window.max(1);
        self
    }
}

/// A date found somewhere in the document, with its byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct DateAnchor {
    pos: usize,
    date: NaiveDate,
}

/// Structural counts of a document, logged when nothing could be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageStats {
    pub bytes: usize,
    pub rows: usize,
    pub list_items: usize,
    pub text_dates: usize,
    pub path_dates: usize,
}

/// Extracts draws from result pages whose markup has no stable schema.
///
/// Two strategies run in order:
///
/// 1. **Rows**: the document is cut at every `<tr>`; each row that carries a
///    date yields at most one draw, its numbers taken from list items, then
///    ball-classed spans, then bare numeric cells.
/// 2. **Sections**: only when the row strategy found nothing in the whole
///    document. Every date occurrence opens a window that runs to the next
///    date (or the configured cap), and numbers are taken from list items,
///    then any numeric span, inside that window.
///
/// Expects text that has already been through
/// [`DocumentNormalizer`](crate::normalize::DocumentNormalizer).
pub struct HtmlDrawParser {
    config: HtmlParserConfig,
    re_row: Regex,
    re_path_date: Regex,
    re_text_date: Regex,
    row_patterns: [BallPattern; 3],
    section_patterns: [BallPattern; 2],
}

impl HtmlDrawParser {
    /// Constructs a parser with the default proximity constants.
    ///
    /// # Errors
    ///
    /// Returns `KujiError::RegexError` if any pattern fails to compile
    /// (should never happen with the static patterns defined here).
    pub fn new() -> Result<Self> {
        Self::with_config(HtmlParserConfig::default())
    }

    /// Constructs a parser with custom proximity constants.
    ///
    /// # Errors
    ///
    /// Returns `KujiError::RegexError` if any pattern fails to compile.
    pub fn with_config(config: HtmlParserConfig) -> Result<Self> {
        let cells = 1..=config.cell_ceiling;
        Ok(Self {
            re_row: Regex::new(r"(?i)<tr[\s>]")?,
            re_path_date: Regex::new(r"(?:numbers|results)/(\d{2})-(\d{2})-(\d{4})")?,
            re_text_date: Regex::new(
                r"(?i)(?:sunday|monday|tuesday|wednesday|thursday|friday|saturday)\s+(\w+)\s+(\d{1,2})(?:st|nd|rd|th)?,?\s+(\d{4})",
            )?,
            row_patterns: [
                BallPattern::new(r"(?i)<li[^>]*>\s*(\d{1,2})\s*</li>", 0..=u8::MAX)?,
                BallPattern::new(
                    r#"(?i)<span[^>]*class="[^"]*(?:ball|number|result)[^"]*"[^>]*>\s*(\d{1,2})\s*</span>"#,
                    0..=u8::MAX,
                )?,
                BallPattern::new(r"(?i)<td[^>]*>\s*(\d{1,2})\s*</td>", cells.clone())?,
            ],
            section_patterns: [
                BallPattern::new(r"(?i)<li[^>]*>\s*(\d{1,2})\s*</li>", cells.clone())?,
                BallPattern::new(r"(?i)<span[^>]*>\s*(\d{1,2})\s*</span>", cells)?,
            ],
            config,
        })
    }

    /// Extracts every draw in `html`.
    ///
    /// The section strategy runs only if the row strategy produced nothing
    /// for the whole document.
    #[must_use]
    pub fn parse(&self, html: &str, shape: DrawShape) -> Vec<Draw> {
        let draws = self.parse_rows(html, shape);
        if !draws.is_empty() {
            debug!(count = draws.len(), "row strategy matched");
            return draws;
        }

        let draws = self.parse_sections(html, shape);
        debug!(count = draws.len(), "row strategy found nothing, section strategy used");
        draws
    }

    /// Row strategy: one candidate draw per dated `<tr>` segment.
    ///
    /// Text before the first row boundary is not a row and is ignored.
    #[must_use]
    pub fn parse_rows(&self, html: &str, shape: DrawShape) -> Vec<Draw> {
        self.re_row
            .split(html)
            // Preamble: a "latest result" banner ahead of the table is not a row.
            .skip(1)
            .filter_map(|row| self.parse_row(row, shape))
            .collect()
    }

    fn parse_row(&self, row: &str, shape: DrawShape) -> Option<Draw> {
        let date = self.row_date(row)?;
        let balls = cascade(&self.row_patterns, row, shape.picks);
        let Some((main, bonus)) = split_main_and_bonus(&balls, shape.picks, shape.bonus) else {
            trace!(%date, found = balls.len(), "row skipped: too few or repeated numbers");
            return None;
        };
        if main
            .iter()
            .any(|n| *n < 1 || *n > self.config.safety_ceiling)
        {
            trace!(%date, ?main, "row skipped: number outside safety bound");
            return None;
        }
        Some(Draw::new(date, main, bonus))
    }

    /// A path-embedded date wins over a textual one.
    fn row_date(&self, row: &str) -> Option<NaiveDate> {
        self.re_path_date
            .captures_iter(row)
            .find_map(|caps| path_date(&caps))
            .or_else(|| {
                self.re_text_date
                    .captures_iter(row)
                    .find_map(|caps| text_date(&caps))
            })
    }

    /// Section strategy: one candidate draw per retained date occurrence.
    #[must_use]
    pub fn parse_sections(&self, html: &str, shape: DrawShape) -> Vec<Draw> {
        let anchors = self.date_anchors(html);
        let mut draws = Vec::new();

        for (i, anchor) in anchors.iter().enumerate() {
            let capped = anchor.pos.saturating_add(self.config.window);
            let end = anchors
                .get(i + 1)
                .map_or(capped, |next| next.pos.min(capped));
            let window = &html[anchor.pos..floor_char_boundary(html, end)];

            let balls = cascade(&self.section_patterns, window, shape.picks);
            let Some((main, bonus)) = split_main_and_bonus(&balls, shape.picks, shape.bonus)
            else {
                trace!(date = %anchor.date, found = balls.len(), "section skipped");
                continue;
            };
            if main
                .iter()
                .all(|n| (1..=self.config.cell_ceiling).contains(n))
            {
                draws.push(Draw::new(anchor.date, main, bonus));
            }
        }

        draws
    }

    /// Every textual and path-embedded date in document order, with repeated
    /// mentions of the same date in close succession collapsed into one.
    fn date_anchors(&self, html: &str) -> Vec<DateAnchor> {
        let mut found: Vec<DateAnchor> = self
            .re_text_date
            .captures_iter(html)
            .filter_map(|caps| anchor(&caps, text_date))
            .chain(
                self.re_path_date
                    .captures_iter(html)
                    .filter_map(|caps| anchor(&caps, path_date)),
            )
            .collect();
        found.sort_by_key(|a| a.pos);

        let mut retained: Vec<DateAnchor> = Vec::with_capacity(found.len());
        for candidate in found {
            let near_repeat = retained.last().is_some_and(|last| {
                last.date == candidate.date
                    && candidate.pos - last.pos <= self.config.dedup_distance
            });
            if !near_repeat {
                retained.push(candidate);
            }
        }
        retained
    }

    /// Counts the structures both strategies look for.
    #[must_use]
    pub fn page_stats(&self, html: &str) -> PageStats {
        PageStats {
            bytes: html.len(),
            rows: self.re_row.find_iter(html).count(),
            list_items: self.section_patterns[0].count_matches(html),
            text_dates: self.re_text_date.find_iter(html).count(),
            path_dates: self.re_path_date.find_iter(html).count(),
        }
    }
}

fn anchor(caps: &Captures<'_>, to_date: fn(&Captures<'_>) -> Option<NaiveDate>) -> Option<DateAnchor> {
    let pos = caps.get(0)?.start();
    to_date(caps).map(|date| DateAnchor { pos, date })
}

/// `MM-DD-YYYY` captured from a results path.
fn path_date(caps: &Captures<'_>) -> Option<NaiveDate> {
    let month = caps[1].parse().ok()?;
    let day = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// `<Weekday> <Month> <Day>[suffix], <Year>` captured from text.
fn text_date(caps: &Captures<'_>) -> Option<NaiveDate> {
    let month = month_number(&caps[1])?;
    let day = caps[2].parse().ok()?;
    let year = caps[3].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

fn month_number(name: &str) -> Option<u32> {
    MONTHS
        .iter()
        .position(|m| m.eq_ignore_ascii_case(name))
        .and_then(|i| u32::try_from(i + 1).ok())
}

fn floor_char_boundary(text: &str, index: usize) -> usize {
    let mut index = index.min(text.len());
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> HtmlDrawParser {
        HtmlDrawParser::new().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn li(numbers: &[u8]) -> String {
        numbers.iter().map(|n| format!("<li>{n}</li>")).collect()
    }

    #[test]
    fn row_with_path_date_and_list_items() {
        let html = format!(
            r#"<table><tr><td><a href="/california/fantasy-5/numbers/02-19-2026">Results</a></td><td><ul>{}</ul></td></tr></table>"#,
            li(&[3, 8, 15, 22, 27])
        );
        let draws = parser().parse(&html, DrawShape::new(5, 39, false));
        assert_eq!(
            draws,
            vec![Draw::new(date(2026, 2, 19), vec![3, 8, 15, 22, 27], None)]
        );
    }

    #[test]
    fn row_numbers_are_sorted_and_bonus_keeps_draw_order() {
        let html = format!(
            "<tr><td>Wednesday February 18, 2026</td><td>{}</td></tr>",
            li(&[47, 5, 19, 33, 2, 11])
        );
        let draws = parser().parse(&html, DrawShape::new(5, 47, true));
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].numbers, vec![2, 5, 19, 33, 47]);
        assert_eq!(draws[0].bonus, Some(11));
    }

    #[test]
    fn one_draw_per_dated_row() {
        let mut html = String::from("<table><tr><th>Date</th><th>Numbers</th></tr>");
        for (day, numbers) in [(17, [1, 2, 3, 4, 5]), (18, [6, 7, 8, 9, 10]), (19, [11, 12, 13, 14, 15])] {
            html.push_str(&format!(
                r#"<tr><td><a href="/x/numbers/02-{day}-2026">Feb {day}</a></td><td>{}</td></tr>"#,
                li(&numbers)
            ));
        }
        html.push_str("</table>");

        let draws = parser().parse(&html, DrawShape::new(5, 39, false));
        assert_eq!(draws.len(), 3);
        for draw in &draws {
            assert!(draw.numbers.windows(2).all(|w| w[0] < w[1]));
            assert!(draw.numbers.iter().all(|n| (1..=39).contains(n)));
        }
        assert_eq!(draws[2].date, date(2026, 2, 19));
    }

    #[test]
    fn banner_before_first_row_is_ignored() {
        let html = format!(
            r#"<div class="latest"><a href="/x/numbers/02-20-2026">Latest</a>{}</div>
            <table><tr><td><a href="/x/numbers/02-19-2026">Feb 19</a></td><td>{}</td></tr></table>"#,
            li(&[2, 4, 6, 8, 10]),
            li(&[3, 8, 15, 22, 27])
        );
        let draws = parser().parse_rows(&html, DrawShape::new(5, 39, false));
        assert_eq!(
            draws,
            vec![Draw::new(date(2026, 2, 19), vec![3, 8, 15, 22, 27], None)]
        );
    }

    #[test]
    fn line_broken_weekday_date_parses_after_normalization() {
        let raw = format!(
            "<tr><td>Thursday <br>February 19, 2026</td><td>{}</td></tr>",
            li(&[1, 9, 17, 25, 33])
        );
        let normalized = crate::normalize::DocumentNormalizer::new()
            .unwrap()
            .normalize(&raw);
        let draws = parser().parse(&normalized, DrawShape::new(5, 39, false));
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].date, date(2026, 2, 19));
    }

    #[test]
    fn rows_fall_back_to_ball_spans_then_cells() {
        let shape = DrawShape::new(5, 39, false);
        let spans = r#"<tr><td>Monday March 2, 2026</td><td><span class="draw-ball">4</span><span class="draw-ball">9</span><span class="draw-ball">16</span><span class="draw-ball">25</span><span class="draw-ball">36</span></td></tr>"#;
        let draws = parser().parse(spans, shape);
        assert_eq!(draws[0].numbers, vec![4, 9, 16, 25, 36]);

        let cells = r#"<tr><td>Monday March 2, 2026</td><td>4</td><td>9</td><td>16</td><td>25</td><td>36</td></tr>"#;
        let draws = parser().parse(cells, shape);
        assert_eq!(draws[0].numbers, vec![4, 9, 16, 25, 36]);
    }

    #[test]
    fn undated_rows_are_skipped() {
        let html = format!("<tr><td>Jackpot</td><td>{}</td></tr>", li(&[1, 2, 3, 4, 5]));
        assert!(parser().parse_rows(&html, DrawShape::new(5, 39, false)).is_empty());
    }

    #[test]
    fn row_with_repeated_number_is_rejected() {
        let html = format!(
            "<tr><td>Tuesday March 3, 2026</td>{}</tr>",
            li(&[4, 9, 9, 25, 36])
        );
        assert!(parser().parse_rows(&html, DrawShape::new(5, 39, false)).is_empty());
    }

    #[test]
    fn extra_trailing_number_is_ignored_without_bonus() {
        let html = format!(
            "<tr><td>Tuesday March 3, 2026</td>{}</tr>",
            li(&[4, 9, 12, 25, 36, 38])
        );
        let draws = parser().parse_rows(&html, DrawShape::new(5, 39, false));
        assert_eq!(draws[0].numbers, vec![4, 9, 12, 25, 36]);
        assert_eq!(draws[0].bonus, None);
    }

    #[test]
    fn zero_in_main_numbers_rejects_the_row() {
        let html = format!(
            "<tr><td>Tuesday March 3, 2026</td>{}</tr>",
            li(&[0, 9, 12, 25, 36])
        );
        assert!(parser().parse_rows(&html, DrawShape::new(5, 39, false)).is_empty());
    }

    #[test]
    fn impossible_calendar_dates_are_skipped() {
        let html = format!(
            r#"<tr><td><a href="/x/numbers/02-30-2026">x</a></td>{}</tr>"#,
            li(&[1, 2, 3, 4, 5])
        );
        assert!(parser().parse_rows(&html, DrawShape::new(5, 39, false)).is_empty());
    }

    #[test]
    fn section_fallback_recovers_one_draw_per_header() {
        let html = format!(
            "<div class=\"results\">\
             <h3>Thursday February 19, 2026</h3><ul>{}</ul>\
             <h3>Wednesday February 18th, 2026</h3><ul>{}</ul>\
             </div>",
            li(&[3, 8, 15, 22, 27]),
            li(&[1, 6, 11, 30, 39])
        );
        let shape = DrawShape::new(5, 39, false);
        assert!(parser().parse_rows(&html, shape).is_empty());

        let draws = parser().parse(&html, shape);
        assert_eq!(
            draws,
            vec![
                Draw::new(date(2026, 2, 19), vec![3, 8, 15, 22, 27], None),
                Draw::new(date(2026, 2, 18), vec![1, 6, 11, 30, 39], None),
            ]
        );
    }

    #[test]
    fn section_fallback_uses_plain_spans() {
        let html = "<h2>Friday March 6, 2026</h2><span>5</span><span>10</span><span>20</span><span>31</span><span>2</span>";
        let draws = parser().parse(html, DrawShape::new(5, 39, false));
        assert_eq!(draws[0].numbers, vec![2, 5, 10, 20, 31]);
    }

    #[test]
    fn section_strategy_skipped_when_rows_match() {
        let html = format!(
            "<h3>Friday March 6, 2026</h3>{}<table><tr><td>Thursday March 5, 2026</td>{}</tr></table>",
            li(&[5, 10, 20, 31, 2]),
            li(&[1, 2, 3, 4, 5])
        );
        let draws = parser().parse(&html, DrawShape::new(5, 39, false));
        assert_eq!(draws.len(), 1);
        assert_eq!(draws[0].date, date(2026, 3, 5));
    }

    #[test]
    fn nearby_repeats_of_a_date_collapse() {
        let html = format!(
            r#"<a href="/x/numbers/03-06-2026">Friday March 6, 2026</a>{}"#,
            li(&[1, 2, 3, 4, 5])
        );
        let draws = parser().parse_sections(&html, DrawShape::new(5, 39, false));
        assert_eq!(draws.len(), 1);
    }

    #[test]
    fn section_window_is_capped() {
        let filler = "x".repeat(3000);
        let html = format!("<h3>Friday March 6, 2026</h3>{filler}{}", li(&[1, 2, 3, 4, 5]));
        let shape = DrawShape::new(5, 39, false);
        assert!(parser().parse_sections(&html, shape).is_empty());

        let wide = HtmlDrawParser::with_config(HtmlParserConfig::new().with_window(4000)).unwrap();
        assert_eq!(wide.parse_sections(&html, shape).len(), 1);
    }

    #[test]
    fn section_window_respects_multibyte_text() {
        let filler = "é".repeat(1500);
        let html = format!("<h3>Friday March 6, 2026</h3>{filler}");
        assert!(parser().parse_sections(&html, DrawShape::new(5, 39, false)).is_empty());
    }

    #[test]
    fn section_numbers_above_cell_ceiling_are_ignored() {
        let html = format!("<h3>Friday March 6, 2026</h3>{}", li(&[71, 1, 2, 3, 4, 5]));
        let draws = parser().parse_sections(&html, DrawShape::new(5, 39, false));
        assert_eq!(draws[0].numbers, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn page_stats_counts_structures() {
        let html = format!(
            r#"<tr><td><a href="/x/numbers/03-06-2026">Friday March 6, 2026</a></td>{}</tr>"#,
            li(&[1, 2, 3])
        );
        let stats = parser().page_stats(&html);
        assert_eq!(stats.rows, 1);
        assert_eq!(stats.list_items, 3);
        assert_eq!(stats.text_dates, 1);
        assert_eq!(stats.path_dates, 1);
        assert_eq!(stats.bytes, html.len());
    }

    #[test]
    fn month_lookup() {
        assert_eq!(month_number("February"), Some(2));
        assert_eq!(month_number("DECEMBER"), Some(12));
        assert_eq!(month_number("Evening"), None);
    }
}
