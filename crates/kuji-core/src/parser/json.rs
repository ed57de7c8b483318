use std::collections::HashSet;

use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::Value;
use tracing::trace;

use crate::error::{KujiError, Result};
use crate::parser::balls::{all_distinct, parse_ball};
use crate::types::{Draw, DrawShape, ISO_DATE};

/// One row of an open-data draw endpoint.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct JsonDrawRow {
    /// `YYYY-MM-DD`, optionally followed by `T` and a time of day.
    pub draw_date: String,

    /// Space-separated numbers, main numbers first, optionally followed by
    /// the bonus.
    pub winning_numbers: String,

    /// Bonus ball published in a column of its own.
    #[serde(default, alias = "mega_ball", alias = "cash_ball")]
    pub bonus: Option<Value>,
}

/// Parses a JSON array of draw rows.
///
/// Rows that do not have the expected fields, or that fail the numeric
/// checks, are skipped without failing the batch. Because this source
/// publishes at most one draw per date, the result is deduplicated by date,
/// first row winning.
///
/// # Errors
///
/// Returns `KujiError::Json` if `text` is not JSON and
/// `KujiError::NotAnArray` if it is JSON but not an array.
pub fn parse_json(text: &str, shape: DrawShape) -> Result<Vec<Draw>> {
    let value: Value = serde_json::from_str(text)?;
    let Value::Array(items) = value else {
        return Err(KujiError::NotAnArray {
            found: json_type(&value),
        });
    };

    let rows = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<JsonDrawRow>(item) {
            Ok(row) => Some(row),
            Err(e) => {
                trace!(error = %e, "json row skipped: unexpected fields");
                None
            }
        });
    Ok(parse_rows(rows, shape))
}

/// Parses already-deserialized rows, deduplicating by date.
pub fn parse_rows(rows: impl IntoIterator<Item = JsonDrawRow>, shape: DrawShape) -> Vec<Draw> {
    let mut seen = HashSet::new();
    rows.into_iter()
        .filter_map(|row| parse_row(&row, shape))
        .filter(|draw| seen.insert(draw.date))
        .collect()
}

/// Converts one row into a draw, or `None` if it fails any check.
#[must_use]
pub fn parse_row(row: &JsonDrawRow, shape: DrawShape) -> Option<Draw> {
    let day = row.draw_date.split('T').next().unwrap_or_default().trim();
    let Ok(date) = NaiveDate::parse_from_str(day, ISO_DATE) else {
        trace!(draw_date = %row.draw_date, "json row skipped: bad date");
        return None;
    };

    let tokens: Vec<u8> = match row
        .winning_numbers
        .split_whitespace()
        .map(str::parse::<u8>)
        .collect::<std::result::Result<_, _>>()
    {
        Ok(tokens) => tokens,
        Err(_) => {
            trace!(%date, numbers = %row.winning_numbers, "json row skipped: unparsable numbers");
            return None;
        }
    };
    if tokens.len() < shape.picks {
        trace!(%date, found = tokens.len(), "json row skipped: too few numbers");
        return None;
    }

    let main = tokens[..shape.picks].to_vec();
    let range = shape.range();
    if main.iter().any(|n| !range.contains(n)) || !all_distinct(&main) {
        trace!(%date, ?main, "json row skipped: out of range or repeated");
        return None;
    }

    let bonus = if shape.bonus {
        tokens
            .get(shape.picks)
            .copied()
            .or_else(|| row.bonus.as_ref().and_then(bonus_from_value))
    } else {
        None
    };
    // Must run before the date dedup in `parse_rows`.
    if let Some(b) = bonus.filter(|&b| !shape.bonus_fits(b)) {
        trace!(%date, bonus = b, "json row skipped: bonus above ceiling");
        return None;
    }
    Some(Draw::new(date, main, bonus))
}

fn bonus_from_value(value: &Value) -> Option<u8> {
    match value {
        Value::String(s) => parse_ball(s, &(1..=u8::MAX)),
        Value::Number(n) => n.as_u64().and_then(|n| u8::try_from(n).ok()),
        _ => None,
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
