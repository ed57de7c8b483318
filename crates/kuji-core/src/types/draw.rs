use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Date format used by composite keys and storage rows.
pub const ISO_DATE: &str = "%Y-%m-%d";

/// Builds the dedup/storage key: `YYYY-MM-DD_n1,n2,...`.
#[must_use]
pub fn composite_key(date: NaiveDate, numbers: &[u8]) -> String {
    let joined = numbers
        .iter()
        .map(u8::to_string)
        .collect::<Vec<_>>()
        .join(",");
    format!("{}_{joined}", date.format(ISO_DATE))
}

/// A drawing extracted from a source document, not yet bound to a game.
///
/// This is what the parsers emit. It becomes a [`DrawRecord`] once the
/// pipeline attaches the owning game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Draw {
    /// Calendar date of the drawing.
    pub date: NaiveDate,

    /// Main numbers, ascending.
    pub numbers: Vec<u8>,

    /// Supplementary number drawn from an independent pool.
    pub bonus: Option<u8>,
}

impl Draw {
    /// Creates a draw, putting `numbers` in canonical ascending order.
    ///
    /// A zero bonus is treated as absent.
    #[must_use]
    pub fn new(date: NaiveDate, mut numbers: Vec<u8>, bonus: Option<u8>) -> Self {
        numbers.sort_unstable();
        Self {
            date,
            numbers,
            bonus: bonus.filter(|b| *b > 0),
        }
    }

    /// Composite key used for deduplication.
    #[must_use]
    pub fn composite_key(&self) -> String {
        composite_key(self.date, &self.numbers)
    }

    /// Binds this draw to a game.
    #[must_use]
    pub fn into_record(self, game_id: impl Into<String>) -> DrawRecord {
        DrawRecord {
            game_id: game_id.into(),
            date: self.date,
            numbers: self.numbers,
            bonus: self.bonus,
        }
    }
}

/// The canonical unit of the store: one drawing of one game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrawRecord {
    /// Stable game identifier (e.g. `"powerball"`, `"ny"`).
    pub game_id: String,

    /// Calendar date of the drawing.
    pub date: NaiveDate,

    /// Main numbers, ascending and distinct.
    pub numbers: Vec<u8>,

    /// Supplementary number, present only for games that draw one.
    pub bonus: Option<u8>,
}

impl DrawRecord {
    /// Composite key used for deduplication and storage identity.
    ///
    /// Double-draw games produce two records per date; their numbers differ,
    /// so their keys differ too.
    #[must_use]
    pub fn composite_key(&self) -> String {
        composite_key(self.date, &self.numbers)
    }

    /// Borrowed storage row for this record.
    #[must_use]
    pub fn to_stored(&self) -> StoredDraw<'_> {
        StoredDraw {
            game_id: &self.game_id,
            draw_date: self.date,
            numbers: &self.numbers,
            bonus: self.bonus,
        }
    }
}

impl fmt::Display for DrawRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.game_id, self.date, self.numbers)?;
        if let Some(bonus) = self.bonus {
            write!(f, " +{bonus}")?;
        }
        Ok(())
    }
}

/// Wire shape of a stored draw: `{game_id, draw_date, numbers, bonus}`.
///
/// `bonus` serializes as `null` when absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StoredDraw<'a> {
    pub game_id: &'a str,
    pub draw_date: NaiveDate,
    pub numbers: &'a [u8],
    pub bonus: Option<u8>,
}
