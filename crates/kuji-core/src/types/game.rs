use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::error::{KujiError, Result};

/// Highest number any supported game can draw. Parsers use it as a generic
/// safety bound before the game's own ceiling is known.
pub const SAFETY_CEILING: u8 = 99;

/// Where a game's results come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Source {
    /// Year pages of a results site, one HTML document per year.
    Html {
        /// Site path of the game, e.g. `"california/fantasy-5"`.
        path: String,
        /// Listing slug appended to the path, usually `"numbers"`.
        slug: String,
        /// Slug to try when the primary one cannot be fetched.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        alt_slug: Option<String>,
        /// First year worth walking back to during a backfill.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        start_year: Option<i32>,
    },
    /// Open-data CSV export, one row per date with one column per session.
    Csv {
        /// Export URL.
        url: String,
    },
    /// Open-data JSON API returning an array of rows.
    Json {
        /// Endpoint URL.
        url: String,
    },
}

/// Kind of document a [`Source`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Html,
    Csv,
    Json,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Html => write!(f, "html"),
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl Source {
    /// Returns the document kind this source produces.
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Html { .. } => SourceKind::Html,
            Self::Csv { .. } => SourceKind::Csv,
            Self::Json { .. } => SourceKind::Json,
        }
    }
}

/// Shape of one drawing: how many main numbers, their ceiling, and whether
/// a bonus number follows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DrawShape {
    /// Number of main numbers per drawing.
    pub picks: usize,
    /// Highest main number.
    pub max: u8,
    /// Whether a bonus number is drawn.
    pub bonus: bool,
    /// Highest bonus number, when known.
    pub bonus_max: Option<u8>,
}

impl DrawShape {
    /// Creates a shape with no bonus ceiling.
    #[must_use]
    pub fn new(picks: usize, max: u8, bonus: bool) -> Self {
        Self {
            picks,
            max,
            bonus,
            bonus_max: None,
        }
    }

    /// Sets the bonus ceiling.
    #[must_use]
    pub fn with_bonus_max(mut self, bonus_max: Option<u8>) -> Self {
        self.bonus_max = bonus_max;
        self
    }

    /// Whether `bonus` is within the bonus ceiling, if there is one.
    #[must_use]
    pub fn bonus_fits(&self, bonus: u8) -> bool {
        self.bonus_max.is_none_or(|max| bonus <= max)
    }

    /// Valid main-number range.
    #[must_use]
    pub fn range(&self) -> RangeInclusive<u8> {
        1..=self.max
    }
}

/// Static description of one lottery game and its data source.
///
/// Provided by configuration and never mutated by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSpec {
    /// Stable identifier, used as `game_id` in storage.
    pub id: String,

    /// Human-readable name.
    pub name: String,

    /// Number of main numbers per drawing.
    pub picks: usize,

    /// Highest main number.
    pub max: u8,

    /// Whether the game draws a bonus number.
    #[serde(default)]
    pub bonus: bool,

    /// Highest bonus number, when the game publishes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bonus_max: Option<u8>,

    /// Where results are fetched from.
    pub source: Source,
}

impl GameSpec {
    /// Draw shape used by the parsers.
    #[must_use]
    pub fn shape(&self) -> DrawShape {
        DrawShape::new(self.picks, self.max, self.bonus).with_bonus_max(self.bonus_max)
    }

    /// Checks that the definition is internally consistent.
    ///
    /// # Errors
    ///
    /// Returns `KujiError::InvalidGame` describing the first problem found.
    pub fn check(&self) -> Result<()> {
        let invalid = |reason: String| KujiError::InvalidGame {
            id: self.id.clone(),
            reason,
        };

        if self.id.trim().is_empty() {
            return Err(invalid("empty game id".into()));
        }
        if self.picks == 0 {
            return Err(invalid("picks must be at least 1".into()));
        }
        if self.max == 0 || self.max > SAFETY_CEILING {
            return Err(invalid(format!("max {} outside 1..={SAFETY_CEILING}", self.max)));
        }
        if self.picks > usize::from(self.max) {
            return Err(invalid(format!(
                "cannot draw {} distinct numbers from 1..={}",
                self.picks, self.max
            )));
        }
        if !self.bonus && self.bonus_max.is_some() {
            return Err(invalid("bonus_max set on a game without a bonus".into()));
        }
        if self.bonus_max == Some(0) {
            return Err(invalid("bonus_max must be at least 1".into()));
        }
        Ok(())
    }
}
