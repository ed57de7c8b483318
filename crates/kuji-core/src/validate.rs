use std::collections::HashSet;
use std::ops::RangeInclusive;

use thiserror::Error;

use crate::types::{DrawRecord, GameSpec};

/// Why a candidate draw was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected {expected} main numbers, found {found}")]
    WrongCount { expected: usize, found: usize },

    #[error("main number {number} appears more than once")]
    Repeated { number: u8 },

    #[error("main number {number} outside 1..={max}")]
    OutOfRange { number: u8, max: u8 },

    #[error("main numbers are not in ascending order")]
    Unsorted,

    #[error("bonus {bonus} outside 1..={max}")]
    BonusOutOfRange { bonus: u8, max: u8 },

    #[error("game draws no bonus number, found {bonus}")]
    UnexpectedBonus { bonus: u8 },
}

/// The last gate before a draw counts as valid, applied the same way to
/// every source.
///
/// Main numbers must be exactly `picks` distinct ascending values inside
/// `1..=max`. A bonus is accepted only for games that draw one and, when the
/// game publishes a bonus ceiling, only inside `1..=bonus_max`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Validator {
    picks: usize,
    range: RangeInclusive<u8>,
    bonus: bool,
    bonus_max: Option<u8>,
}

impl Validator {
    /// Builds the validator for one game.
    #[must_use]
    pub fn for_game(game: &GameSpec) -> Self {
        Self {
            picks: game.picks,
            range: 1..=game.max,
            bonus: game.bonus,
            bonus_max: game.bonus_max,
        }
    }

    /// Checks one record.
    ///
    /// # Errors
    ///
    /// Returns the first rule the record breaks.
    pub fn validate(&self, record: &DrawRecord) -> Result<(), ValidationError> {
        self.check(&record.numbers, record.bonus)
    }

    /// Checks a set of main numbers and an optional bonus.
    ///
    /// # Errors
    ///
    /// Returns the first rule the numbers break.
    pub fn check(&self, numbers: &[u8], bonus: Option<u8>) -> Result<(), ValidationError> {
        if numbers.len() != self.picks {
            return Err(ValidationError::WrongCount {
                expected: self.picks,
                found: numbers.len(),
            });
        }
        if let Some(number) = numbers.iter().find(|n| !self.range.contains(n)) {
            return Err(ValidationError::OutOfRange {
                number: *number,
                max: *self.range.end(),
            });
        }
        let mut seen = HashSet::with_capacity(numbers.len());
        if let Some(number) = numbers.iter().find(|n| !seen.insert(**n)) {
            return Err(ValidationError::Repeated { number: *number });
        }
        if numbers.windows(2).any(|w| w[0] > w[1]) {
            return Err(ValidationError::Unsorted);
        }

        match (bonus, self.bonus, self.bonus_max) {
            (Some(bonus), false, _) => Err(ValidationError::UnexpectedBonus { bonus }),
            (Some(bonus), true, Some(max)) if !(1..=max).contains(&bonus) => {
                Err(ValidationError::BonusOutOfRange { bonus, max })
            }
            _ => Ok(()),
        }
    }
}
