use std::collections::HashSet;

use crate::types::DrawRecord;

/// Drops records whose composite key (`date_numbers`) was already seen.
///
/// The first record per key wins; later ones are dropped silently. Because
/// the key includes the numbers, the two sessions of a double-draw game
/// survive while a re-ingested overlap does not.
#[derive(Debug, Default, Clone)]
pub struct Deduplicator {
    seen: HashSet<String>,
    dropped: usize,
}

impl Deduplicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time a key is offered.
    pub fn admit(&mut self, record: &DrawRecord) -> bool {
        let fresh = self.seen.insert(record.composite_key());
        if !fresh {
            self.dropped += 1;
        }
        fresh
    }

    /// Keeps the first record per key, preserving input order.
    pub fn dedup(&mut self, records: Vec<DrawRecord>) -> Vec<DrawRecord> {
        records.into_iter().filter(|r| self.admit(r)).collect()
    }

    /// Number of records dropped so far.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    /// Number of distinct keys seen so far.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// One-shot dedup of a batch.
#[must_use]
pub fn dedup_records(records: Vec<DrawRecord>) -> Vec<DrawRecord> {
    Deduplicator::new().dedup(records)
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::types::Draw;

    fn record(day: u32, numbers: &[u8]) -> DrawRecord {
        Draw::new(
            NaiveDate::from_ymd_opt(2026, 2, day).unwrap(),
            numbers.to_vec(),
            None,
        )
        .into_record("ny")
    }

    #[test]
    fn keeps_first_record_per_key() {
        let mut first = record(19, &[3, 8, 15, 22, 27]);
        first.bonus = Some(1);
        let records = vec![
            first.clone(),
            record(18, &[1, 2, 3, 4, 5]),
            record(19, &[27, 22, 15, 8, 3]),
        ];
        let mut dedup = Deduplicator::new();
        let kept = dedup.dedup(records);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0], first);
        assert_eq!(dedup.dropped(), 1);
        assert_eq!(dedup.len(), 2);
    }

    #[test]
    fn double_draw_sessions_survive() {
        let kept = dedup_records(vec![
            record(19, &[3, 8, 15, 22, 27]),
            record(19, &[1, 5, 9, 14, 33]),
        ]);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn state_carries_across_batches() {
        let mut dedup = Deduplicator::new();
        assert_eq!(dedup.dedup(vec![record(19, &[3, 8, 15, 22, 27])]).len(), 1);
        assert!(dedup.dedup(vec![record(19, &[3, 8, 15, 22, 27])]).is_empty());
        assert!(!dedup.is_empty());
    }
}
