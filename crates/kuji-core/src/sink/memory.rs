use std::collections::BTreeMap;

use crate::sink::{DrawStore, StoreError, WriteMode};
use crate::types::DrawRecord;

/// In-process store, keyed the same way as the persistent ones.
///
/// Useful for dry runs and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    rows: BTreeMap<(String, String), DrawRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stored records in `(game_id, composite key)` order.
    pub fn records(&self) -> impl Iterator<Item = &DrawRecord> {
        self.rows.values()
    }

    /// Number of stored records for one game.
    pub fn count(&self, game_id: &str) -> usize {
        self.rows.keys().filter(|(game, _)| game == game_id).count()
    }
}

impl DrawStore for MemoryStore {
    async fn upsert_batch(
        &mut self,
        game_id: &str,
        records: &[DrawRecord],
        mode: WriteMode,
    ) -> Result<usize, StoreError> {
        let mut written = 0;
        for record in records {
            let key = (game_id.to_string(), record.composite_key());
            match mode {
                WriteMode::Merge => {
                    self.rows.insert(key, record.clone());
                    written += 1;
                }
                WriteMode::IgnoreDuplicates => {
                    if !self.rows.contains_key(&key) {
                        self.rows.insert(key, record.clone());
                        written += 1;
                    }
                }
            }
        }
        Ok(written)
    }
}
