//! Local SQLite back end.

use std::path::Path;

use chrono::NaiveDate;
use kuji_core::{DrawRecord, DrawStore, StoreError, WriteMode, ISO_DATE};
use rusqlite::types::Type;
use rusqlite::{params, Connection, ErrorCode};
use tracing::debug;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS draws (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    game_id TEXT NOT NULL,
    draw_date TEXT NOT NULL,
    numbers TEXT NOT NULL,
    bonus INTEGER,
    created_at DATETIME DEFAULT CURRENT_TIMESTAMP,
    UNIQUE (game_id, draw_date, numbers)
);
CREATE INDEX IF NOT EXISTS draws_game_date ON draws (game_id, draw_date);";

const MERGE: &str = "INSERT INTO draws (game_id, draw_date, numbers, bonus) VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT (game_id, draw_date, numbers) DO UPDATE SET bonus = excluded.bonus";

const IGNORE_DUPLICATES: &str =
    "INSERT OR IGNORE INTO draws (game_id, draw_date, numbers, bonus) VALUES (?1, ?2, ?3, ?4)";

/// Draw store backed by a single SQLite file.
///
/// Rows are unique on `(game_id, draw_date, numbers)`, with `numbers` kept
/// as a JSON array so the same text identifies the same draw everywhere.
/// Each batch runs in one transaction.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) the database at `path`, creating parent
    /// directories as needed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transport` if the file cannot be opened and
    /// `StoreError::Rejected` if the schema cannot be applied.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| StoreError::Transport(format!("{}: {e}", parent.display())))?;
        }
        let conn = Connection::open(path).map_err(map_error)?;
        debug!(path = %path.display(), "sqlite store opened");
        Self::with_connection(conn)
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// See [`SqliteStore::open`].
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory().map_err(map_error)?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA).map_err(map_error)?;
        Ok(Self { conn })
    }

    /// Number of stored draws for `game_id`.
    ///
    /// # Errors
    ///
    /// Returns the mapped SQLite error.
    pub fn count(&self, game_id: &str) -> Result<usize, StoreError> {
        let n: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM draws WHERE game_id = ?1",
                [game_id],
                |row| row.get(0),
            )
            .map_err(map_error)?;
        Ok(usize::try_from(n).unwrap_or_default())
    }

    /// Stored draws for `game_id`, oldest first.
    ///
    /// # Errors
    ///
    /// Returns the mapped SQLite error, including rows that no longer decode.
    pub fn records(&self, game_id: &str) -> Result<Vec<DrawRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT draw_date, numbers, bonus FROM draws
                 WHERE game_id = ?1 ORDER BY draw_date, numbers",
            )
            .map_err(map_error)?;
        let rows = stmt
            .query_map([game_id], |row| {
                let date: String = row.get(0)?;
                let numbers: String = row.get(1)?;
                Ok(DrawRecord {
                    game_id: game_id.to_string(),
                    date: NaiveDate::parse_from_str(&date, ISO_DATE).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e))
                    })?,
                    numbers: serde_json::from_str(&numbers).map_err(|e| {
                        rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e))
                    })?,
                    bonus: row.get(2)?,
                })
            })
            .map_err(map_error)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(map_error)
    }
}

impl DrawStore for SqliteStore {
    async fn upsert_batch(
        &mut self,
        game_id: &str,
        records: &[DrawRecord],
        mode: WriteMode,
    ) -> Result<usize, StoreError> {
        let sql = match mode {
            WriteMode::Merge => MERGE,
            WriteMode::IgnoreDuplicates => IGNORE_DUPLICATES,
        };

        let tx = self.conn.transaction().map_err(map_error)?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare_cached(sql).map_err(map_error)?;
            for record in records {
                written += stmt
                    .execute(params![
                        game_id,
                        record.date.format(ISO_DATE).to_string(),
                        numbers_json(&record.numbers),
                        record.bonus,
                    ])
                    .map_err(map_error)?;
            }
        }
        tx.commit().map_err(map_error)?;

        debug!(game = game_id, ?mode, written, "sqlite batch committed");
        Ok(written)
    }
}

fn numbers_json(numbers: &[u8]) -> String {
    serde_json::Value::from(numbers.to_vec()).to_string()
}

/// Uniqueness violations become conflicts; any other engine failure is a
/// rejection carrying the extended result code.
fn map_error(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::SqliteFailure(err, msg)
            if err.code == ErrorCode::ConstraintViolation
                && matches!(
                    err.extended_code,
                    rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                        | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
                ) =>
        {
            StoreError::Conflict(msg.unwrap_or_else(|| err.to_string()))
        }
        rusqlite::Error::SqliteFailure(err, msg) => StoreError::Rejected {
            status: u16::try_from(err.extended_code).unwrap_or(u16::MAX),
            body: msg.unwrap_or_else(|| err.to_string()),
        },
        other => StoreError::Transport(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use kuji_core::Draw;

    use super::*;

    fn record(day: u32, numbers: &[u8], bonus: Option<u8>) -> DrawRecord {
        Draw::new(
            NaiveDate::from_ymd_opt(2026, 2, day).unwrap(),
            numbers.to_vec(),
            bonus,
        )
        .into_record("powerball")
    }

    #[tokio::test]
    async fn merge_updates_bonus_in_place() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .upsert_batch("powerball", &[record(18, &[3, 15, 22, 41, 58], None)], WriteMode::Merge)
            .await
            .unwrap();
        store
            .upsert_batch("powerball", &[record(18, &[3, 15, 22, 41, 58], Some(11))], WriteMode::Merge)
            .await
            .unwrap();

        let stored = store.records("powerball").unwrap();
        assert_eq!(stored, vec![record(18, &[3, 15, 22, 41, 58], Some(11))]);
    }

    #[tokio::test]
    async fn ignore_duplicates_counts_only_new_rows() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let first = [record(18, &[1, 2, 3, 4, 5], Some(1))];
        store
            .upsert_batch("powerball", &first, WriteMode::IgnoreDuplicates)
            .await
            .unwrap();

        let again = [record(18, &[1, 2, 3, 4, 5], Some(9)), record(16, &[6, 7, 8, 9, 10], None)];
        let written = store
            .upsert_batch("powerball", &again, WriteMode::IgnoreDuplicates)
            .await
            .unwrap();

        assert_eq!(written, 1);
        assert_eq!(store.count("powerball").unwrap(), 2);
        assert_eq!(store.records("powerball").unwrap()[1].bonus, Some(1));
    }

    #[test]
    fn numbers_are_stored_as_json_arrays() {
        assert_eq!(numbers_json(&[3, 8, 15]), "[3,8,15]");
    }

    #[test]
    fn unique_violation_maps_to_conflict() {
        let store = SqliteStore::open_in_memory().unwrap();
        let insert = "INSERT INTO draws (game_id, draw_date, numbers) VALUES ('ny', '2026-02-19', '[1,2,3,4,5]')";
        store.conn.execute(insert, []).unwrap();
        let err = store.conn.execute(insert, []).unwrap_err();
        assert!(matches!(map_error(err), StoreError::Conflict(_)));
    }

    #[test]
    fn other_failures_are_rejections() {
        let store = SqliteStore::open_in_memory().unwrap();
        let err = store
            .conn
            .execute("INSERT INTO draws (game_id) VALUES ('ny')", [])
            .unwrap_err();
        assert!(matches!(map_error(err), StoreError::Rejected { .. }));
    }

    #[test]
    fn open_creates_parent_directories() {
        let dir = std::env::temp_dir().join(format!("kuji-store-test-{}", std::process::id()));
        let path = dir.join("nested").join("draws.db");
        let store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.count("ny").unwrap(), 0);
        drop(store);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
