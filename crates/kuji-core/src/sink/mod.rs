//! # Upsert Sink
//!
//! Writes validated records to a [`DrawStore`] in fixed-size chunks. A chunk
//! rejected for a uniqueness conflict is retried one record at a time with
//! duplicates ignored, so a single pre-existing row never sinks its
//! neighbours. Any other failure is logged and the chunk counted as failed;
//! the run moves on.

pub mod memory;

use thiserror::Error;
use tracing::{debug, error, warn};

use crate::types::DrawRecord;

pub use memory::MemoryStore;

/// Records per write request.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// How a store treats a record whose composite key already exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriteMode {
    /// Overwrite the stored row's mutable fields.
    Merge,
    /// Keep the stored row, skip the incoming one.
    IgnoreDuplicates,
}

/// Failure reported by a store for one write.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The write violated the uniqueness constraint.
    #[error("uniqueness conflict: {0}")]
    Conflict(String),

    /// The store refused the write for any other reason.
    #[error("write rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The store could not be reached.
    #[error("store unreachable: {0}")]
    Transport(String),
}

/// Persistent storage for draw records, keyed by
/// `(game_id, draw_date, numbers)`.
#[allow(async_fn_in_trait)]
pub trait DrawStore {
    /// Writes `records` (all belonging to `game_id`) in one request and
    /// returns how many rows were accepted.
    async fn upsert_batch(
        &mut self,
        game_id: &str,
        records: &[DrawRecord],
        mode: WriteMode,
    ) -> Result<usize, StoreError>;
}

/// Outcome of [`UpsertSink::write`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkReport {
    /// Rows the store reported as written.
    pub written: usize,
    /// Records lost to non-conflict failures.
    pub failed: usize,
    /// Chunks sent.
    pub chunks: usize,
    /// Chunks that fell back to one-by-one writes.
    pub fallbacks: usize,
}

/// Chunked, idempotent writer in front of a [`DrawStore`].
#[derive(Debug)]
pub struct UpsertSink<S> {
    store: S,
    chunk_size: usize,
}

impl<S: DrawStore> UpsertSink<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Sets the number of records per request (at least 1).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// Writes `records` for `game_id`. Never fails: per-chunk problems are
    /// logged and reflected in the report.
    pub async fn write(&mut self, game_id: &str, records: &[DrawRecord]) -> SinkReport {
        let mut report = SinkReport::default();

        for chunk in records.chunks(self.chunk_size) {
            report.chunks += 1;
            match self
                .store
                .upsert_batch(game_id, chunk, WriteMode::Merge)
                .await
            {
                Ok(written) => report.written += written,
                Err(StoreError::Conflict(reason)) => {
                    warn!(game = game_id, size = chunk.len(), %reason, "chunk conflicted, writing one by one");
                    report.fallbacks += 1;
                    self.write_one_by_one(game_id, chunk, &mut report).await;
                }
                Err(StoreError::Rejected { status, body }) => {
                    error!(game = game_id, status, %body, size = chunk.len(), "chunk rejected");
                    report.failed += chunk.len();
                }
                Err(e) => {
                    error!(game = game_id, error = %e, size = chunk.len(), "chunk failed");
                    report.failed += chunk.len();
                }
            }
        }

        report
    }

    async fn write_one_by_one(&mut self, game_id: &str, chunk: &[DrawRecord], report: &mut SinkReport) {
        for record in chunk {
            match self
                .store
                .upsert_batch(game_id, std::slice::from_ref(record), WriteMode::IgnoreDuplicates)
                .await
            {
                Ok(written) => report.written += written,
                Err(StoreError::Conflict(_)) => debug!(%record, "already stored"),
                Err(e) => {
                    error!(%record, error = %e, "single write failed");
                    report.failed += 1;
                }
            }
        }
    }
}
