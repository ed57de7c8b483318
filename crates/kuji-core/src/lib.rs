//! # Kuji Core
//!
//! Extraction and normalization engine for lottery draw results. Turns raw
//! HTML, CSV and JSON documents into validated, deduplicated draw records
//! and writes them idempotently to a store.
//!
//! ## Quick Start
//!
//! ```rust
//! use kuji_core::{GameSpec, Pipeline, Source};
//!
//! let game = GameSpec {
//!     id: "ny-take5".into(),
//!     name: "Take 5".into(),
//!     picks: 5,
//!     max: 39,
//!     bonus: false,
//!     bonus_max: None,
//!     source: Source::Csv { url: "https://example.test/take5.csv".into() },
//! };
//! let csv = "Draw Date,Evening,Evening Bonus,Midday,Midday Bonus\n\
//!            02/19/2026,3 8 15 22 27,,1 5 9 14 33,\n";
//!
//! let pipeline = Pipeline::new().unwrap();
//! let ingest = pipeline.ingest(&game, csv).unwrap();
//!
//! assert_eq!(ingest.records.len(), 2);
//! assert_eq!(ingest.records[0].composite_key(), "2026-02-19_3,8,15,22,27");
//! ```
pub mod dedup;
pub mod error;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod sink;
pub mod types;
pub mod validate;

// Re-export primary API
pub use dedup::{dedup_records, Deduplicator};
pub use error::{KujiError, Result};
pub use normalize::DocumentNormalizer;
pub use parser::{parse_json, CsvDrawParser, CsvLayout, HtmlDrawParser, HtmlParserConfig, PageStats};
pub use pipeline::{Ingest, IngestReport, Pipeline};
pub use sink::{DrawStore, MemoryStore, SinkReport, StoreError, UpsertSink, WriteMode, DEFAULT_CHUNK_SIZE};
pub use types::{
    composite_key, Draw, DrawRecord, DrawShape, GameSpec, Source, SourceKind, StoredDraw,
    ISO_DATE, SAFETY_CEILING,
};
pub use validate::{ValidationError, Validator};
