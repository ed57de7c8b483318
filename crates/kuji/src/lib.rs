//! # Kuji
//!
//! Facade over the kuji workspace: the extraction engine from `kuji-core`
//! and the persistent stores from `kuji-store`.
//!
//! ```rust
//! use kuji::{Pipeline, SqliteStore, UpsertSink};
//!
//! let pipeline = Pipeline::new().unwrap();
//! let sink = UpsertSink::new(SqliteStore::open_in_memory().unwrap());
//! # let _ = (pipeline, sink);
//! ```
pub use kuji_core::*;
pub use kuji_store::{RestStore, SqliteStore, DRAWS_TABLE};
