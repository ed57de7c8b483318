//! # Kuji Store
//!
//! Persistent [`DrawStore`](kuji_core::DrawStore) back ends: a local SQLite
//! file and a remote PostgREST table. Both are unique on
//! `(game_id, draw_date, numbers)`, so re-running a sync never adds rows.
pub mod rest;
pub mod sqlite;

pub use rest::{RestStore, DRAWS_TABLE};
pub use sqlite::SqliteStore;
