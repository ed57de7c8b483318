pub mod draw;
pub mod game;

pub use draw::{composite_key, Draw, DrawRecord, StoredDraw, ISO_DATE};
pub use game::{DrawShape, GameSpec, Source, SourceKind, SAFETY_CEILING};
