pub mod balls;
pub mod csv;
pub mod html;
pub mod json;

pub use balls::{parse_ball, BallPattern};
pub use csv::{CsvDrawParser, CsvLayout};
pub use html::{HtmlDrawParser, HtmlParserConfig, PageStats};
pub use json::{parse_json, JsonDrawRow};
