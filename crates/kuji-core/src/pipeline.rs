//! # Ingestion Pipeline
//!
//! Turns one raw document into validated, deduplicated records for a game:
//! normalize, parse by source kind, validate, dedup. Writing is left to
//! [`crate::sink`].

use tracing::debug;

use crate::dedup::Deduplicator;
use crate::error::Result;
use crate::normalize::DocumentNormalizer;
use crate::parser::{parse_json, CsvDrawParser, HtmlDrawParser};
use crate::types::{Draw, DrawRecord, GameSpec, SourceKind};
use crate::validate::Validator;

/// Counts describing what happened to the candidates of one document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    /// Draws the parser produced.
    pub candidates: usize,
    /// Draws the validator refused.
    pub rejected: usize,
    /// Valid draws dropped as already seen.
    pub duplicates: usize,
}

/// Output of [`Pipeline::ingest`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ingest {
    pub records: Vec<DrawRecord>,
    pub report: IngestReport,
}

/// Holds the compiled parsers so one instance can serve every game.
pub struct Pipeline {
    normalizer: DocumentNormalizer,
    html: HtmlDrawParser,
    csv: CsvDrawParser,
}

impl Pipeline {
    /// Builds a pipeline with default parser settings.
    ///
    /// # Errors
    ///
    /// Returns `KujiError::RegexError` if any parser pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            normalizer: DocumentNormalizer::new()?,
            html: HtmlDrawParser::new()?,
            csv: CsvDrawParser::new()?,
        })
    }

    /// The HTML parser, e.g. for structural diagnostics.
    pub fn html(&self) -> &HtmlDrawParser {
        &self.html
    }

    /// The normalizer applied to HTML documents.
    pub fn normalizer(&self) -> &DocumentNormalizer {
        &self.normalizer
    }

    /// Parses `text` with the parser matching the game's source kind.
    ///
    /// The result is unvalidated: HTML candidates are only bounded by the
    /// generic safety ceiling, not by the game's own ceiling.
    ///
    /// # Errors
    ///
    /// Only JSON sources fail, when the document is not a JSON array.
    pub fn extract(&self, game: &GameSpec, text: &str) -> Result<Vec<Draw>> {
        let shape = game.shape();
        let draws = match game.source.kind() {
            SourceKind::Html => {
                let normalized = self.normalizer.normalize(text);
                self.html.parse(&normalized, shape)
            }
            SourceKind::Csv => self.csv.parse(text, shape),
            SourceKind::Json => parse_json(text, shape)?,
        };
        Ok(draws)
    }

    /// Extracts, validates and deduplicates the draws of one document.
    ///
    /// # Errors
    ///
    /// Propagates [`Pipeline::extract`] errors.
    pub fn ingest(&self, game: &GameSpec, text: &str) -> Result<Ingest> {
        let draws = self.extract(game, text)?;
        let validator = Validator::for_game(game);
        let mut dedup = Deduplicator::new();
        let mut report = IngestReport {
            candidates: draws.len(),
            ..IngestReport::default()
        };

        let mut records = Vec::with_capacity(draws.len());
        for record in draws.into_iter().map(|d| d.into_record(game.id.as_str())) {
            if let Err(reason) = validator.validate(&record) {
                debug!(game = %game.id, %record, %reason, "draw rejected");
                report.rejected += 1;
                continue;
            }
            if dedup.admit(&record) {
                records.push(record);
            }
        }
        report.duplicates = dedup.dropped();

        Ok(Ingest { records, report })
    }
}
