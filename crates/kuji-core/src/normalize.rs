//! # Document Normalizer
//!
//! Canonicalizes raw result-page markup before any pattern matching runs.
//! Upstream pages sometimes split a date label across a line break
//! (`Thursday <br>February 19, 2026`) or pad it with non-breaking spaces,
//! which silently defeats the date patterns.

use regex::Regex;

use crate::error::Result;

/// Collapses line-break tags and whitespace entities into plain spaces.
///
/// No other transformation is applied, and normalizing twice yields the
/// same text as normalizing once.
pub struct DocumentNormalizer {
    re_line_break: Regex,
    re_nbsp_entity: Regex,
}

impl DocumentNormalizer {
    /// Constructs a normalizer with pre-compiled patterns.
    ///
    /// # Errors
    ///
    /// Returns `KujiError::RegexError` if a pattern fails to compile.
    pub fn new() -> Result<Self> {
        Ok(Self {
            re_line_break: Regex::new(r"(?i)<br\s*/?>")?,
            re_nbsp_entity: Regex::new(r"(?i)&nbsp;|&#160;|&#x0*a0;")?,
        })
    }

    /// Returns `html` with every `<br>` variant, `&nbsp;`-style entity and
    /// literal U+00A0 replaced by a single ordinary space.
    #[must_use]
    pub fn normalize(&self, html: &str) -> String {
        let text = self.re_line_break.replace_all(html, " ");
        let text = self.re_nbsp_entity.replace_all(&text, " ");
        text.replace('\u{a0}', " ")
    }
}
