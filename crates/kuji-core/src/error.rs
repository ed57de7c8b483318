use thiserror::Error;

/// Errors that can occur during kuji core operations.
///
/// Rows, segments and sections that match no known shape are not errors:
/// they are skipped and contribute zero draws. These variants cover the
/// failures that abandon a whole document or a whole game.
#[derive(Debug, Error)]
pub enum KujiError {
    /// A regex pattern failed to compile (should not happen with static patterns).
    #[error("regex compilation error: {0}")]
    RegexError(#[from] regex::Error),

    /// The JSON source returned something that is not JSON at all.
    #[error("malformed JSON document: {0}")]
    Json(#[from] serde_json::Error),

    /// The JSON source returned valid JSON that is not a list of rows.
    #[error("expected a JSON array of draw rows, found {found}")]
    NotAnArray {
        /// JSON type that was found instead.
        found: &'static str,
    },

    /// A game definition is internally inconsistent.
    #[error("invalid game `{id}`: {reason}")]
    InvalidGame {
        /// Game identifier.
        id: String,
        /// What is wrong with it.
        reason: String,
    },
}

/// Result type alias for kuji operations.
pub type Result<T> = std::result::Result<T, KujiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = KujiError::NotAnArray { found: "object" };
        assert_eq!(
            err.to_string(),
            "expected a JSON array of draw rows, found object"
        );

        let err = KujiError::InvalidGame {
            id: "ny".into(),
            reason: "picks is zero".into(),
        };
        assert!(err.to_string().contains("`ny`"));
        assert!(err.to_string().contains("picks is zero"));
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KujiError>();
    }
}
