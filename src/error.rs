//! Error types for environmental quality assessment

use crate::types::readings::Domain;

/// Result type for assessment operations
pub type Result<T> = std::result::Result<T, EqsError>;

/// Errors surfaced by the scoring core and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum EqsError {
    /// A raw prediction or request payload is missing, non-numeric or malformed
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A domain model failed to produce a usable prediction
    #[error("{domain} model inference failed: {reason}")]
    Inference { domain: Domain, reason: String },

    /// The narrative collaborator failed, timed out or is disabled
    #[error("narrative unavailable: {0}")]
    NarrativeUnavailable(String),
}

impl EqsError {
    pub fn inference(domain: Domain, reason: impl std::fmt::Display) -> Self {
        Self::Inference {
            domain,
            reason: reason.to_string(),
        }
    }

    /// Short machine-readable error kind used in API responses
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::Inference { .. } => "computation_failed",
            Self::NarrativeUnavailable(_) => "narrative_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EqsError::inference(Domain::Water, "session poisoned");
        assert_eq!(err.to_string(), "water model inference failed: session poisoned");
        assert_eq!(err.kind(), "computation_failed");

        let err = EqsError::InvalidInput("air prediction is NaN".to_string());
        assert_eq!(err.kind(), "invalid_input");
    }
}
