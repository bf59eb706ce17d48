/// Error types for the ranking core.
use std::time::Duration;

use thiserror::Error;

/// Failure of a single call to the external judge.
///
/// Never escapes a ranking run: the comparator client turns it into a coin flip.
#[derive(Debug, Error)]
pub enum JudgeError {
    /// Network or connection failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// Judge answered with a non-2xx status.
    #[error("judge returned {status}: {body}")]
    Status { status: u16, body: String },

    /// Judge answered, but not with a usable verdict.
    #[error("unparseable verdict: {0}")]
    Unparseable(String),

    /// Response body did not have the expected shape.
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl JudgeError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::Unparseable(_) => false,
            Self::InvalidResponse(_) => false,
        }
    }
}

/// Errors surfaced to callers of a ranking run.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("no candidates supplied")]
    NoCandidates,

    #[error("duplicate candidate id: {0}")]
    DuplicateCandidate(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("{scores} scores for {candidates} candidates")]
    LengthMismatch { candidates: usize, scores: usize },

    #[error("ranking run cancelled")]
    Cancelled,

    #[error("ranking run timed out after {0:?}")]
    TimedOut(Duration),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(JudgeError::Transport("reset".into()).is_retryable());
        assert!(JudgeError::Status { status: 503, body: String::new() }.is_retryable());
        assert!(JudgeError::Status { status: 429, body: String::new() }.is_retryable());
        assert!(!JudgeError::Status { status: 401, body: String::new() }.is_retryable());
        assert!(!JudgeError::Unparseable("maybe".into()).is_retryable());
    }

    #[test]
    fn test_display_messages() {
        assert_eq!(RankError::NoCandidates.to_string(), "no candidates supplied");
        let err = RankError::LengthMismatch { candidates: 4, scores: 3 };
        assert_eq!(err.to_string(), "3 scores for 4 candidates");
    }
}
