use thiserror::Error;

/// Errors surfaced to callers of the evaluation operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EvaluationError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("brand guideline not configured")]
    GuidelineNotConfigured,
    #[error("batch cancelled")]
    Cancelled,
}

impl EvaluationError {
    pub(crate) fn validation(message: impl Into<String>) -> Self {
        EvaluationError::Validation(message.into())
    }
}

/// Failures of the external contextual oracle. Never leaves the contextual signal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    #[error("oracle timed out after {0}ms")]
    Timeout(u64),
    #[error("oracle provider failed: {0}")]
    Provider(String),
    #[error("malformed oracle response: {0}")]
    Malformed(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("sentiment analysis failed: {0}")]
pub struct SentimentError(pub String);

#[derive(Debug, Error)]
pub enum GuidelineError {
    #[error("failed to read guideline: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse guideline: {0}")]
    Parse(#[from] serde_json::Error),
}
