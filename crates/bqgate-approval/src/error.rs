use thiserror::Error;

/// Errors raised while building approval components.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// A destructive keyword could not be compiled into a matcher.
    #[error("invalid keyword '{keyword}': {reason}")]
    InvalidKeyword {
        /// The offending keyword.
        keyword: String,
        /// Why it was rejected.
        reason: String,
    },
}

/// Result type for approval operations.
pub type ApprovalResult<T> = Result<T, ApprovalError>;

/// Failure of an interactive or model participant to produce an answer.
///
/// Channels never propagate this; they turn it into
/// [`ApprovalVerdict::Failed`](crate::ApprovalVerdict::Failed).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParticipantError {
    /// The participant is gone (queue closed, responder dropped).
    #[error("approval participant unavailable: {0}")]
    Unavailable(String),

    /// The request or response could not be delivered.
    #[error("approval transport error: {0}")]
    Transport(String),

    /// The participant answered something that is not an answer to this request.
    #[error("approval protocol error: {0}")]
    Protocol(String),
}
