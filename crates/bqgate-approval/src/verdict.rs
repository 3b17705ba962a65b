use std::fmt;

use serde::{Deserialize, Serialize};

/// Why a channel could not produce an approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ApprovalFailure {
    /// No token was supplied; one was issued and must be echoed back.
    ConfirmationRequired {
        /// The freshly issued token.
        token: String,
    },
    /// The supplied token is unknown, expired, or bound to another body.
    InvalidToken,
    /// The participant or its transport failed.
    Channel {
        /// Description of the underlying cause.
        message: String,
    },
}

impl fmt::Display for ApprovalFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfirmationRequired { token } => write!(f, "confirmation required: token={token}"),
            Self::InvalidToken => f.write_str("invalid or expired token"),
            Self::Channel { message } => f.write_str(message),
        }
    }
}

/// The single answer an approval channel gives for one destructive request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum ApprovalVerdict {
    /// Execution may proceed.
    Approved,
    /// The approver said no.
    Declined,
    /// The approver or caller abandoned the request.
    Cancelled,
    /// No decision could be obtained.
    Failed(ApprovalFailure),
}

impl ApprovalVerdict {
    /// Shorthand for a channel failure.
    #[must_use]
    pub fn channel_failure(message: impl Into<String>) -> Self {
        Self::Failed(ApprovalFailure::Channel {
            message: message.into(),
        })
    }

    /// Whether execution may proceed.
    #[must_use]
    pub fn is_approved(&self) -> bool {
        matches!(self, Self::Approved)
    }
}

impl fmt::Display for ApprovalVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Approved => f.write_str("approved"),
            Self::Declined => f.write_str("declined"),
            Self::Cancelled => f.write_str("cancelled"),
            Self::Failed(failure) => write!(f, "failed: {failure}"),
        }
    }
}
