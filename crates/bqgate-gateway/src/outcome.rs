//! Terminal results of the gated execution flow.
//!
//! `Display` on these types is the caller-facing text.

use std::fmt;

use bqgate_approval::ADVISORY_NOT_REQUESTED;
use bqgate_engine::{CommandOutput, CostAdvisory, ObjectKind};
use serde::{Deserialize, Serialize};

/// The real query ran. Its own success or failure is carried inside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// What the engine returned.
    pub output: CommandOutput,
    /// Advisory gathered before execution, if any.
    pub advisory: Option<CostAdvisory>,
}

impl fmt::Display for ExecutionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.output.success {
            f.write_str(&self.output.stdout)
        } else {
            write!(f, "Query execution failed: {}", self.output.stderr)
        }
    }
}

/// Why the real query was not run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Rejection {
    /// The request itself is unusable.
    MalformedRequest {
        /// What is wrong with it.
        message: String,
    },
    /// The dry run failed under a policy that requires it.
    ValidationFailed {
        /// Engine diagnostic text.
        stderr: String,
    },
    /// A token was issued; the caller must call again with it.
    ConfirmationRequired {
        /// The issued token.
        token: String,
        /// Cost information to show alongside the challenge.
        advisory: Option<CostAdvisory>,
    },
    /// The echoed token is unknown, expired, or bound to another body.
    InvalidToken,
    /// The approver said no.
    Declined,
    /// The approver or caller abandoned the request.
    Cancelled,
    /// No decision could be obtained from the approval channel.
    ApprovalFailed {
        /// The underlying cause.
        message: String,
    },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedRequest { message } => f.write_str(message),
            Self::ValidationFailed { stderr } => write!(f, "Query validation failed: {stderr}"),
            Self::ConfirmationRequired { token, advisory } => {
                f.write_str("⚠️  DANGEROUS QUERY DETECTED\n\n")?;
                match advisory {
                    Some(advisory) => write!(f, "{advisory}")?,
                    None => f.write_str(ADVISORY_NOT_REQUESTED)?,
                }
                write!(
                    f,
                    "\n\nTo execute this query, call again with confirmation_token: {token}"
                )
            },
            Self::InvalidToken => {
                f.write_str("Invalid or expired confirmation token. Please request a new one.")
            },
            Self::Declined => f.write_str("Query declined by the approver. It was not executed."),
            Self::Cancelled => {
                f.write_str("Query cancelled before approval. It was not executed.")
            },
            Self::ApprovalFailed { message } => write!(
                f,
                "Query cancelled: approval could not be obtained ({message}). It was not executed."
            ),
        }
    }
}

/// Terminal state of one gated request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum GatewayOutcome {
    /// The real query ran.
    Executed(ExecutionResult),
    /// The real query did not run.
    Rejected(Rejection),
}

impl GatewayOutcome {
    /// Whether the real query ran (whatever its own result).
    #[must_use]
    pub fn is_executed(&self) -> bool {
        matches!(self, Self::Executed(_))
    }

    /// The rejection, if the query did not run.
    #[must_use]
    pub fn rejection(&self) -> Option<&Rejection> {
        match self {
            Self::Executed(_) => None,
            Self::Rejected(rejection) => Some(rejection),
        }
    }

    /// The token of a confirmation challenge, if this is one.
    #[must_use]
    pub fn challenge_token(&self) -> Option<&str> {
        match self {
            Self::Rejected(Rejection::ConfirmationRequired { token, .. }) => Some(token),
            _ => None,
        }
    }
}

impl fmt::Display for GatewayOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Executed(result) => result.fmt(f),
            Self::Rejected(rejection) => rejection.fmt(f),
        }
    }
}

/// Result of a read-only table or routine lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LookupOutcome {
    /// The engine described the object.
    Found {
        /// Engine JSON output.
        json: String,
    },
    /// The identifier does not have enough dotted segments.
    MalformedId {
        /// Caller-facing explanation.
        message: String,
    },
    /// The engine could not describe the object.
    Failed {
        /// What was looked up.
        kind: ObjectKind,
        /// Engine diagnostic text.
        stderr: String,
    },
}

impl LookupOutcome {
    /// Whether the object was found.
    #[must_use]
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}

impl fmt::Display for LookupOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Found { json } => f.write_str(json),
            Self::MalformedId { message } => f.write_str(message),
            Self::Failed {
                kind: ObjectKind::Table,
                stderr,
            } => write!(f, "Error getting BigQuery schema: {stderr}"),
            Self::Failed {
                kind: ObjectKind::Routine,
                stderr,
            } => write!(f, "Error getting BigQuery routine information: {stderr}"),
        }
    }
}
