//! The approval channel abstraction.
//!
//! Exactly one [`ApprovalChannel`] is active per deployment. The gateway hands
//! it every destructive request and acts on the returned [`ApprovalVerdict`].

use async_trait::async_trait;
use bqgate_engine::CostAdvisory;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::classifier::ClassificationResult;
use crate::verdict::ApprovalVerdict;

/// Shown in place of a cost advisory when no dry run was made.
pub const ADVISORY_NOT_REQUESTED: &str = "Cost estimate: not requested";

/// A destructive request awaiting approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// The exact operation body.
    pub body: String,
    /// Target scope (project id).
    pub context: String,
    /// Token echoed back by the caller, if any.
    pub confirmation_token: Option<String>,
    /// Why the request needs approval.
    pub classification: ClassificationResult,
    /// Cost information gathered before asking, if a dry run was made.
    pub advisory: Option<CostAdvisory>,
}

impl ApprovalRequest {
    /// Create a request with no token and no advisory.
    #[must_use]
    pub fn new(
        body: impl Into<String>,
        context: impl Into<String>,
        classification: ClassificationResult,
    ) -> Self {
        Self {
            body: body.into(),
            context: context.into(),
            confirmation_token: None,
            classification,
            advisory: None,
        }
    }

    /// Attach the caller's confirmation token.
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.confirmation_token = Some(token.into());
        self
    }

    /// Attach a cost advisory.
    #[must_use]
    pub fn with_advisory(mut self, advisory: CostAdvisory) -> Self {
        self.advisory = Some(advisory);
        self
    }

    /// Human-readable summary used by the interactive and model channels.
    #[must_use]
    pub fn summary(&self) -> String {
        let advisory = self
            .advisory
            .map_or_else(|| ADVISORY_NOT_REQUESTED.to_owned(), |a| a.to_string());
        format!(
            "A destructive BigQuery operation is awaiting approval.\n\n\
             Project: {}\n\
             Matched keywords: {}\n\
             {advisory}\n\n\
             Query:\n{}",
            self.context,
            self.classification.matched_keywords.join(", "),
            self.body
        )
    }
}

/// Obtains a verdict for a destructive request.
///
/// Implementations must return promptly with [`ApprovalVerdict::Cancelled`]
/// once `cancel` fires, dropping any pending participant request.
#[async_trait]
pub trait ApprovalChannel: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Ask for approval.
    async fn request_approval(
        &self,
        request: &ApprovalRequest,
        cancel: &CancellationToken,
    ) -> ApprovalVerdict;
}
