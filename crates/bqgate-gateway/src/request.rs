use serde::{Deserialize, Serialize};

/// One call to the gated execution entry point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationRequest {
    /// Raw query text.
    pub body: String,
    /// Target project id.
    pub context: String,
    /// Token echoed back from an earlier challenge.
    pub confirmation_token: Option<String>,
}

impl OperationRequest {
    /// Create a request without a token.
    #[must_use]
    pub fn new(body: impl Into<String>, context: impl Into<String>) -> Self {
        Self {
            body: body.into(),
            context: context.into(),
            confirmation_token: None,
        }
    }

    /// Attach a confirmation token. Blank tokens count as absent.
    #[must_use]
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.confirmation_token = token.filter(|t| !t.trim().is_empty());
        self
    }
}

/// When the dry run happens and whether its failure stops the request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DryRunPolicy {
    /// Dry-run every request; a failed dry run rejects it.
    #[default]
    Required,
    /// Dry-run every request; a failed dry run only loses the advisory.
    Advisory,
    /// Ask for approval of destructive requests without a dry run. Other
    /// requests behave as under `Required`.
    SkipForDestructive,
}
