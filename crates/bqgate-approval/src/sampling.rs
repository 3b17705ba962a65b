//! Model-mediated approval.
//!
//! A language-model participant is given a fixed system instruction and the
//! request summary, and its short answer is judged: any response containing
//! `APPROVE` (case-insensitive) approves, anything else declines.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::channel::{ApprovalChannel, ApprovalRequest};
use crate::error::ParticipantError;
use crate::verdict::ApprovalVerdict;

/// Fixed system instruction sent with every approval prompt.
pub const APPROVAL_SYSTEM_PROMPT: &str = "You review destructive BigQuery operations before \
    they run. Judge whether the operation below is safe to execute as written. Respond APPROVE \
    or DENY.";

/// Default response token limit; the answer is a single word.
pub const DEFAULT_SAMPLING_MAX_TOKENS: u32 = 16;

/// Request for a model judgment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingRequest {
    /// Request ID for correlation.
    pub request_id: Uuid,
    /// System instruction.
    pub system: String,
    /// User-visible advisory prompt.
    pub prompt: String,
    /// Maximum tokens to generate.
    pub max_tokens: u32,
}

/// Response to a sampling request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplingResponse {
    /// Request ID for correlation.
    pub request_id: Uuid,
    /// Whether the request was successful.
    pub success: bool,
    /// Generated content.
    pub content: Option<String>,
    /// Model used.
    pub model: Option<String>,
    /// Stop reason.
    pub stop_reason: Option<String>,
    /// Error message if failed.
    pub error: Option<String>,
}

impl SamplingResponse {
    /// A successful text response.
    #[must_use]
    pub fn text(request_id: Uuid, content: impl Into<String>) -> Self {
        Self {
            request_id,
            success: true,
            content: Some(content.into()),
            model: None,
            stop_reason: None,
            error: None,
        }
    }

    /// A failed response.
    #[must_use]
    pub fn failure(request_id: Uuid, error: impl Into<String>) -> Self {
        Self {
            request_id,
            success: false,
            content: None,
            model: None,
            stop_reason: None,
            error: Some(error.into()),
        }
    }
}

/// Something that can produce a short model completion.
#[async_trait]
pub trait SamplingParticipant: Send + Sync {
    /// Generate a completion. May wait indefinitely.
    async fn sample(&self, request: SamplingRequest) -> Result<SamplingResponse, ParticipantError>;
}

/// Judge a model answer.
///
/// Missing or blank text is `None`; otherwise `Approved` iff the uppercased
/// text contains `APPROVE`.
#[must_use]
pub fn judge(text: Option<&str>) -> Option<ApprovalVerdict> {
    let text = text.map(str::trim).filter(|t| !t.is_empty())?;
    if text.to_uppercase().contains("APPROVE") {
        Some(ApprovalVerdict::Approved)
    } else {
        Some(ApprovalVerdict::Declined)
    }
}

/// Approval channel that asks a model.
#[derive(Clone)]
pub struct SamplingChannel {
    participant: Arc<dyn SamplingParticipant>,
    max_tokens: u32,
}

impl std::fmt::Debug for SamplingChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplingChannel")
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

impl SamplingChannel {
    /// Create a channel over `participant`.
    #[must_use]
    pub fn new(participant: Arc<dyn SamplingParticipant>) -> Self {
        Self {
            participant,
            max_tokens: DEFAULT_SAMPLING_MAX_TOKENS,
        }
    }

    /// Override the response token limit.
    #[must_use]
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Build the sampling request for an approval request.
    #[must_use]
    pub fn build_request(&self, request: &ApprovalRequest) -> SamplingRequest {
        SamplingRequest {
            request_id: Uuid::new_v4(),
            system: APPROVAL_SYSTEM_PROMPT.to_owned(),
            prompt: format!("{}\n\nRespond APPROVE or DENY.", request.summary()),
            max_tokens: self.max_tokens,
        }
    }
}

#[async_trait]
impl ApprovalChannel for SamplingChannel {
    fn name(&self) -> &'static str {
        "sampling"
    }

    async fn request_approval(
        &self,
        request: &ApprovalRequest,
        cancel: &CancellationToken,
    ) -> ApprovalVerdict {
        let sampling = self.build_request(request);
        let request_id = sampling.request_id;
        debug!(%request_id, project = %request.context, "awaiting sampling response");

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(%request_id, "sampling abandoned by caller");
                return ApprovalVerdict::Cancelled;
            },
            outcome = self.participant.sample(sampling) => outcome,
        };

        let response = match outcome {
            Ok(response) => response,
            Err(e) => {
                warn!(%request_id, error = %e, "sampling failed");
                return ApprovalVerdict::channel_failure(e.to_string());
            },
        };

        if !response.success {
            let error = response
                .error
                .unwrap_or_else(|| "sampling request failed".to_owned());
            warn!(%request_id, error = %error, "sampling participant reported failure");
            return ApprovalVerdict::channel_failure(error);
        }

        match judge(response.content.as_deref()) {
            Some(verdict) => {
                info!(%request_id, model = ?response.model, %verdict, "sampling judged");
                verdict
            },
            None => {
                warn!(%request_id, "empty sampling response");
                ApprovalVerdict::channel_failure("model returned an empty response")
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassificationResult;

    struct Reply(Result<Option<&'static str>, ParticipantError>);

    #[async_trait]
    impl SamplingParticipant for Reply {
        async fn sample(
            &self,
            request: SamplingRequest,
        ) -> Result<SamplingResponse, ParticipantError> {
            assert_eq!(request.system, APPROVAL_SYSTEM_PROMPT);
            assert!(request.prompt.contains("Matched keywords: DROP"));
            match &self.0 {
                Ok(Some(text)) => Ok(SamplingResponse::text(request.request_id, *text)),
                Ok(None) => Ok(SamplingResponse {
                    content: None,
                    ..SamplingResponse::text(request.request_id, "")
                }),
                Err(e) => Err(e.clone()),
            }
        }
    }

    async fn verdict_for(reply: Reply) -> ApprovalVerdict {
        let request = ApprovalRequest::new(
            "DROP TABLE foo",
            "proj",
            ClassificationResult::from_matches(vec!["DROP".to_owned()]),
        );
        SamplingChannel::new(Arc::new(reply))
            .request_approval(&request, &CancellationToken::new())
            .await
    }

    #[test]
    fn test_judge() {
        assert_eq!(judge(Some("APPROVE, proceed")), Some(ApprovalVerdict::Approved));
        assert_eq!(judge(Some("approve")), Some(ApprovalVerdict::Approved));
        assert_eq!(judge(Some("I would DENY this")), Some(ApprovalVerdict::Declined));
        assert_eq!(judge(Some("  \n")), None);
        assert_eq!(judge(None), None);
    }

    #[tokio::test]
    async fn test_approve_and_deny() {
        assert_eq!(
            verdict_for(Reply(Ok(Some("APPROVE, proceed")))).await,
            ApprovalVerdict::Approved
        );
        assert_eq!(
            verdict_for(Reply(Ok(Some("I would DENY this")))).await,
            ApprovalVerdict::Declined
        );
    }

    #[tokio::test]
    async fn test_missing_or_empty_content_fails() {
        assert!(matches!(
            verdict_for(Reply(Ok(None))).await,
            ApprovalVerdict::Failed(_)
        ));
        assert!(matches!(
            verdict_for(Reply(Ok(Some("")))).await,
            ApprovalVerdict::Failed(_)
        ));
    }

    #[tokio::test]
    async fn test_transport_error_fails() {
        let verdict = verdict_for(Reply(Err(ParticipantError::Transport(
            "connection reset".to_owned(),
        ))))
        .await;
        assert!(verdict.to_string().contains("connection reset"));
    }

    #[test]
    fn test_request_carries_token_limit() {
        let channel = SamplingChannel::new(Arc::new(Reply(Ok(None)))).with_max_tokens(4);
        let request = ApprovalRequest::new(
            "DROP TABLE foo",
            "proj",
            ClassificationResult::from_matches(vec!["DROP".to_owned()]),
        );
        let sampling = channel.build_request(&request);
        assert_eq!(sampling.max_tokens, 4);
        assert!(sampling.prompt.ends_with("Respond APPROVE or DENY."));
    }
}
