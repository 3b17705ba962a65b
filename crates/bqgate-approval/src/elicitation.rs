//! Human-in-the-loop approval.
//!
//! The channel suspends the request until an [`ElicitationParticipant`]
//! answers accept, decline, or cancel. [`elicitation_queue`] provides a
//! participant backed by a queue that a frontend drains and answers.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::channel::{ApprovalChannel, ApprovalRequest};
use crate::error::ParticipantError;
use crate::verdict::ApprovalVerdict;

/// The participant's three-way answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElicitationAction {
    /// Run the operation.
    Accept,
    /// Do not run the operation.
    Decline,
    /// Abandon the request without deciding.
    Cancel,
}

/// What the participant is asked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElicitationRequest {
    /// Correlates the response with this request.
    pub request_id: Uuid,
    /// Target scope (project id).
    pub context: String,
    /// Keywords that made the operation destructive.
    pub matched_keywords: Vec<String>,
    /// Full human-readable prompt.
    pub message: String,
}

impl ElicitationRequest {
    /// Build the prompt for an approval request.
    #[must_use]
    pub fn from_approval(request: &ApprovalRequest) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            context: request.context.clone(),
            matched_keywords: request.classification.matched_keywords.clone(),
            message: request.summary(),
        }
    }
}

/// The participant's answer to one [`ElicitationRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElicitationResponse {
    /// Must equal the request's id.
    pub request_id: Uuid,
    /// The decision.
    pub action: ElicitationAction,
}

/// Something that can put a question to a human.
#[async_trait]
pub trait ElicitationParticipant: Send + Sync {
    /// Ask and wait for the answer. May wait indefinitely.
    async fn elicit(
        &self,
        request: ElicitationRequest,
    ) -> Result<ElicitationResponse, ParticipantError>;
}

/// Approval channel that asks a human.
#[derive(Clone)]
pub struct ElicitationChannel {
    participant: Arc<dyn ElicitationParticipant>,
}

impl std::fmt::Debug for ElicitationChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ElicitationChannel").finish_non_exhaustive()
    }
}

impl ElicitationChannel {
    /// Create a channel over `participant`.
    #[must_use]
    pub fn new(participant: Arc<dyn ElicitationParticipant>) -> Self {
        Self { participant }
    }
}

#[async_trait]
impl ApprovalChannel for ElicitationChannel {
    fn name(&self) -> &'static str {
        "elicitation"
    }

    async fn request_approval(
        &self,
        request: &ApprovalRequest,
        cancel: &CancellationToken,
    ) -> ApprovalVerdict {
        let elicitation = ElicitationRequest::from_approval(request);
        let request_id = elicitation.request_id;
        debug!(%request_id, project = %request.context, "awaiting elicitation response");

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(%request_id, "elicitation abandoned by caller");
                return ApprovalVerdict::Cancelled;
            },
            outcome = self.participant.elicit(elicitation) => outcome,
        };

        match outcome {
            Ok(response) if response.request_id != request_id => {
                warn!(%request_id, got = %response.request_id, "elicitation response for another request");
                ApprovalVerdict::channel_failure(
                    ParticipantError::Protocol(format!(
                        "response for request {} does not match request {request_id}",
                        response.request_id
                    ))
                    .to_string(),
                )
            },
            Ok(response) => {
                info!(%request_id, action = ?response.action, "elicitation answered");
                match response.action {
                    ElicitationAction::Accept => ApprovalVerdict::Approved,
                    ElicitationAction::Decline => ApprovalVerdict::Declined,
                    ElicitationAction::Cancel => ApprovalVerdict::Cancelled,
                }
            },
            Err(e) => {
                warn!(%request_id, error = %e, "elicitation failed");
                ApprovalVerdict::channel_failure(e.to_string())
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Queue-backed participant
// ---------------------------------------------------------------------------

/// A question waiting for a frontend to answer it.
#[derive(Debug)]
pub struct PendingElicitation {
    /// The question.
    pub request: ElicitationRequest,
    responder: oneshot::Sender<ElicitationAction>,
}

impl PendingElicitation {
    /// Deliver the answer. Returns `false` if the asker stopped waiting.
    pub fn respond(self, action: ElicitationAction) -> bool {
        self.responder.send(action).is_ok()
    }

    /// Whether the asker stopped waiting (the request was cancelled).
    #[must_use]
    pub fn is_abandoned(&self) -> bool {
        self.responder.is_closed()
    }
}

/// Participant that forwards questions into a queue.
#[derive(Debug, Clone)]
pub struct QueuedElicitation {
    tx: mpsc::Sender<PendingElicitation>,
}

/// Create a queue-backed participant and the receiver a frontend drains.
#[must_use]
pub fn elicitation_queue(
    capacity: usize,
) -> (QueuedElicitation, mpsc::Receiver<PendingElicitation>) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (QueuedElicitation { tx }, rx)
}

#[async_trait]
impl ElicitationParticipant for QueuedElicitation {
    async fn elicit(
        &self,
        request: ElicitationRequest,
    ) -> Result<ElicitationResponse, ParticipantError> {
        let request_id = request.request_id;
        let (responder, answer) = oneshot::channel();

        self.tx
            .send(PendingElicitation { request, responder })
            .await
            .map_err(|_| ParticipantError::Unavailable("elicitation queue closed".to_owned()))?;

        let action = answer.await.map_err(|_| {
            ParticipantError::Unavailable("frontend dropped the request without answering".to_owned())
        })?;

        Ok(ElicitationResponse { request_id, action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::ClassificationResult;

    fn request() -> ApprovalRequest {
        ApprovalRequest::new(
            "DELETE FROM users WHERE 1=1",
            "proj",
            ClassificationResult::from_matches(vec!["DELETE".to_owned()]),
        )
    }

    async fn answer_with(action: ElicitationAction) -> ApprovalVerdict {
        let (participant, mut rx) = elicitation_queue(1);
        let channel = ElicitationChannel::new(Arc::new(participant));

        let frontend = tokio::spawn(async move {
            let pending = rx.recv().await.unwrap();
            assert_eq!(pending.request.matched_keywords, vec!["DELETE"]);
            assert!(pending.respond(action));
        });

        let verdict = channel
            .request_approval(&request(), &CancellationToken::new())
            .await;
        frontend.await.unwrap();
        verdict
    }

    #[tokio::test]
    async fn test_action_mapping() {
        assert_eq!(
            answer_with(ElicitationAction::Accept).await,
            ApprovalVerdict::Approved
        );
        assert_eq!(
            answer_with(ElicitationAction::Decline).await,
            ApprovalVerdict::Declined
        );
        assert_eq!(
            answer_with(ElicitationAction::Cancel).await,
            ApprovalVerdict::Cancelled
        );
    }

    #[tokio::test]
    async fn test_closed_queue_is_failure() {
        let (participant, rx) = elicitation_queue(1);
        drop(rx);
        let channel = ElicitationChannel::new(Arc::new(participant));

        let verdict = channel
            .request_approval(&request(), &CancellationToken::new())
            .await;
        assert!(matches!(verdict, ApprovalVerdict::Failed(_)));
        assert!(verdict.to_string().contains("elicitation queue closed"));
    }

    #[tokio::test]
    async fn test_dropped_responder_is_failure() {
        let (participant, mut rx) = elicitation_queue(1);
        let channel = ElicitationChannel::new(Arc::new(participant));

        let frontend = tokio::spawn(async move {
            drop(rx.recv().await.unwrap());
        });

        let verdict = channel
            .request_approval(&request(), &CancellationToken::new())
            .await;
        frontend.await.unwrap();
        assert!(matches!(verdict, ApprovalVerdict::Failed(_)));
    }

    #[tokio::test]
    async fn test_cancellation_releases_pending_request() {
        let (participant, mut rx) = elicitation_queue(1);
        let channel = ElicitationChannel::new(Arc::new(participant));
        let cancel = CancellationToken::new();

        let waiter = {
            let cancel = cancel.clone();
            tokio::spawn(async move { channel.request_approval(&request(), &cancel).await })
        };

        let pending = rx.recv().await.unwrap();
        assert!(!pending.is_abandoned());

        cancel.cancel();
        assert_eq!(waiter.await.unwrap(), ApprovalVerdict::Cancelled);
        assert!(pending.is_abandoned());
        assert!(!pending.respond(ElicitationAction::Accept));
    }
}
