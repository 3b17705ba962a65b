//! The gated execution state machine.
//!
//! `Received → Classified → [destructive] AwaitingApproval → Verdicted →
//! Executed | Rejected`
//!
//! The real (non-dry-run) query is only invoked after a non-destructive
//! classification or an [`ApprovalVerdict::Approved`]. Nothing is retried.

use std::fmt;
use std::sync::Arc;

use bqgate_approval::{
    ApprovalChannel, ApprovalFailure, ApprovalRequest, ApprovalVerdict, ClassificationResult,
    Classifier,
};
use bqgate_engine::{BqClient, CostAdvisory, CostEstimator};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::outcome::{ExecutionResult, GatewayOutcome, Rejection};
use crate::request::{DryRunPolicy, OperationRequest};

/// Orchestrates classification, estimation, approval and execution.
#[derive(Clone)]
pub struct Gateway {
    classifier: Arc<Classifier>,
    estimator: CostEstimator,
    channel: Arc<dyn ApprovalChannel>,
    client: BqClient,
    dry_run: DryRunPolicy,
}

impl fmt::Debug for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gateway")
            .field("policy", &self.classifier.policy())
            .field("channel", &self.channel.name())
            .field("dry_run", &self.dry_run)
            .finish_non_exhaustive()
    }
}

impl Gateway {
    /// Create a gateway. Cost estimation dry-runs through the same client.
    #[must_use]
    pub fn new(classifier: Classifier, client: BqClient, channel: Arc<dyn ApprovalChannel>) -> Self {
        Self {
            classifier: Arc::new(classifier),
            estimator: CostEstimator::new(client.clone()),
            channel,
            client,
            dry_run: DryRunPolicy::default(),
        }
    }

    /// Set the dry-run policy.
    #[must_use]
    pub fn with_dry_run_policy(mut self, policy: DryRunPolicy) -> Self {
        self.dry_run = policy;
        self
    }

    /// The engine client, for read-only lookups.
    #[must_use]
    pub fn client(&self) -> &BqClient {
        &self.client
    }

    /// The active approval channel.
    #[must_use]
    pub fn channel(&self) -> &Arc<dyn ApprovalChannel> {
        &self.channel
    }

    /// Run one request to its terminal state.
    pub async fn execute(&self, request: &OperationRequest) -> GatewayOutcome {
        self.execute_with_cancel(request, &CancellationToken::new())
            .await
    }

    /// Run one request to its terminal state. Cancelling `cancel` before the
    /// real query starts rejects the request as cancelled.
    pub async fn execute_with_cancel(
        &self,
        request: &OperationRequest,
        cancel: &CancellationToken,
    ) -> GatewayOutcome {
        if let Some(message) = malformed(request) {
            return GatewayOutcome::Rejected(Rejection::MalformedRequest { message });
        }

        let classification = self.classifier.classify(&request.body);
        debug!(
            project = %request.context,
            destructive = classification.is_destructive,
            "classified query"
        );

        let advisory = match self.preflight(request, &classification).await {
            Ok(advisory) => advisory,
            Err(rejection) => return GatewayOutcome::Rejected(rejection),
        };

        if classification.is_destructive {
            if let Err(rejection) = self
                .approve(request, classification, advisory, cancel)
                .await
            {
                return GatewayOutcome::Rejected(rejection);
            }
        } else if let Some(advisory) = advisory {
            info!(project = %request.context, cost = %advisory, "query cost estimation");
        }

        if cancel.is_cancelled() {
            info!(project = %request.context, "request cancelled before execution");
            return GatewayOutcome::Rejected(Rejection::Cancelled);
        }

        let output = self.client.query(&request.body, &request.context).await;
        if output.success {
            info!(project = %request.context, "query executed");
        } else {
            warn!(project = %request.context, exit_code = output.exit_code, "query execution failed");
        }
        GatewayOutcome::Executed(ExecutionResult { output, advisory })
    }

    /// Run the dry run the policy calls for.
    async fn preflight(
        &self,
        request: &OperationRequest,
        classification: &ClassificationResult,
    ) -> Result<Option<CostAdvisory>, Rejection> {
        if classification.is_destructive && self.dry_run == DryRunPolicy::SkipForDestructive {
            debug!(project = %request.context, "skipping dry run for destructive query");
            return Ok(None);
        }

        match self.estimator.estimate(&request.body, &request.context).await {
            Ok(advisory) => {
                if advisory == CostAdvisory::Unavailable {
                    warn!(project = %request.context, "dry run output could not be parsed");
                }
                Ok(Some(advisory))
            },
            Err(e) if self.dry_run == DryRunPolicy::Advisory => {
                warn!(project = %request.context, error = %e, "dry run failed, continuing without estimate");
                Ok(Some(CostAdvisory::DryRunFailed))
            },
            Err(e) => {
                info!(project = %request.context, "query rejected by dry run");
                Err(Rejection::ValidationFailed { stderr: e.stderr })
            },
        }
    }

    /// Obtain a verdict and map anything but approval to a rejection.
    async fn approve(
        &self,
        request: &OperationRequest,
        classification: ClassificationResult,
        advisory: Option<CostAdvisory>,
        cancel: &CancellationToken,
    ) -> Result<(), Rejection> {
        info!(
            project = %request.context,
            keywords = ?classification.matched_keywords,
            channel = self.channel.name(),
            "destructive query requires approval"
        );

        let approval = ApprovalRequest {
            body: request.body.clone(),
            context: request.context.clone(),
            confirmation_token: request.confirmation_token.clone(),
            classification,
            advisory,
        };
        let verdict = self.channel.request_approval(&approval, cancel).await;
        info!(project = %request.context, %verdict, "approval verdict");

        match verdict {
            ApprovalVerdict::Approved => Ok(()),
            ApprovalVerdict::Declined => Err(Rejection::Declined),
            ApprovalVerdict::Cancelled => Err(Rejection::Cancelled),
            ApprovalVerdict::Failed(ApprovalFailure::ConfirmationRequired { token }) => {
                Err(Rejection::ConfirmationRequired { token, advisory })
            },
            ApprovalVerdict::Failed(ApprovalFailure::InvalidToken) => Err(Rejection::InvalidToken),
            ApprovalVerdict::Failed(ApprovalFailure::Channel { message }) => {
                Err(Rejection::ApprovalFailed { message })
            },
        }
    }
}

fn malformed(request: &OperationRequest) -> Option<String> {
    if request.body.trim().is_empty() {
        Some("Error: query must not be empty".to_owned())
    } else if request.context.trim().is_empty() {
        Some("Error: project_id must not be empty".to_owned())
    } else {
        None
    }
}
