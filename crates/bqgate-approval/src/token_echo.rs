use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::channel::{ApprovalChannel, ApprovalRequest};
use crate::store::ConfirmationStore;
use crate::verdict::{ApprovalFailure, ApprovalVerdict};

/// Approval by resubmission: the caller must echo back a token the gateway
/// issued for the identical body.
#[derive(Debug, Clone)]
pub struct TokenEchoChannel {
    store: Arc<ConfirmationStore>,
}

impl TokenEchoChannel {
    /// Create a channel over `store`.
    #[must_use]
    pub fn new(store: Arc<ConfirmationStore>) -> Self {
        Self { store }
    }

    /// The backing store.
    #[must_use]
    pub fn store(&self) -> &Arc<ConfirmationStore> {
        &self.store
    }
}

#[async_trait]
impl ApprovalChannel for TokenEchoChannel {
    fn name(&self) -> &'static str {
        "token_echo"
    }

    async fn request_approval(
        &self,
        request: &ApprovalRequest,
        cancel: &CancellationToken,
    ) -> ApprovalVerdict {
        if cancel.is_cancelled() {
            return ApprovalVerdict::Cancelled;
        }

        let Some(token) = request.confirmation_token.as_deref() else {
            let token = self.store.issue(&request.body, &request.context);
            info!(project = %request.context, "issued confirmation token");
            return ApprovalVerdict::Failed(ApprovalFailure::ConfirmationRequired { token });
        };

        if self
            .store
            .validate(token, &request.body, &request.context)
        {
            ApprovalVerdict::Approved
        } else {
            info!(project = %request.context, "rejected confirmation token");
            ApprovalVerdict::Failed(ApprovalFailure::InvalidToken)
        }
    }
}
