//! bqgate Approval - the gate in front of destructive queries.
//!
//! This crate decides whether an operation needs approval and obtains it:
//!
//! - [`Classifier`]: keyword matching under a [`MatchPolicy`]
//! - [`ConfirmationStore`]: short-lived, single-use tokens bound to a body
//! - [`ApprovalChannel`]: one interface, three strategies
//!   - [`TokenEchoChannel`]: the caller resubmits with an issued token
//!   - [`ElicitationChannel`]: a human accepts, declines, or cancels
//!   - [`SamplingChannel`]: a model answers APPROVE or DENY
//! - [`ApprovalVerdict`]: the single answer per destructive request
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use bqgate_approval::prelude::*;
//! use tokio_util::sync::CancellationToken;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> Result<(), ApprovalError> {
//! let classifier = Classifier::with_policy(MatchPolicy::WordBoundary)?;
//! let classification = classifier.classify("DROP TABLE staging.tmp");
//! assert!(classification.is_destructive);
//!
//! let channel = TokenEchoChannel::new(Arc::new(ConfirmationStore::new()));
//! let request = ApprovalRequest::new("DROP TABLE staging.tmp", "my-project", classification);
//! let verdict = channel.request_approval(&request, &CancellationToken::new()).await;
//! assert!(matches!(
//!     verdict,
//!     ApprovalVerdict::Failed(ApprovalFailure::ConfirmationRequired { .. })
//! ));
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod prelude;

pub mod channel;
pub mod classifier;
/// Time source for token expiry.
pub mod clock;
pub mod elicitation;
/// Error types for the approval module.
pub mod error;
pub mod sampling;
pub mod store;
/// The token-echo approval channel.
pub mod token_echo;
/// Approval verdicts.
pub mod verdict;

pub use channel::{ADVISORY_NOT_REQUESTED, ApprovalChannel, ApprovalRequest};
pub use classifier::{ClassificationResult, Classifier, DEFAULT_KEYWORDS, MatchPolicy};
pub use clock::{Clock, SystemClock};
pub use elicitation::{
    ElicitationAction, ElicitationChannel, ElicitationParticipant, ElicitationRequest,
    ElicitationResponse, PendingElicitation, QueuedElicitation, elicitation_queue,
};
pub use error::{ApprovalError, ApprovalResult, ParticipantError};
pub use sampling::{
    APPROVAL_SYSTEM_PROMPT, DEFAULT_SAMPLING_MAX_TOKENS, SamplingChannel, SamplingParticipant,
    SamplingRequest, SamplingResponse,
};
pub use store::{ConfirmationStore, DEFAULT_TOKEN_TTL_SECS};
pub use token_echo::TokenEchoChannel;
pub use verdict::{ApprovalFailure, ApprovalVerdict};
