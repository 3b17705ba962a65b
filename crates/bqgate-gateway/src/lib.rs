//! bqgate Gateway - guarded execution of BigQuery operations.
//!
//! [`Gateway`] runs every request through the same state machine:
//!
//! 1. Classify the body.
//! 2. Dry-run it for a cost estimate, as the [`DryRunPolicy`] says.
//! 3. If destructive, ask the configured approval channel.
//! 4. Execute only on a safe classification or an approval.
//!
//! Every branch ends in a [`GatewayOutcome`] whose `Display` is the text the
//! caller sees. [`QueryTools`] wraps the gateway as the three caller-facing
//! tools.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bqgate_approval::{Classifier, ConfirmationStore, MatchPolicy, TokenEchoChannel};
//! use bqgate_engine::{BqClient, EngineConfig, ProcessRunner};
//! use bqgate_gateway::{Gateway, QueryTools};
//!
//! # async fn example() -> Result<(), bqgate_approval::ApprovalError> {
//! let client = BqClient::new(Arc::new(ProcessRunner::new()), EngineConfig::default());
//! let channel = Arc::new(TokenEchoChannel::new(Arc::new(ConfirmationStore::new())));
//! let classifier = Classifier::with_policy(MatchPolicy::WordBoundary)?;
//! let tools = QueryTools::new(Gateway::new(classifier, client, channel));
//!
//! let reply = tools.execute_query("DROP TABLE staging.tmp", "my-project", None).await;
//! assert!(reply.contains("confirmation_token"));
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

pub mod gateway;
pub mod outcome;
/// Request types and dry-run policy.
pub mod request;
pub mod tools;

pub use gateway::Gateway;
pub use outcome::{ExecutionResult, GatewayOutcome, LookupOutcome, Rejection};
pub use request::{DryRunPolicy, OperationRequest};
pub use tools::{
    EXECUTE_QUERY, GET_ROUTINE, GET_SCHEMA, QueryTools, SERVER_DESCRIPTION, ToolDescription,
};
