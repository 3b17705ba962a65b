//! bqgate Engine - the boundary between the gateway and the `bq` tool.
//!
//! This crate owns everything that talks to the query engine:
//!
//! - [`CommandRunner`]: the collaborator contract. Every invocation yields a
//!   [`CommandOutput`]; failures are data, not errors.
//! - [`ProcessRunner`]: the production runner, spawning the binary with
//!   `tokio::process`.
//! - [`BqClient`]: builds the argument vectors for schema lookups, routine
//!   lookups, dry runs and real executions.
//! - [`QualifiedName`]: `project.dataset.object` parsing.
//! - [`CostEstimator`]: dry-run based byte estimates for advisory display.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bqgate_engine::{BqClient, EngineConfig, ProcessRunner, QualifiedName, ObjectKind};
//!
//! # async fn example() -> Result<(), bqgate_engine::EngineError> {
//! let client = BqClient::new(Arc::new(ProcessRunner::new()), EngineConfig::default());
//! let table = QualifiedName::parse("my-project.sales.orders", ObjectKind::Table)?;
//! let output = client.show(&table).await;
//! if output.success {
//!     println!("{}", output.stdout);
//! }
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

/// Argument-vector construction for `bq` subcommands.
pub mod client;
/// Dry-run cost estimation.
pub mod cost;
/// Error types for the engine boundary.
pub mod error;
/// Qualified identifier parsing.
pub mod identifier;
/// The collaborator contract and the process-backed runner.
pub mod runner;

pub use client::{BqClient, EngineConfig};
pub use cost::{CostAdvisory, CostEstimate, CostEstimator, EstimationError};
pub use error::{EngineError, EngineResult};
pub use identifier::{ObjectKind, QualifiedName};
pub use runner::{CommandOutput, CommandRunner, ProcessRunner};
