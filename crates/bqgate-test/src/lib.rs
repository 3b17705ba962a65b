//! bqgate Test - Shared test utilities for the query gateway.
//!
//! Mock collaborators and participants, plus fixtures, for use as a
//! dev-dependency.
//!
//! ```rust,ignore
//! use bqgate_test::{ScriptedRunner, dry_run_json};
//! use bqgate_engine::CommandOutput;
//!
//! let runner = ScriptedRunner::new()
//!     .with_dry_run(CommandOutput::ok(dry_run_json(1_048_576, 0)))
//!     .with_query(CommandOutput::ok("[]"));
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![deny(clippy::all)]
#![warn(unreachable_pub)]

pub mod fixtures;
pub mod mocks;

pub use fixtures::*;
pub use mocks::*;
