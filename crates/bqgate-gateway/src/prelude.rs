//! Prelude module - commonly used types for convenient import.
//!
//! Use `use bqgate_gateway::prelude::*;` to import all essential types.

pub use crate::{
    DryRunPolicy, ExecutionResult, Gateway, GatewayOutcome, LookupOutcome, OperationRequest,
    QueryTools, Rejection, ToolDescription,
};
