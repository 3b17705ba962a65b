//! Prelude module - commonly used types for convenient import.
//!
//! Use `use bqgate_engine::prelude::*;` to import all essential types.

pub use crate::{EngineError, EngineResult};

// Collaborator contract
pub use crate::{CommandOutput, CommandRunner, ProcessRunner};

// Adapter
pub use crate::{BqClient, EngineConfig, ObjectKind, QualifiedName};

// Cost estimation
pub use crate::{CostAdvisory, CostEstimate, CostEstimator, EstimationError};
