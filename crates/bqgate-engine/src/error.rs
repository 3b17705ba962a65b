use thiserror::Error;

use crate::identifier::ObjectKind;

/// Errors raised before the engine is ever invoked.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A qualified identifier had fewer than three dotted segments.
    #[error("Error: {} must be in format {}", .0.argument_name(), .0.expected_format())]
    MalformedIdentifier(ObjectKind),
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
