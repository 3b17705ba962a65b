use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// What a qualified name refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    /// A table or view.
    Table,
    /// A table-valued function, stored procedure, or function.
    Routine,
}

impl ObjectKind {
    /// Name of the caller-facing argument that carries this identifier.
    #[must_use]
    pub fn argument_name(self) -> &'static str {
        match self {
            Self::Table => "table_id",
            Self::Routine => "routine_id",
        }
    }

    /// The shape the identifier must have.
    #[must_use]
    pub fn expected_format(self) -> &'static str {
        match self {
            Self::Table => "project.dataset.table",
            Self::Routine => "project.dataset.routine_name",
        }
    }
}

/// A `project.dataset.object` identifier split at the project boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QualifiedName {
    /// What the name refers to.
    pub kind: ObjectKind,
    /// The project segment.
    pub project: String,
    /// Everything after the project, still dotted (`dataset.object`).
    pub object: String,
}

impl QualifiedName {
    /// Parse a dotted identifier with at least three segments.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::MalformedIdentifier`] when fewer than three
    /// segments are present.
    pub fn parse(raw: &str, kind: ObjectKind) -> EngineResult<Self> {
        let mut parts = raw.split('.');
        let project = parts.next().unwrap_or_default();
        let rest: Vec<&str> = parts.collect();

        if rest.len() < 2 {
            return Err(EngineError::MalformedIdentifier(kind));
        }

        Ok(Self {
            kind,
            project: project.to_owned(),
            object: rest.join("."),
        })
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.project, self.object)
    }
}
