//! The caller-facing tool surface.
//!
//! Two read-only lookups pass straight through to the engine; the third tool
//! runs the gated flow. Every tool returns plain text; the typed results are
//! available through [`QueryTools::lookup`] and [`Gateway::execute`].

use bqgate_engine::{ObjectKind, QualifiedName};
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::gateway::Gateway;
use crate::outcome::LookupOutcome;
use crate::request::OperationRequest;

/// Description of the whole tool set, for transports that list it.
pub const SERVER_DESCRIPTION: &str = "BigQuery server for getting table schemas and routine \
    information. Use get_bq_schema for tables/views and get_bq_routine for TVFs, stored \
    procedures, and functions. When analyzing SQL queries with mixed identifiers, check both \
    table and routine endpoints to identify the correct object type.";

/// Name and description of one tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToolDescription {
    /// Tool name.
    pub name: &'static str,
    /// What the tool does and what it takes.
    pub description: &'static str,
}

/// Tool name for table schema lookups.
pub const GET_SCHEMA: &str = "get_bq_schema";
/// Tool name for routine lookups.
pub const GET_ROUTINE: &str = "get_bq_routine";
/// Tool name for gated query execution.
pub const EXECUTE_QUERY: &str = "execute_bq_query";

const TOOLS: &[ToolDescription] = &[
    ToolDescription {
        name: GET_SCHEMA,
        description: "Get BigQuery table schema for a given table ID. \
            Argument table_id: full table ID in format project.dataset.table. \
            Returns the JSON schema of the table.",
    },
    ToolDescription {
        name: GET_ROUTINE,
        description: "Get BigQuery routine (TVF, stored procedure, function) information for a \
            given routine ID. Argument routine_id: full routine ID in format \
            project.dataset.routine_name. Returns JSON including definition, parameters, and \
            return type.",
    },
    ToolDescription {
        name: EXECUTE_QUERY,
        description: "Execute a BigQuery query with safety checks. Arguments: query (SQL), \
            project_id (Google Cloud project), confirmation_token (required for destructive \
            operations such as DELETE or DROP). Returns query results or a confirmation \
            requirement.",
    },
];

/// The three tools over one [`Gateway`].
#[derive(Debug, Clone)]
pub struct QueryTools {
    gateway: Gateway,
}

impl QueryTools {
    /// Expose `gateway` as tools.
    #[must_use]
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Descriptions of every tool.
    #[must_use]
    pub fn descriptions() -> &'static [ToolDescription] {
        TOOLS
    }

    /// The underlying gateway.
    #[must_use]
    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// `get_bq_schema`: describe a table or view.
    pub async fn get_schema(&self, table_id: &str) -> String {
        self.lookup(table_id, ObjectKind::Table).await.to_string()
    }

    /// `get_bq_routine`: describe a routine.
    pub async fn get_routine(&self, routine_id: &str) -> String {
        self.lookup(routine_id, ObjectKind::Routine).await.to_string()
    }

    /// `execute_bq_query`: run the gated flow.
    pub async fn execute_query(
        &self,
        query: &str,
        project_id: &str,
        confirmation_token: Option<&str>,
    ) -> String {
        self.execute_query_with_cancel(
            query,
            project_id,
            confirmation_token,
            &CancellationToken::new(),
        )
        .await
    }

    /// `execute_bq_query`, abandoning a pending approval when `cancel` fires.
    pub async fn execute_query_with_cancel(
        &self,
        query: &str,
        project_id: &str,
        confirmation_token: Option<&str>,
        cancel: &CancellationToken,
    ) -> String {
        let request = OperationRequest::new(query, project_id)
            .with_token(confirmation_token.map(str::to_owned));
        self.gateway
            .execute_with_cancel(&request, cancel)
            .await
            .to_string()
    }

    /// Describe the table or routine named by `raw`.
    pub async fn lookup(&self, raw: &str, kind: ObjectKind) -> LookupOutcome {
        let name = match QualifiedName::parse(raw, kind) {
            Ok(name) => name,
            Err(e) => {
                return LookupOutcome::MalformedId {
                    message: e.to_string(),
                };
            },
        };
        debug!(project = %name.project, object = %name.object, ?kind, "engine lookup");

        let output = self.gateway.client().show(&name).await;
        if output.success {
            LookupOutcome::Found {
                json: output.stdout,
            }
        } else {
            LookupOutcome::Failed {
                kind,
                stderr: output.stderr,
            }
        }
    }
}
