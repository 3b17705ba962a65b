use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::identifier::{ObjectKind, QualifiedName};
use crate::runner::{CommandOutput, CommandRunner};

/// How `bq` is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Program name or path.
    pub binary: String,
    /// Value of `--use_legacy_sql` for queries.
    pub use_legacy_sql: bool,
    /// Value of `--format`.
    pub format: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            binary: "bq".to_owned(),
            use_legacy_sql: false,
            format: "json".to_owned(),
        }
    }
}

/// Builds `bq` argument vectors and hands them to a [`CommandRunner`].
#[derive(Clone)]
pub struct BqClient {
    runner: Arc<dyn CommandRunner>,
    config: EngineConfig,
}

impl fmt::Debug for BqClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BqClient")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl BqClient {
    /// Create a client over the given runner.
    #[must_use]
    pub fn new(runner: Arc<dyn CommandRunner>, config: EngineConfig) -> Self {
        Self { runner, config }
    }

    /// The invocation settings.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Describe a table or routine.
    pub async fn show(&self, name: &QualifiedName) -> CommandOutput {
        self.runner.run(&self.show_args(name)).await
    }

    /// Validate a query and report its cost without running it.
    pub async fn dry_run(&self, query: &str, project: &str) -> CommandOutput {
        self.runner.run(&self.query_args(query, project, true)).await
    }

    /// Run a query for real.
    pub async fn query(&self, query: &str, project: &str) -> CommandOutput {
        self.runner.run(&self.query_args(query, project, false)).await
    }

    /// `bq --project_id P show [--routine] --format=F dataset.object`
    #[must_use]
    pub fn show_args(&self, name: &QualifiedName) -> Vec<String> {
        let mut args = vec![
            self.config.binary.clone(),
            "--project_id".to_owned(),
            name.project.clone(),
            "show".to_owned(),
        ];
        if name.kind == ObjectKind::Routine {
            args.push("--routine".to_owned());
        }
        args.push(format!("--format={}", self.config.format));
        args.push(name.object.clone());
        args
    }

    /// `bq query [--dry_run] --format=F --project_id=P --use_legacy_sql=B query`
    #[must_use]
    pub fn query_args(&self, query: &str, project: &str, dry_run: bool) -> Vec<String> {
        let mut args = vec![self.config.binary.clone(), "query".to_owned()];
        if dry_run {
            args.push("--dry_run".to_owned());
        }
        args.push(format!("--format={}", self.config.format));
        args.push(format!("--project_id={project}"));
        args.push(format!("--use_legacy_sql={}", self.config.use_legacy_sql));
        args.push(query.to_owned());
        args
    }
}
