//! Read-only table and routine lookups.

use std::process::ExitCode;

use bqgate_engine::ObjectKind;
use bqgate_gateway::{LookupOutcome, QueryTools};

use crate::theme::Theme;

/// Print the schema of `table_id`.
pub(crate) async fn show_schema(tools: &QueryTools, table_id: &str) -> ExitCode {
    report(&tools.lookup(table_id, ObjectKind::Table).await)
}

/// Print the definition of `routine_id`.
pub(crate) async fn show_routine(tools: &QueryTools, routine_id: &str) -> ExitCode {
    report(&tools.lookup(routine_id, ObjectKind::Routine).await)
}

fn report(outcome: &LookupOutcome) -> ExitCode {
    if outcome.is_found() {
        println!("{outcome}");
        ExitCode::SUCCESS
    } else {
        eprintln!("{}", Theme::error(&outcome.to_string()));
        ExitCode::FAILURE
    }
}
