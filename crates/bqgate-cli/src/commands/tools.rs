//! List the caller-facing tools.

use anyhow::Result;
use bqgate_gateway::{QueryTools, SERVER_DESCRIPTION};

use crate::theme::Theme;

/// Print every tool's name and description.
pub(crate) fn list_tools(json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(QueryTools::descriptions())?
        );
        return Ok(());
    }

    println!("{}", Theme::header("Tools"));
    println!("{}", Theme::dimmed(SERVER_DESCRIPTION));
    println!();
    for tool in QueryTools::descriptions() {
        println!("{}", Theme::kv(tool.name, tool.description));
        println!();
    }
    Ok(())
}
