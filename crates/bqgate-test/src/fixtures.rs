//! Canned engine output and test setup helpers.

/// Dry-run output in the shape `bq query --dry_run --format=json` prints.
#[must_use]
pub fn dry_run_json(bytes_processed: u64, bytes_billed: u64) -> String {
    serde_json::json!({
        "status": { "state": "DONE" },
        "statistics": {
            "query": {
                "totalBytesProcessed": bytes_processed.to_string(),
                "totalBytesBilled": bytes_billed.to_string(),
            }
        }
    })
    .to_string()
}

/// A small query result set.
#[must_use]
pub fn query_rows_json() -> String {
    serde_json::json!([{ "id": "1", "name": "alice" }]).to_string()
}

/// Route `tracing` output to the test harness. Safe to call repeatedly.
pub fn init_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
