use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::client::BqClient;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Byte counts reported by a dry run. Zero means "not reported".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostEstimate {
    /// Bytes the query would scan.
    pub bytes_processed: u64,
    /// Bytes the query would be billed for.
    pub bytes_billed: u64,
}

impl fmt::Display for CostEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Estimated bytes processed: {} ({:.2} MB)",
            group_thousands(self.bytes_processed),
            megabytes(self.bytes_processed)
        )?;
        if self.bytes_billed > 0 {
            write!(
                f,
                "\nBytes billed: {} ({:.2} MB)",
                group_thousands(self.bytes_billed),
                megabytes(self.bytes_billed)
            )?;
        }
        Ok(())
    }
}

/// Advisory cost information. Never an input to a proceed/deny decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CostAdvisory {
    /// The dry run reported usable statistics.
    Estimate(CostEstimate),
    /// The dry run succeeded but its output could not be read.
    Unavailable,
    /// The dry run failed and the failure was not fatal.
    DryRunFailed,
}

impl CostAdvisory {
    /// The estimate, if one was parsed.
    #[must_use]
    pub fn estimate(&self) -> Option<&CostEstimate> {
        match self {
            Self::Estimate(estimate) => Some(estimate),
            Self::Unavailable | Self::DryRunFailed => None,
        }
    }
}

impl fmt::Display for CostAdvisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Estimate(estimate) => estimate.fmt(f),
            Self::Unavailable => f.write_str("Could not parse cost estimation"),
            Self::DryRunFailed => f.write_str("Cost estimate: dry run failed"),
        }
    }
}

/// The dry run itself failed; carries the engine's diagnostic text.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("dry run failed: {stderr}")]
pub struct EstimationError {
    /// Engine stderr.
    pub stderr: String,
}

/// Produces cost advisories from dry runs.
#[derive(Debug, Clone)]
pub struct CostEstimator {
    client: BqClient,
}

impl CostEstimator {
    /// Create an estimator that dry-runs through `client`.
    #[must_use]
    pub fn new(client: BqClient) -> Self {
        Self { client }
    }

    /// Dry-run `query` in `project` and read its byte statistics.
    ///
    /// # Errors
    ///
    /// Returns [`EstimationError`] when the dry run fails. Unreadable output
    /// is not an error; it yields [`CostAdvisory::Unavailable`].
    pub async fn estimate(&self, query: &str, project: &str) -> Result<CostAdvisory, EstimationError> {
        let output = self.client.dry_run(query, project).await;
        if !output.success {
            debug!(project, exit_code = output.exit_code, "dry run rejected query");
            return Err(EstimationError {
                stderr: output.stderr,
            });
        }
        Ok(parse_dry_run(&output.stdout))
    }
}

/// Read `statistics.query.{totalBytesProcessed,totalBytesBilled}` from dry-run
/// output. Missing fields count as zero; anything malformed is `Unavailable`.
#[must_use]
pub fn parse_dry_run(stdout: &str) -> CostAdvisory {
    let Ok(Value::Object(root)) = serde_json::from_str::<Value>(stdout) else {
        debug!("dry run output is not a JSON object");
        return CostAdvisory::Unavailable;
    };

    let stats = match root.get("statistics") {
        None => None,
        Some(Value::Object(statistics)) => match statistics.get("query") {
            None => None,
            Some(Value::Object(query)) => Some(query),
            Some(_) => return CostAdvisory::Unavailable,
        },
        Some(_) => return CostAdvisory::Unavailable,
    };

    let processed = byte_count(stats, "totalBytesProcessed");
    let billed = byte_count(stats, "totalBytesBilled");

    match (processed, billed) {
        (Some(bytes_processed), Some(bytes_billed)) => CostAdvisory::Estimate(CostEstimate {
            bytes_processed,
            bytes_billed,
        }),
        _ => CostAdvisory::Unavailable,
    }
}

/// `bq` reports counts as decimal strings; plain numbers are accepted too.
fn byte_count(stats: Option<&serde_json::Map<String, Value>>, key: &str) -> Option<u64> {
    match stats.and_then(|s| s.get(key)) {
        None => Some(0),
        Some(Value::String(s)) => s.trim().parse().ok(),
        Some(Value::Number(n)) => n.as_u64(),
        Some(_) => None,
    }
}

#[allow(clippy::cast_precision_loss)]
fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / BYTES_PER_MB
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len().saturating_add(digits.len() / 3));
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len().saturating_sub(i)) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
