//! Configuration types for the bqgate gateway.
//!
//! These types carry no dependency on the other bqgate crates. Domain types
//! are mirrored here and converted at the integration boundary (the CLI's
//! config bridge). Every struct implements [`Default`] so that a bare
//! `[section]` header in TOML produces a working configuration.

use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Approval channel selection and confirmation-token lifetime.
    pub gateway: GatewaySection,
    /// Destructive-statement detection.
    pub classifier: ClassifierSection,
    /// External query engine invocation.
    pub engine: EngineSection,
    /// Model participant used by the sampling approval channel.
    pub sampling: SamplingSection,
    /// Logging level, format, and per-crate directives.
    pub logging: LoggingSection,
}

// ---------------------------------------------------------------------------
// GatewaySection
// ---------------------------------------------------------------------------

/// Which approval channel is active for this deployment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalMode {
    /// Caller must resubmit with a token issued by the gateway.
    #[default]
    TokenEcho,
    /// A human participant accepts, declines, or cancels.
    Elicitation,
    /// A model participant answers APPROVE or DENY.
    Sampling,
}

impl std::fmt::Display for ApprovalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TokenEcho => write!(f, "token_echo"),
            Self::Elicitation => write!(f, "elicitation"),
            Self::Sampling => write!(f, "sampling"),
        }
    }
}

impl std::str::FromStr for ApprovalMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "token_echo" | "token-echo" => Ok(Self::TokenEcho),
            "elicitation" => Ok(Self::Elicitation),
            "sampling" => Ok(Self::Sampling),
            other => Err(format!(
                "unknown approval mode '{other}'; expected token_echo, elicitation or sampling"
            )),
        }
    }
}

/// When the gateway runs the dry run and how it treats its failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DryRunMode {
    /// Every query is dry-run first; a failed dry run rejects the request.
    #[default]
    Required,
    /// Every query is dry-run first; a failed dry run only degrades the advisory.
    Advisory,
    /// Destructive queries skip the dry run and go straight to approval.
    SkipForDestructive,
}

/// Gateway orchestration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewaySection {
    /// Active approval channel.
    pub approval: ApprovalMode,
    /// Dry-run gating policy.
    pub dry_run: DryRunMode,
    /// Lifetime of a confirmation token, in seconds.
    pub token_ttl_secs: u64,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            approval: ApprovalMode::default(),
            dry_run: DryRunMode::default(),
            token_ttl_secs: 60,
        }
    }
}

// ---------------------------------------------------------------------------
// ClassifierSection
// ---------------------------------------------------------------------------

/// How keywords are matched against a query body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordPolicy {
    /// Keywords only match as whole tokens (`created_at` is not `CREATE`).
    #[default]
    WordBoundary,
    /// Keywords match anywhere in the body.
    Substring,
}

/// Destructive-statement detection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierSection {
    /// Matching policy.
    pub policy: KeywordPolicy,
    /// Keywords that mark a query as destructive (case-insensitive).
    pub keywords: Vec<String>,
}

impl Default for ClassifierSection {
    fn default() -> Self {
        Self {
            policy: KeywordPolicy::default(),
            keywords: [
                "DELETE", "DROP", "TRUNCATE", "ALTER", "CREATE", "UPDATE", "INSERT",
            ]
            .iter()
            .map(|k| (*k).to_owned())
            .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// EngineSection
// ---------------------------------------------------------------------------

/// External query engine settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Engine binary (looked up on `PATH` when not absolute).
    pub binary: String,
    /// Whether queries use legacy SQL.
    pub use_legacy_sql: bool,
    /// Output format requested from the engine.
    pub format: String,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            binary: "bq".to_owned(),
            use_legacy_sql: false,
            format: "json".to_owned(),
        }
    }
}

// ---------------------------------------------------------------------------
// SamplingSection
// ---------------------------------------------------------------------------

/// Model participant settings.
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SamplingSection {
    /// Model name sent to the provider API.
    pub model: String,
    /// API key. Prefer `ANTHROPIC_API_KEY` over storing this in a file.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    /// Base URL override for the provider API.
    #[serde(skip_serializing)]
    pub api_url: Option<String>,
    /// Maximum tokens for the judgment.
    pub max_tokens: u32,
}

impl Default for SamplingSection {
    fn default() -> Self {
        Self {
            model: "claude-3-5-haiku-latest".to_owned(),
            api_key: None,
            api_url: None,
            max_tokens: 16,
        }
    }
}

impl std::fmt::Debug for SamplingSection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamplingSection")
            .field("model", &self.model)
            .field("has_api_key", &self.api_key.is_some())
            .field("has_api_url", &self.api_url.is_some())
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl Serialize for SamplingSection {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SamplingSection", 2)?;
        state.serialize_field("model", &self.model)?;
        state.serialize_field("max_tokens", &self.max_tokens)?;
        state.end()
    }
}

// ---------------------------------------------------------------------------
// LoggingSection
// ---------------------------------------------------------------------------

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    /// Base level filter (`error`, `warn`, `info`, `debug`, `trace`).
    pub level: String,
    /// Output format (`pretty`, `compact`, `json`, `full`).
    pub format: String,
    /// Extra `EnvFilter` directives, e.g. `bqgate_gateway=debug`.
    pub directives: Vec<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: "warn".to_owned(),
            format: "compact".to_owned(),
            directives: Vec::new(),
        }
    }
}
