//! Bridge from `bqgate_config::Config` to domain types.
//!
//! The config crate has no dependencies on other internal crates. This module
//! translates its types into the ones the engine, approval and gateway crates
//! use, and assembles a [`Gateway`] from them.

use std::sync::Arc;

use anyhow::{Context, Result};
use bqgate_approval::{
    ApprovalChannel, Classifier, ConfirmationStore, ElicitationChannel, MatchPolicy,
    SamplingChannel, SystemClock, TokenEchoChannel,
};
use bqgate_config::{ApprovalMode, Config, DryRunMode, KeywordPolicy};
use bqgate_engine::{BqClient, EngineConfig, ProcessRunner};
use bqgate_gateway::{DryRunPolicy, Gateway};
use bqgate_telemetry::{LogConfig, LogFormat};

use crate::frontend::spawn_terminal_prompt;
use crate::sampler::{ClaudeSampler, SamplerConfig};

/// Convert config to the engine invocation settings.
#[must_use]
pub fn to_engine_config(cfg: &Config) -> EngineConfig {
    EngineConfig {
        binary: cfg.engine.binary.clone(),
        use_legacy_sql: cfg.engine.use_legacy_sql,
        format: cfg.engine.format.clone(),
    }
}

/// Convert the keyword policy.
#[must_use]
pub fn to_match_policy(policy: KeywordPolicy) -> MatchPolicy {
    match policy {
        KeywordPolicy::WordBoundary => MatchPolicy::WordBoundary,
        KeywordPolicy::Substring => MatchPolicy::Substring,
    }
}

/// Convert the dry-run mode.
#[must_use]
pub fn to_dry_run_policy(mode: DryRunMode) -> DryRunPolicy {
    match mode {
        DryRunMode::Required => DryRunPolicy::Required,
        DryRunMode::Advisory => DryRunPolicy::Advisory,
        DryRunMode::SkipForDestructive => DryRunPolicy::SkipForDestructive,
    }
}

/// Build the classifier from the `[classifier]` section.
///
/// # Errors
///
/// Fails when a configured keyword is empty.
pub fn to_classifier(cfg: &Config) -> Result<Classifier> {
    Classifier::new(
        to_match_policy(cfg.classifier.policy),
        &cfg.classifier.keywords,
    )
    .context("invalid [classifier] keywords")
}

/// Convert config to [`SamplerConfig`].
#[must_use]
pub fn to_sampler_config(cfg: &Config) -> SamplerConfig {
    let mut sampler = SamplerConfig::new(cfg.sampling.api_key.clone().unwrap_or_default())
        .with_model(&cfg.sampling.model);
    if let Some(url) = &cfg.sampling.api_url {
        sampler = sampler.with_base_url(url);
    }
    sampler
}

/// Convert config to [`LogConfig`].
#[must_use]
pub fn to_log_config(cfg: &Config) -> LogConfig {
    let format = cfg
        .logging
        .format
        .parse::<LogFormat>()
        .unwrap_or_default();

    let mut log_config = LogConfig::new(&cfg.logging.level).with_format(format);

    for directive in &cfg.logging.directives {
        log_config = log_config.with_directive(directive);
    }

    log_config
}

/// Build the approval channel for `mode`.
///
/// The elicitation channel starts the terminal prompt loop, so this must run
/// inside a Tokio runtime.
#[must_use]
pub fn to_approval_channel(cfg: &Config, mode: ApprovalMode) -> Arc<dyn ApprovalChannel> {
    match mode {
        ApprovalMode::TokenEcho => {
            let store =
                ConfirmationStore::with_clock(Arc::new(SystemClock), cfg.gateway.token_ttl_secs);
            Arc::new(TokenEchoChannel::new(Arc::new(store)))
        },
        ApprovalMode::Elicitation => {
            Arc::new(ElicitationChannel::new(Arc::new(spawn_terminal_prompt())))
        },
        ApprovalMode::Sampling => {
            let sampler = ClaudeSampler::new(to_sampler_config(cfg));
            Arc::new(
                SamplingChannel::new(Arc::new(sampler)).with_max_tokens(cfg.sampling.max_tokens),
            )
        },
    }
}

/// Assemble the gateway described by `cfg`, with `mode` as the active channel.
///
/// # Errors
///
/// Fails when the classifier keywords are invalid.
pub fn to_gateway(cfg: &Config, mode: ApprovalMode) -> Result<Gateway> {
    let client = BqClient::new(Arc::new(ProcessRunner::new()), to_engine_config(cfg));
    let gateway = Gateway::new(to_classifier(cfg)?, client, to_approval_channel(cfg, mode))
        .with_dry_run_policy(to_dry_run_policy(cfg.gateway.dry_run));
    Ok(gateway)
}
