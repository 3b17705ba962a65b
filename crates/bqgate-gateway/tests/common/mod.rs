//! Shared harness for gateway integration tests.

use std::sync::Arc;

use bqgate_approval::{
    ApprovalChannel, Classifier, ConfirmationStore, DEFAULT_TOKEN_TTL_SECS, ElicitationChannel,
    MatchPolicy, SamplingChannel, SamplingParticipant, TokenEchoChannel,
};
use bqgate_engine::{BqClient, EngineConfig};
use bqgate_gateway::{DryRunPolicy, Gateway, QueryTools};
use bqgate_test::{ManualClock, ScriptedElicitation, ScriptedRunner, init_test_logging};

/// A gateway wired to scripted collaborators.
#[allow(dead_code)]
pub struct Harness {
    /// The gateway under test.
    pub gateway: Gateway,
    /// The engine double; inspect its calls.
    pub runner: ScriptedRunner,
}

#[allow(dead_code)]
impl Harness {
    /// Gateway over `channel` with the default classifier and dry-run policy.
    pub fn new(runner: ScriptedRunner, channel: Arc<dyn ApprovalChannel>) -> Self {
        Self::with(runner, channel, MatchPolicy::WordBoundary, DryRunPolicy::Required)
    }

    /// Gateway with explicit policies.
    pub fn with(
        runner: ScriptedRunner,
        channel: Arc<dyn ApprovalChannel>,
        policy: MatchPolicy,
        dry_run: DryRunPolicy,
    ) -> Self {
        init_test_logging();
        let client = BqClient::new(Arc::new(runner.clone()), EngineConfig::default());
        let gateway = Gateway::new(Classifier::with_policy(policy).unwrap(), client, channel)
            .with_dry_run_policy(dry_run);
        Self { gateway, runner }
    }

    /// Token-echo gateway over a manual clock.
    pub fn token_echo(runner: ScriptedRunner, clock: Arc<ManualClock>) -> Self {
        let store = Arc::new(ConfirmationStore::with_clock(clock, DEFAULT_TOKEN_TTL_SECS));
        Self::new(runner, Arc::new(TokenEchoChannel::new(store)))
    }

    /// Interactive gateway over a scripted participant.
    pub fn elicitation(runner: ScriptedRunner, participant: ScriptedElicitation) -> Self {
        Self::new(
            runner,
            Arc::new(ElicitationChannel::new(Arc::new(participant))),
        )
    }

    /// Model-sampling gateway over `participant`.
    pub fn sampling(runner: ScriptedRunner, participant: Arc<dyn SamplingParticipant>) -> Self {
        Self::new(runner, Arc::new(SamplingChannel::new(participant)))
    }

    /// The tool surface over this gateway.
    pub fn tools(&self) -> QueryTools {
        QueryTools::new(self.gateway.clone())
    }
}
