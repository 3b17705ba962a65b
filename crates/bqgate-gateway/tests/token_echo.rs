//! Token-echo approval through the gateway.
//!
//! A destructive request without a token is answered with a challenge that
//! carries a fresh token; resubmitting the identical body with that token
//! executes it exactly once.

mod common;

use std::sync::Arc;

use async_trait::async_trait;
use bqgate_approval::{
    Classifier, ConfirmationStore, DEFAULT_TOKEN_TTL_SECS, MatchPolicy, TokenEchoChannel,
};
use bqgate_engine::{BqClient, CommandOutput, CommandRunner, EngineConfig};
use bqgate_gateway::{Gateway, GatewayOutcome, OperationRequest, Rejection};
use bqgate_test::{CallKind, ManualClock, ScriptedRunner, dry_run_json};
use common::Harness;
use tokio_util::sync::CancellationToken;

fn challenge_token(outcome: &GatewayOutcome) -> String {
    outcome
        .challenge_token()
        .unwrap_or_else(|| panic!("expected a challenge, got {outcome:?}"))
        .to_owned()
}

#[tokio::test]
async fn test_challenge_then_execute() {
    let runner = ScriptedRunner::new().with_dry_run(CommandOutput::ok(dry_run_json(1_234_567, 0)));
    let harness = Harness::token_echo(runner, Arc::new(ManualClock::new()));

    let first = harness
        .gateway
        .execute(&OperationRequest::new("DROP TABLE foo", "proj"))
        .await;
    let token = challenge_token(&first);
    assert_eq!(token.len(), 16);
    assert_eq!(harness.runner.execution_count(), 0);

    let text = first.to_string();
    assert!(text.starts_with("⚠️  DANGEROUS QUERY DETECTED\n\n"));
    assert!(text.contains("Estimated bytes processed: 1,234,567 (1.18 MB)"));
    assert!(text.ends_with(&format!(
        "To execute this query, call again with confirmation_token: {token}"
    )));

    let second = harness
        .gateway
        .execute(&OperationRequest::new("DROP TABLE foo", "proj").with_token(Some(token)))
        .await;
    assert!(second.is_executed());
    assert_eq!(harness.runner.execution_count(), 1);
    assert_eq!(
        harness.runner.calls_of(CallKind::Execute)[0],
        vec![
            "bq",
            "query",
            "--format=json",
            "--project_id=proj",
            "--use_legacy_sql=false",
            "DROP TABLE foo"
        ]
    );
}

#[tokio::test]
async fn test_token_for_other_body_is_invalid() {
    let harness = Harness::token_echo(ScriptedRunner::new(), Arc::new(ManualClock::new()));

    let token = challenge_token(
        &harness
            .gateway
            .execute(&OperationRequest::new("DROP TABLE foo", "proj"))
            .await,
    );

    let outcome = harness
        .gateway
        .execute(&OperationRequest::new("DROP TABLE bar", "proj").with_token(Some(token)))
        .await;
    assert_eq!(outcome.rejection(), Some(&Rejection::InvalidToken));
    assert_eq!(
        outcome.to_string(),
        "Invalid or expired confirmation token. Please request a new one."
    );
    assert_eq!(harness.runner.execution_count(), 0);
}

#[tokio::test]
async fn test_mismatch_does_not_burn_the_token() {
    let harness = Harness::token_echo(ScriptedRunner::new(), Arc::new(ManualClock::new()));
    let token = challenge_token(
        &harness
            .gateway
            .execute(&OperationRequest::new("DROP TABLE foo", "proj"))
            .await,
    );

    let wrong = OperationRequest::new("DROP TABLE bar", "proj").with_token(Some(token.clone()));
    assert!(!harness.gateway.execute(&wrong).await.is_executed());

    let right = OperationRequest::new("DROP TABLE foo", "proj").with_token(Some(token));
    assert!(harness.gateway.execute(&right).await.is_executed());
}

#[tokio::test]
async fn test_token_is_single_use() {
    let harness = Harness::token_echo(ScriptedRunner::new(), Arc::new(ManualClock::new()));
    let token = challenge_token(
        &harness
            .gateway
            .execute(&OperationRequest::new("TRUNCATE TABLE t", "proj"))
            .await,
    );
    let confirmed = OperationRequest::new("TRUNCATE TABLE t", "proj").with_token(Some(token));

    assert!(harness.gateway.execute(&confirmed).await.is_executed());
    assert_eq!(
        harness.gateway.execute(&confirmed).await.rejection(),
        Some(&Rejection::InvalidToken)
    );
    assert_eq!(harness.runner.execution_count(), 1);
}

#[tokio::test]
async fn test_expired_token_is_rejected_and_forgotten() {
    let clock = Arc::new(ManualClock::new());
    let harness = Harness::token_echo(ScriptedRunner::new(), Arc::clone(&clock));
    let token = challenge_token(
        &harness
            .gateway
            .execute(&OperationRequest::new("DELETE FROM t WHERE TRUE", "proj"))
            .await,
    );

    clock.advance_secs(61);
    let confirmed =
        OperationRequest::new("DELETE FROM t WHERE TRUE", "proj").with_token(Some(token));
    assert_eq!(
        harness.gateway.execute(&confirmed).await.rejection(),
        Some(&Rejection::InvalidToken)
    );

    // The expired record was deleted on lookup.
    assert_eq!(
        harness.gateway.execute(&confirmed).await.rejection(),
        Some(&Rejection::InvalidToken)
    );
    assert_eq!(harness.runner.execution_count(), 0);
}

#[tokio::test]
async fn test_token_within_window_is_accepted() {
    let clock = Arc::new(ManualClock::new());
    let harness = Harness::token_echo(ScriptedRunner::new(), Arc::clone(&clock));
    let token = challenge_token(
        &harness
            .gateway
            .execute(&OperationRequest::new("ALTER TABLE t ADD COLUMN c INT64", "proj"))
            .await,
    );

    clock.advance_secs(59);
    let confirmed = OperationRequest::new("ALTER TABLE t ADD COLUMN c INT64", "proj")
        .with_token(Some(token));
    assert!(harness.gateway.execute(&confirmed).await.is_executed());
}

#[tokio::test]
async fn test_failed_dry_run_issues_no_token() {
    let runner =
        ScriptedRunner::new().with_dry_run(CommandOutput::failed("Syntax error at [1:6]", 1));
    let harness = Harness::token_echo(runner, Arc::new(ManualClock::new()));

    let outcome = harness
        .gateway
        .execute(&OperationRequest::new("DROP TABLEE foo", "proj"))
        .await;
    assert_eq!(
        outcome.to_string(),
        "Query validation failed: Syntax error at [1:6]"
    );
    assert!(outcome.challenge_token().is_none());
}

#[tokio::test]
async fn test_blank_token_counts_as_absent() {
    let harness = Harness::token_echo(ScriptedRunner::new(), Arc::new(ManualClock::new()));
    let outcome = harness
        .gateway
        .execute(&OperationRequest::new("DROP TABLE foo", "proj").with_token(Some(String::new())))
        .await;
    assert!(outcome.challenge_token().is_some());
}

#[tokio::test]
async fn test_tool_surface_round_trip() {
    let harness = Harness::token_echo(
        ScriptedRunner::new().with_query(CommandOutput::ok("[]")),
        Arc::new(ManualClock::new()),
    );
    let tools = harness.tools();

    let challenge = tools.execute_query("DROP TABLE foo", "proj", None).await;
    let token = challenge
        .rsplit("confirmation_token: ")
        .next()
        .unwrap()
        .to_owned();

    let result = tools
        .execute_query("DROP TABLE foo", "proj", Some(&token))
        .await;
    assert_eq!(result, "[]");
}

#[tokio::test]
async fn test_cancelled_confirmation_does_not_execute() {
    let harness = Harness::token_echo(ScriptedRunner::new(), Arc::new(ManualClock::new()));
    let token = challenge_token(
        &harness
            .gateway
            .execute(&OperationRequest::new("DROP TABLE foo", "proj"))
            .await,
    );
    let confirmed = OperationRequest::new("DROP TABLE foo", "proj").with_token(Some(token));

    let cancel = CancellationToken::new();
    cancel.cancel();
    let outcome = harness.gateway.execute_with_cancel(&confirmed, &cancel).await;
    assert_eq!(outcome.rejection(), Some(&Rejection::Cancelled));
    assert_eq!(harness.runner.execution_count(), 0);

    // The token was not spent by the cancelled attempt.
    assert!(harness.gateway.execute(&confirmed).await.is_executed());
    assert_eq!(harness.runner.execution_count(), 1);
}

#[tokio::test]
async fn test_cancelled_safe_query_does_not_execute() {
    let harness = Harness::token_echo(ScriptedRunner::new(), Arc::new(ManualClock::new()));
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = harness
        .gateway
        .execute_with_cancel(&OperationRequest::new("SELECT 1", "proj"), &cancel)
        .await;
    assert_eq!(outcome.rejection(), Some(&Rejection::Cancelled));
    assert_eq!(harness.runner.execution_count(), 0);
}

/// Fires `cancel` while the dry run is in flight.
struct CancelDuringDryRun {
    inner: ScriptedRunner,
    cancel: CancellationToken,
}

#[async_trait]
impl CommandRunner for CancelDuringDryRun {
    async fn run(&self, args: &[String]) -> CommandOutput {
        if CallKind::of(args) == CallKind::DryRun {
            self.cancel.cancel();
        }
        self.inner.run(args).await
    }
}

#[tokio::test]
async fn test_cancel_during_dry_run_does_not_execute() {
    let runner = ScriptedRunner::new();
    let cancel = CancellationToken::new();
    let store = Arc::new(ConfirmationStore::with_clock(
        Arc::new(ManualClock::new()),
        DEFAULT_TOKEN_TTL_SECS,
    ));
    let token = store.issue("DROP TABLE foo", "proj");

    let client = BqClient::new(
        Arc::new(CancelDuringDryRun {
            inner: runner.clone(),
            cancel: cancel.clone(),
        }),
        EngineConfig::default(),
    );
    let gateway = Gateway::new(
        Classifier::with_policy(MatchPolicy::WordBoundary).unwrap(),
        client,
        Arc::new(TokenEchoChannel::new(Arc::clone(&store))),
    );

    let outcome = gateway
        .execute_with_cancel(
            &OperationRequest::new("DROP TABLE foo", "proj").with_token(Some(token)),
            &cancel,
        )
        .await;
    assert_eq!(outcome.rejection(), Some(&Rejection::Cancelled));
    assert_eq!(runner.calls_of(CallKind::DryRun).len(), 1);
    assert_eq!(runner.execution_count(), 0);
    assert_eq!(store.len(), 1);
}

#[tokio::test]
async fn test_token_from_other_project_is_invalid() {
    let harness = Harness::token_echo(ScriptedRunner::new(), Arc::new(ManualClock::new()));
    let token = challenge_token(
        &harness
            .gateway
            .execute(&OperationRequest::new("DROP TABLE foo", "proj-a"))
            .await,
    );

    let elsewhere =
        OperationRequest::new("DROP TABLE foo", "proj-b").with_token(Some(token.clone()));
    assert_eq!(
        harness.gateway.execute(&elsewhere).await.rejection(),
        Some(&Rejection::InvalidToken)
    );
    assert_eq!(harness.runner.execution_count(), 0);

    let original = OperationRequest::new("DROP TABLE foo", "proj-a").with_token(Some(token));
    assert!(harness.gateway.execute(&original).await.is_executed());
    assert_eq!(
        harness.runner.calls_of(CallKind::Execute)[0][3],
        "--project_id=proj-a"
    );
}
