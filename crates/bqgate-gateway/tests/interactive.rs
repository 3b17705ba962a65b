//! Human-in-the-loop approval through the gateway.

mod common;

use std::sync::Arc;

use bqgate_approval::{ElicitationAction, ElicitationChannel, ParticipantError, elicitation_queue};
use bqgate_engine::CommandOutput;
use bqgate_gateway::{OperationRequest, Rejection};
use bqgate_test::{ScriptedElicitation, ScriptedRunner, dry_run_json};
use common::Harness;
use tokio_util::sync::CancellationToken;

const DELETE_ALL: &str = "DELETE FROM users WHERE 1=1";

#[tokio::test]
async fn test_accept_executes() {
    let participant = ScriptedElicitation::new().with_action(ElicitationAction::Accept);
    let harness = Harness::elicitation(ScriptedRunner::new(), participant);

    let outcome = harness
        .gateway
        .execute(&OperationRequest::new(DELETE_ALL, "proj"))
        .await;
    assert!(outcome.is_executed());
    assert_eq!(harness.runner.execution_count(), 1);
}

#[tokio::test]
async fn test_decline_is_distinct_from_cancel() {
    let participant = ScriptedElicitation::new()
        .with_action(ElicitationAction::Decline)
        .with_action(ElicitationAction::Cancel);
    let runner = ScriptedRunner::new().with_dry_run(CommandOutput::ok(dry_run_json(4096, 0)));
    let harness = Harness::elicitation(runner, participant.clone());

    let declined = harness
        .gateway
        .execute(&OperationRequest::new(DELETE_ALL, "proj"))
        .await;
    assert_eq!(declined.rejection(), Some(&Rejection::Declined));

    let cancelled = harness
        .gateway
        .execute(&OperationRequest::new(DELETE_ALL, "proj"))
        .await;
    assert_eq!(cancelled.rejection(), Some(&Rejection::Cancelled));

    assert_ne!(declined.to_string(), cancelled.to_string());
    assert!(declined.to_string().contains("declined"));
    assert_eq!(harness.runner.execution_count(), 0);

    let asked = participant.requests();
    assert_eq!(asked.len(), 2);
    assert_eq!(asked[0].matched_keywords, vec!["DELETE"]);
    assert!(asked[0].message.contains("Matched keywords: DELETE"));
    assert!(asked[0].message.contains("Estimated bytes processed: 4,096"));
    assert_eq!(asked[0].context, "proj");
}

#[tokio::test]
async fn test_participant_error_is_reported_as_cancellation_with_cause() {
    let participant = ScriptedElicitation::new().with_error(ParticipantError::Transport(
        "client disconnected".to_owned(),
    ));
    let harness = Harness::elicitation(ScriptedRunner::new(), participant);

    let outcome = harness
        .gateway
        .execute(&OperationRequest::new("DROP TABLE foo", "proj"))
        .await;
    assert!(matches!(
        outcome.rejection(),
        Some(Rejection::ApprovalFailed { .. })
    ));
    let text = outcome.to_string();
    assert!(text.contains("cancelled"));
    assert!(text.contains("client disconnected"));
    assert_eq!(harness.runner.execution_count(), 0);
}

#[tokio::test]
async fn test_safe_query_never_asks() {
    let participant = ScriptedElicitation::new();
    let harness = Harness::elicitation(ScriptedRunner::new(), participant.clone());

    let outcome = harness
        .gateway
        .execute(&OperationRequest::new("SELECT * FROM created_at_log", "proj"))
        .await;
    assert!(outcome.is_executed());
    assert!(participant.requests().is_empty());
}

#[tokio::test]
async fn test_caller_cancel_releases_pending_approval() {
    let (participant, mut rx) = elicitation_queue(1);
    let runner = ScriptedRunner::new();
    let harness = Harness::new(
        runner,
        Arc::new(ElicitationChannel::new(Arc::new(participant))),
    );
    let cancel = CancellationToken::new();

    let pending_call = {
        let gateway = harness.gateway.clone();
        let cancel = cancel.clone();
        tokio::spawn(async move {
            gateway
                .execute_with_cancel(&OperationRequest::new(DELETE_ALL, "proj"), &cancel)
                .await
        })
    };

    let pending = rx.recv().await.unwrap();
    cancel.cancel();

    let outcome = pending_call.await.unwrap();
    assert_eq!(outcome.rejection(), Some(&Rejection::Cancelled));
    assert!(pending.is_abandoned());
    assert!(!pending.respond(ElicitationAction::Accept));
    assert_eq!(harness.runner.execution_count(), 0);
}

#[tokio::test]
async fn test_other_requests_proceed_while_one_waits() {
    let (participant, mut rx) = elicitation_queue(1);
    let harness = Harness::new(
        ScriptedRunner::new(),
        Arc::new(ElicitationChannel::new(Arc::new(participant))),
    );

    let waiting = {
        let gateway = harness.gateway.clone();
        tokio::spawn(async move {
            gateway
                .execute(&OperationRequest::new(DELETE_ALL, "proj"))
                .await
        })
    };
    let pending = rx.recv().await.unwrap();

    let safe = harness
        .gateway
        .execute(&OperationRequest::new("SELECT 1", "proj"))
        .await;
    assert!(safe.is_executed());

    assert!(pending.respond(ElicitationAction::Accept));
    assert!(waiting.await.unwrap().is_executed());
    assert_eq!(harness.runner.execution_count(), 2);
}
