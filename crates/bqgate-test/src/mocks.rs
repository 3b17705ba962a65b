//! Mock implementations for testing.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::Notify;

use bqgate_approval::{
    Clock, ElicitationAction, ElicitationParticipant, ElicitationRequest, ElicitationResponse,
    ParticipantError, SamplingParticipant, SamplingRequest, SamplingResponse,
};
use bqgate_engine::{CommandOutput, CommandRunner};

use crate::fixtures::{dry_run_json, query_rows_json};

fn take<T>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    queue.lock().ok().and_then(|mut q| q.pop_front())
}

fn push<T>(queue: &Mutex<VecDeque<T>>, item: T) {
    if let Ok(mut guard) = queue.lock() {
        guard.push_back(item);
    }
}

// ---------------------------------------------------------------------------
// Engine
// ---------------------------------------------------------------------------

/// Which `bq` subcommand an argument vector invokes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    /// `bq query --dry_run ...`
    DryRun,
    /// `bq query ...` without `--dry_run`.
    Execute,
    /// `bq ... show ...`
    Show,
}

impl CallKind {
    /// Classify an argument vector.
    #[must_use]
    pub fn of(args: &[String]) -> Self {
        if args.iter().any(|a| a == "--dry_run") {
            Self::DryRun
        } else if args.get(1).is_some_and(|a| a == "query") {
            Self::Execute
        } else {
            Self::Show
        }
    }
}

/// Command runner that records every call and replies from per-kind queues.
///
/// When a queue is empty the reply is a success: a zero-byte dry run, a small
/// row set for executions, and `{}` for lookups.
#[derive(Debug, Clone, Default)]
pub struct ScriptedRunner {
    calls: Arc<Mutex<Vec<Vec<String>>>>,
    dry_runs: Arc<Mutex<VecDeque<CommandOutput>>>,
    executions: Arc<Mutex<VecDeque<CommandOutput>>>,
    lookups: Arc<Mutex<VecDeque<CommandOutput>>>,
}

impl ScriptedRunner {
    /// Create a runner with empty queues.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a dry-run reply.
    #[must_use]
    pub fn with_dry_run(self, output: CommandOutput) -> Self {
        push(&self.dry_runs, output);
        self
    }

    /// Queue an execution reply.
    #[must_use]
    pub fn with_query(self, output: CommandOutput) -> Self {
        push(&self.executions, output);
        self
    }

    /// Queue a `show` reply.
    #[must_use]
    pub fn with_show(self, output: CommandOutput) -> Self {
        push(&self.lookups, output);
        self
    }

    /// Every argument vector received, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// Calls of one kind.
    #[must_use]
    pub fn calls_of(&self, kind: CallKind) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|args| CallKind::of(args) == kind)
            .collect()
    }

    /// Number of real (non-dry-run) executions.
    #[must_use]
    pub fn execution_count(&self) -> usize {
        self.calls_of(CallKind::Execute).len()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, args: &[String]) -> CommandOutput {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(args.to_vec());
        }
        match CallKind::of(args) {
            CallKind::DryRun => {
                take(&self.dry_runs).unwrap_or_else(|| CommandOutput::ok(dry_run_json(0, 0)))
            },
            CallKind::Execute => {
                take(&self.executions).unwrap_or_else(|| CommandOutput::ok(query_rows_json()))
            },
            CallKind::Show => take(&self.lookups).unwrap_or_else(|| CommandOutput::ok("{}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// A clock stopped at 2023-11-14T22:13:20Z.
    #[must_use]
    pub fn new() -> Self {
        Self {
            now: Mutex::new(DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default()),
        }
    }

    /// Move forward by `secs` seconds.
    pub fn advance_secs(&self, secs: i64) {
        if let Ok(mut now) = self.now.lock()
            && let Some(next) = now.checked_add_signed(TimeDelta::seconds(secs))
        {
            *now = next;
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        self.now
            .lock()
            .map(|now| *now)
            .unwrap_or_else(|e| *e.into_inner())
    }
}

// ---------------------------------------------------------------------------
// Participants
// ---------------------------------------------------------------------------

/// Elicitation participant that answers from a queue and records questions.
///
/// With an empty queue it fails as unavailable.
#[derive(Debug, Clone, Default)]
pub struct ScriptedElicitation {
    answers: Arc<Mutex<VecDeque<Result<ElicitationAction, ParticipantError>>>>,
    requests: Arc<Mutex<Vec<ElicitationRequest>>>,
}

impl ScriptedElicitation {
    /// Create a participant with no answers queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an answer.
    #[must_use]
    pub fn with_action(self, action: ElicitationAction) -> Self {
        push(&self.answers, Ok(action));
        self
    }

    /// Queue a failure.
    #[must_use]
    pub fn with_error(self, error: ParticipantError) -> Self {
        push(&self.answers, Err(error));
        self
    }

    /// Questions asked so far.
    #[must_use]
    pub fn requests(&self) -> Vec<ElicitationRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ElicitationParticipant for ScriptedElicitation {
    async fn elicit(
        &self,
        request: ElicitationRequest,
    ) -> Result<ElicitationResponse, ParticipantError> {
        let request_id = request.request_id;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        let action = take(&self.answers).unwrap_or_else(|| {
            Err(ParticipantError::Unavailable(
                "no scripted elicitation answer".to_owned(),
            ))
        })?;
        Ok(ElicitationResponse { request_id, action })
    }
}

#[derive(Debug, Clone)]
enum SamplerReply {
    Text(String),
    Empty,
    Failure(String),
    Error(ParticipantError),
}

/// Sampling participant that answers from a queue and records requests.
///
/// With an empty queue it returns an empty completion.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSampler {
    replies: Arc<Mutex<VecDeque<SamplerReply>>>,
    requests: Arc<Mutex<Vec<SamplingRequest>>>,
}

impl ScriptedSampler {
    /// Create a sampler with no replies queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a text completion.
    #[must_use]
    pub fn with_text(self, text: impl Into<String>) -> Self {
        push(&self.replies, SamplerReply::Text(text.into()));
        self
    }

    /// Queue a successful response with no content.
    #[must_use]
    pub fn with_empty(self) -> Self {
        push(&self.replies, SamplerReply::Empty);
        self
    }

    /// Queue a response with `success = false`.
    #[must_use]
    pub fn with_failure(self, error: impl Into<String>) -> Self {
        push(&self.replies, SamplerReply::Failure(error.into()));
        self
    }

    /// Queue a transport error.
    #[must_use]
    pub fn with_error(self, error: ParticipantError) -> Self {
        push(&self.replies, SamplerReply::Error(error));
        self
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<SamplingRequest> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SamplingParticipant for ScriptedSampler {
    async fn sample(&self, request: SamplingRequest) -> Result<SamplingResponse, ParticipantError> {
        let request_id = request.request_id;
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }
        match take(&self.replies).unwrap_or(SamplerReply::Empty) {
            SamplerReply::Text(text) => Ok(SamplingResponse::text(request_id, text)),
            SamplerReply::Empty => Ok(SamplingResponse {
                content: None,
                ..SamplingResponse::text(request_id, String::new())
            }),
            SamplerReply::Failure(error) => Ok(SamplingResponse::failure(request_id, error)),
            SamplerReply::Error(error) => Err(error),
        }
    }
}

/// Sampling participant that never answers.
///
/// Records when a wait starts and whether the waiting future was dropped, so
/// tests can check that cancellation releases it.
#[derive(Debug, Clone, Default)]
pub struct PendingSampler {
    started: Arc<Notify>,
    calls: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
}

struct ReleaseFlag(Arc<AtomicBool>);

impl Drop for ReleaseFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

impl PendingSampler {
    /// Create a sampler that hangs forever.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve once a sample call is waiting.
    pub async fn wait_started(&self) {
        self.started.notified().await;
    }

    /// Number of sample calls made.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Whether a waiting call has been dropped.
    #[must_use]
    pub fn was_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SamplingParticipant for PendingSampler {
    async fn sample(&self, _request: SamplingRequest) -> Result<SamplingResponse, ParticipantError> {
        let _flag = ReleaseFlag(Arc::clone(&self.released));
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.started.notify_one();
        std::future::pending().await
    }
}
