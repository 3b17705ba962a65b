//! Terminal participant for interactive approval.
//!
//! Questions arrive through an [`elicitation_queue`] and are answered one at
//! a time with a `dialoguer` prompt. A question whose asker already gave up
//! is skipped without prompting.

use bqgate_approval::{
    ElicitationAction, ElicitationRequest, PendingElicitation, QueuedElicitation,
    elicitation_queue,
};
use dialoguer::{Select, theme::ColorfulTheme};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::theme::Theme;

const PROMPT_QUEUE_CAPACITY: usize = 8;

const OPTIONS: &[&str] = &[
    "Accept (run the operation)",
    "Decline (do not run it)",
    "Cancel",
];

/// Start the terminal prompt loop and return the participant that feeds it.
///
/// Must be called inside a Tokio runtime.
#[must_use]
pub(crate) fn spawn_terminal_prompt() -> QueuedElicitation {
    let (participant, rx) = elicitation_queue(PROMPT_QUEUE_CAPACITY);
    tokio::spawn(drain(rx));
    participant
}

async fn drain(mut rx: mpsc::Receiver<PendingElicitation>) {
    while let Some(pending) = rx.recv().await {
        if pending.is_abandoned() {
            debug!(request_id = %pending.request.request_id, "skipping abandoned approval prompt");
            continue;
        }

        let request = pending.request.clone();
        let action = match tokio::task::spawn_blocking(move || prompt(&request)).await {
            Ok(action) => action,
            Err(e) => {
                warn!(error = %e, "approval prompt task failed");
                ElicitationAction::Cancel
            },
        };

        if !pending.respond(action) {
            eprintln!(
                "{}",
                Theme::warning("The request was cancelled before your answer arrived.")
            );
        }
    }
}

fn prompt(request: &ElicitationRequest) -> ElicitationAction {
    eprintln!();
    eprintln!(
        "{}",
        Theme::approval_box("Approval Required", &request.message)
    );

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Run this operation?")
        .items(OPTIONS)
        .default(1)
        .interact_opt();

    match selection {
        Ok(choice) => action_for(choice),
        Err(e) => {
            warn!(error = %e, "approval prompt failed");
            ElicitationAction::Cancel
        },
    }
}

/// Map a menu choice to an answer. Dismissing the menu cancels.
fn action_for(choice: Option<usize>) -> ElicitationAction {
    match choice {
        Some(0) => ElicitationAction::Accept,
        Some(1) => ElicitationAction::Decline,
        _ => ElicitationAction::Cancel,
    }
}
