//! Gated query execution: one-shot and interactive shell.

use std::process::ExitCode;

use anyhow::{Context, Result};
use bqgate_gateway::{Gateway, GatewayOutcome, OperationRequest, Rejection};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::theme::Theme;

/// Exit status when the gateway issued a confirmation token.
const EXIT_CONFIRMATION_REQUIRED: u8 = 2;

/// Run one request and print its outcome.
pub(crate) async fn run_execute(
    gateway: &Gateway,
    query: &str,
    project: &str,
    token: Option<String>,
) -> Result<ExitCode> {
    let request = OperationRequest::new(query, project).with_token(token);
    let outcome = execute_interruptible(gateway, &request).await;
    print_outcome(&outcome);

    if outcome.challenge_token().is_some() {
        eprintln!();
        eprintln!(
            "{}",
            Theme::dimmed(
                "Confirmation tokens live only as long as this process. \
                 Use `bqgate shell` to confirm in the same session."
            )
        );
    }
    Ok(exit_code(&outcome))
}

/// Read queries from stdin, one per line, against a single gateway.
///
/// `confirm [token]` resubmits the last challenged query with its token.
pub(crate) async fn run_shell(gateway: &Gateway, project: &str) -> Result<ExitCode> {
    eprintln!("{}", Theme::header("bqgate shell"));
    eprintln!(
        "{}",
        Theme::dimmed("One query per line. `confirm` runs the last challenged query. Ctrl-D exits.")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut challenged: Option<(String, String)> = None;

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        let request = match parse_shell_line(&line) {
            ShellLine::Empty => continue,
            ShellLine::Exit => break,
            ShellLine::Confirm(explicit) => match challenged.take() {
                Some((query, issued)) => OperationRequest::new(query, project)
                    .with_token(Some(explicit.unwrap_or(issued))),
                None => {
                    eprintln!("{}", Theme::warning("Nothing to confirm."));
                    continue;
                },
            },
            ShellLine::Query(query) => OperationRequest::new(query, project),
        };

        let outcome = execute_interruptible(gateway, &request).await;
        print_outcome(&outcome);
        if let Some(token) = outcome.challenge_token() {
            challenged = Some((request.body.clone(), token.to_owned()));
            eprintln!("{}", Theme::dimmed("Type `confirm` to run it."));
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Run `request`, cancelling a pending approval on Ctrl-C.
async fn execute_interruptible(gateway: &Gateway, request: &OperationRequest) -> GatewayOutcome {
    let cancel = CancellationToken::new();
    let run = gateway.execute_with_cancel(request, &cancel);
    tokio::pin!(run);

    tokio::select! {
        outcome = &mut run => outcome,
        _ = tokio::signal::ctrl_c() => {
            debug!("interrupt received, cancelling pending approval");
            cancel.cancel();
            run.await
        },
    }
}

fn print_outcome(outcome: &GatewayOutcome) {
    let text = outcome.to_string();
    match outcome {
        GatewayOutcome::Executed(result) if result.output.success => println!("{text}"),
        GatewayOutcome::Rejected(Rejection::ConfirmationRequired { .. }) => {
            eprintln!("{}", Theme::warning(&text));
        },
        _ => eprintln!("{}", Theme::error(&text)),
    }
}

fn exit_code(outcome: &GatewayOutcome) -> ExitCode {
    match outcome {
        GatewayOutcome::Executed(result) if result.output.success => ExitCode::SUCCESS,
        GatewayOutcome::Rejected(Rejection::ConfirmationRequired { .. }) => {
            ExitCode::from(EXIT_CONFIRMATION_REQUIRED)
        },
        _ => ExitCode::FAILURE,
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ShellLine {
    Empty,
    Exit,
    Confirm(Option<String>),
    Query(String),
}

fn parse_shell_line(line: &str) -> ShellLine {
    let line = line.trim();
    if line.is_empty() {
        return ShellLine::Empty;
    }
    if matches!(line, "exit" | "quit") {
        return ShellLine::Exit;
    }
    match line.split_once(char::is_whitespace) {
        Some(("confirm", token)) => ShellLine::Confirm(Some(token.trim().to_owned())),
        _ if line == "confirm" => ShellLine::Confirm(None),
        _ => ShellLine::Query(line.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bqgate_engine::CommandOutput;
    use bqgate_gateway::ExecutionResult;

    #[test]
    fn test_shell_lines() {
        assert_eq!(parse_shell_line("   "), ShellLine::Empty);
        assert_eq!(parse_shell_line("quit"), ShellLine::Exit);
        assert_eq!(parse_shell_line("confirm"), ShellLine::Confirm(None));
        assert_eq!(
            parse_shell_line("confirm 0123abcd0123abcd"),
            ShellLine::Confirm(Some("0123abcd0123abcd".to_owned()))
        );
        assert_eq!(
            parse_shell_line("  DROP TABLE foo  "),
            ShellLine::Query("DROP TABLE foo".to_owned())
        );
        assert_eq!(
            parse_shell_line("confirmed_orders"),
            ShellLine::Query("confirmed_orders".to_owned())
        );
    }

    #[test]
    fn test_exit_codes() {
        let ok = GatewayOutcome::Executed(ExecutionResult {
            output: CommandOutput::ok("[]"),
            advisory: None,
        });
        let failed = GatewayOutcome::Executed(ExecutionResult {
            output: CommandOutput::failed("boom", 1),
            advisory: None,
        });
        let challenge = GatewayOutcome::Rejected(Rejection::ConfirmationRequired {
            token: "t".to_owned(),
            advisory: None,
        });

        assert_eq!(exit_code(&ok), ExitCode::SUCCESS);
        assert_eq!(exit_code(&failed), ExitCode::FAILURE);
        assert_eq!(
            exit_code(&challenge),
            ExitCode::from(EXIT_CONFIRMATION_REQUIRED)
        );
        assert_eq!(
            exit_code(&GatewayOutcome::Rejected(Rejection::Declined)),
            ExitCode::FAILURE
        );
    }
}
