use crate::app::{reply_to_chat, FlightChecker, StreamStatus};
use crate::error::SkySettleError;
use crate::types::ResponseView;
use crate::ui::{Notification, Renderer};
use anyhow::Result;
use rustyline::{error::ReadlineError, history::DefaultHistory, Config, Editor};
use tracing::debug;

const WELCOME: &str = "Welcome to SkySettle\n\
Your flight delay compensation assistant. Ask about your rights, check eligibility, \
and get help filing claims.\nType 'help' for the available commands.";

const HELP: &str = "Commands:\n  \
check <FLIGHT> <YYYY-MM-DD>  Check flight status and compensation eligibility\n  \
history                      Show past 7 days flight history\n  \
reason                       Delay information for the checked flight\n  \
new                          Start a new check\n  \
help                         Show this help\n  \
quit                         Leave SkySettle\n\
Quick actions: Check flight status, Delay information, File a claim, Passenger rights, FAQ";

/// One line of input in the interactive session
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    Check {
        flight_number: String,
        date: Option<String>,
    },
    History,
    Reason,
    New,
    Help,
    Quit,
    Chat(String),
}

pub fn parse_command(line: &str) -> SessionCommand {
    let trimmed = line.trim();
    let mut words = trimmed.split_whitespace();
    let keyword = words.next().unwrap_or_default().to_lowercase();

    match keyword.as_str() {
        "check" => {
            let flight_number = words.next().unwrap_or_default().to_string();
            let date = words.next().map(str::to_string);
            SessionCommand::Check {
                flight_number,
                date,
            }
        }
        "history" => SessionCommand::History,
        "reason" => SessionCommand::Reason,
        "new" => SessionCommand::New,
        "help" | "?" => SessionCommand::Help,
        "quit" | "exit" => SessionCommand::Quit,
        _ => match trimmed.to_lowercase().as_str() {
            "delay information" => SessionCommand::Reason,
            "check flight status" => SessionCommand::Help,
            _ => SessionCommand::Chat(line.to_string()),
        },
    }
}

/// Start the action for a command. Streaming results arrive through the
/// checker's event loop afterwards.
pub fn execute(
    checker: &mut FlightChecker,
    command: SessionCommand,
    renderer: &mut dyn Renderer,
) -> std::result::Result<(), SkySettleError> {
    debug!("Executing {:?}", command);
    match command {
        SessionCommand::Check {
            flight_number,
            date,
        } => checker.submit_check(&flight_number, date.as_deref()),
        SessionCommand::History => checker.load_history(),
        SessionCommand::Reason => checker.explain_delay(),
        SessionCommand::New => {
            checker.new_check()?;
            Ok(renderer.display("Started a new check.")?)
        }
        SessionCommand::Help => Ok(renderer.display(HELP)?),
        SessionCommand::Chat(message) => {
            let reply = reply_to_chat(&message)?;
            Ok(renderer.display(reply)?)
        }
        SessionCommand::Quit => Ok(()),
    }
}

/// Run a command to completion, surfacing any failure once. Returns whether
/// the command succeeded.
pub async fn run_command(
    checker: &mut FlightChecker,
    command: SessionCommand,
    renderer: &mut dyn Renderer,
) -> Result<bool> {
    let view = match command {
        SessionCommand::Check { .. } => Some(ResponseView::Compensation),
        SessionCommand::Reason => Some(ResponseView::DelayReason),
        _ => None,
    };
    let wants_stats = command == SessionCommand::History;

    if let Err(err) = execute(checker, command, renderer) {
        renderer.notify(&Notification::error(err.to_string()))?;
        return Ok(false);
    }
    checker.run_until_idle(renderer).await?;

    let state = checker.state();
    let stream_failed =
        view.is_some_and(|view| matches!(state.stream(view).status, StreamStatus::Failed(_)));
    let stats_missing = wants_stats && state.stats.is_none();
    Ok(!stream_failed && !stats_missing)
}

pub async fn run_session(checker: &mut FlightChecker, renderer: &mut dyn Renderer) -> Result<()> {
    let config = Config::builder()
        .edit_mode(rustyline::EditMode::Emacs)
        .build();
    let mut editor: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    renderer.display(WELCOME)?;
    if let Some(query) = &checker.state().query {
        renderer.display(&format!(
            "Last checked flight: {} on {}",
            query.flight_number,
            query.date_param()
        ))?;
    }

    loop {
        let line = match tokio::task::block_in_place(|| editor.readline("> ")) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        let _ = editor.add_history_entry(line.as_str());

        match parse_command(&line) {
            SessionCommand::Quit => break,
            command => {
                run_command(checker, command, renderer).await?;
            }
        }
    }

    Ok(())
}
