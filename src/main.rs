mod app;
mod cli;
mod client;
mod config;
mod error;
mod interactive;
mod logging;
mod parser;
mod session;
mod stream;
mod types;
mod ui;

#[cfg(test)]
mod tests;

use crate::app::FlightChecker;
use crate::cli::{Args, Command};
use crate::client::HttpFlightService;
use crate::config::Settings;
use crate::interactive::SessionCommand;
use crate::session::{FileSessionStore, MemorySessionStore, SessionStore};
use crate::ui::terminal::TerminalRenderer;
use anyhow::{Context, Result};
use std::process::ExitCode;
use std::sync::Arc;
use tracing::info;

async fn run_one_shot(args: Args, command: SessionCommand) -> Result<bool> {
    logging::setup_logging(args.verbose);

    let settings = Settings::load(args.base_url.as_deref()).context("Failed to load settings")?;
    let service = HttpFlightService::from_settings(&settings)
        .context("Failed to create compensation service client")?;
    let store = FileSessionStore::new(settings.session_file());

    let mut checker = FlightChecker::new(Arc::new(service), Box::new(store));
    let mut renderer = TerminalRenderer::new(!args.hide_reasoning, !args.plain);

    interactive::run_command(&mut checker, command, &mut renderer).await
}

async fn run_interactive(args: Args) -> Result<bool> {
    let log_file = logging::setup_logging_for_session(args.verbose);
    info!("Session log: {}", log_file.display());

    let settings = Settings::load(args.base_url.as_deref()).context("Failed to load settings")?;
    let service = HttpFlightService::from_settings(&settings)
        .context("Failed to create compensation service client")?;

    // The interactive session keeps its flight in memory, seeded from the
    // last one-shot check.
    let mut store = MemorySessionStore::new();
    let file_store = FileSessionStore::new(settings.session_file());
    if let Ok(query) = session::load_query(&file_store) {
        session::store_query(&mut store, &query)?;
    }
    let store: Box<dyn SessionStore> = Box::new(store);

    let mut checker = FlightChecker::new(Arc::new(service), store);
    let mut renderer = TerminalRenderer::new(!args.hide_reasoning, !args.plain);

    interactive::run_session(&mut checker, &mut renderer).await?;
    Ok(true)
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenv::dotenv().ok();
    let mut args = Args::parse();

    let result = match args.command.take() {
        None | Some(Command::Chat) => run_interactive(args).await,
        Some(Command::Check {
            flight_number,
            date,
        }) => {
            let command = SessionCommand::Check {
                flight_number,
                date,
            };
            run_one_shot(args, command).await
        }
        Some(Command::History) => run_one_shot(args, SessionCommand::History).await,
        Some(Command::Reason) => run_one_shot(args, SessionCommand::Reason).await,
        Some(Command::New) => run_one_shot(args, SessionCommand::New).await,
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}
