use clap::{Parser, Subcommand};

#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
    /// Check compensation eligibility for a flight
    Check {
        /// Flight number, e.g. BA1234
        #[arg(short = 'f', long)]
        flight_number: String,

        /// Flight date as YYYY-MM-DD
        #[arg(short = 'd', long)]
        date: Option<String>,
    },

    /// Show past flight history for the last checked flight
    History,

    /// Explain the delay or cancellation of the last checked flight
    Reason,

    /// Forget the last checked flight and start over
    New,

    /// Start an interactive session (default)
    Chat,
}

/// Define the application arguments
#[derive(Parser, Debug)]
#[command(version, about = "SkySettle - flight delay compensation assistant", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Enable verbose logging (use multiple times for more verbosity)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Base URL of the compensation service
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Hide the model's reasoning and only show the final answer
    #[arg(long, global = true)]
    pub hide_reasoning: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub plain: bool,
}

impl Args {
    pub fn parse() -> Self {
        <Args as Parser>::parse()
    }
}
