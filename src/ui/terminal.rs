use super::{Notification, NotificationKind, Renderer, UIError};
use crate::app::{StreamState, StreamStatus};
use crate::parser::{reasoning_in_progress, CLOSE_TAG, OPEN_TAG};
use crate::types::{FlightStats, ResponseView};
use crossterm::style::{Color, Stylize};
use std::collections::HashMap;
use std::io::{self, Write};

const BAR_WIDTH: usize = 30;

/// What has already been written for one response
#[derive(Debug, Default)]
struct Printed {
    reasoning: String,
    answer: String,
    thinking_hint: bool,
}

enum Delta<'a> {
    Append(&'a str),
    Restart(&'a str),
}

/// Text needed to bring the screen from `shown` to `next`
fn delta<'a>(shown: &str, next: &'a str) -> Delta<'a> {
    match next.strip_prefix(shown) {
        Some(rest) => Delta::Append(rest),
        None => Delta::Restart(next),
    }
}

/// Hold back a trailing fragment that may turn out to be the start of `tag`
fn without_partial_tag<'a>(text: &'a str, tag: &str) -> &'a str {
    for len in (1..tag.len()).rev() {
        if text.ends_with(&tag[..len]) {
            return &text[..text.len() - len];
        }
    }
    text
}

fn format_minutes(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{minutes:.0}")
    } else {
        format!("{minutes:.1}")
    }
}

/// Renders streamed answers to an append-only terminal.
///
/// The parser output is recomputed on every chunk, so each render writes only
/// the part of reasoning and answer that is not on screen yet.
pub struct TerminalRenderer {
    out: Box<dyn Write + Send>,
    err: Box<dyn Write + Send>,
    show_reasoning: bool,
    styled: bool,
    printed: HashMap<ResponseView, Printed>,
}

impl TerminalRenderer {
    pub fn new(show_reasoning: bool, styled: bool) -> Self {
        Self {
            out: Box::new(io::stdout()),
            err: Box::new(io::stderr()),
            show_reasoning,
            styled,
            printed: HashMap::new(),
        }
    }

    #[cfg(test)]
    pub fn with_test_writers(
        out: Box<dyn Write + Send>,
        err: Box<dyn Write + Send>,
        show_reasoning: bool,
    ) -> Self {
        Self {
            out,
            err,
            show_reasoning,
            styled: false,
            printed: HashMap::new(),
        }
    }

    fn paint(&self, text: &str, color: Color) -> String {
        if self.styled {
            text.with(color).to_string()
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        if self.styled {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn thinking(&self, text: &str) -> String {
        if self.styled {
            text.dark_grey().italic().to_string()
        } else {
            text.to_string()
        }
    }

    fn write_reasoning(&mut self, printed: &mut Printed, reasoning: &str) -> io::Result<()> {
        if reasoning.is_empty() {
            return Ok(());
        }
        match delta(&printed.reasoning, reasoning) {
            Delta::Append(rest) => {
                let mut text = String::new();
                if printed.reasoning.is_empty() {
                    text.push_str(&self.thinking("Thinking: "));
                }
                text.push_str(&self.thinking(rest));
                write!(self.out, "{text}")?;
            }
            Delta::Restart(all) => {
                let text = format!("{}{}", self.thinking("Thinking: "), self.thinking(all));
                write!(self.out, "\n{text}")?;
            }
        }
        printed.reasoning = reasoning.to_string();
        Ok(())
    }

    fn write_answer(&mut self, printed: &mut Printed, answer: &str) -> io::Result<()> {
        if answer.is_empty() || answer == printed.answer {
            return Ok(());
        }
        match delta(&printed.answer, answer) {
            Delta::Append(rest) => {
                let after_reasoning = !printed.reasoning.is_empty() || printed.thinking_hint;
                if printed.answer.is_empty() && after_reasoning {
                    write!(self.out, "\n\n")?;
                }
                write!(self.out, "{rest}")?;
            }
            Delta::Restart(all) => write!(self.out, "\n{all}")?,
        }
        printed.answer = answer.to_string();
        Ok(())
    }
}

impl Renderer for TerminalRenderer {
    fn render_stream(&mut self, view: ResponseView, state: &StreamState) -> Result<(), UIError> {
        let mut printed = match self.printed.remove(&view) {
            Some(printed) => printed,
            None => {
                let title = self.bold(view.title());
                writeln!(self.out, "\n{title}")?;
                Printed::default()
            }
        };
        let streaming = state.status == StreamStatus::Streaming;

        if self.show_reasoning {
            let reasoning = if streaming {
                without_partial_tag(&state.parsed.reasoning, CLOSE_TAG).trim_end()
            } else {
                state.parsed.reasoning.as_str()
            };
            self.write_reasoning(&mut printed, reasoning)?;
        } else if !printed.thinking_hint && reasoning_in_progress(&state.accumulated) {
            let hint = self.thinking("Thinking...");
            write!(self.out, "{hint}")?;
            printed.thinking_hint = true;
        }

        let answer = if streaming {
            without_partial_tag(&state.parsed.final_answer, OPEN_TAG)
        } else {
            state.parsed.final_answer.as_str()
        };
        self.write_answer(&mut printed, answer)?;

        match &state.status {
            StreamStatus::Streaming => {
                self.printed.insert(view, printed);
            }
            StreamStatus::Complete => {
                if state.accumulated.is_empty() {
                    let empty = self.thinking("(empty response)");
                    write!(self.out, "{empty}")?;
                }
                writeln!(self.out)?;
            }
            StreamStatus::Failed(_) | StreamStatus::Idle => writeln!(self.out)?,
        }

        self.out.flush()?;
        Ok(())
    }

    fn render_stats(&mut self, stats: &FlightStats) -> Result<(), UIError> {
        let title = self.bold("Flight History");
        writeln!(self.out, "\n{title}")?;
        writeln!(self.out, "Total Flights:  {}", stats.total_flights)?;
        writeln!(
            self.out,
            "Average Delay:  {} min",
            format_minutes(stats.avg_delay_minutes)
        )?;

        let rows = [
            ("On Time", stats.on_time, Color::Green),
            ("Delayed", stats.delayed, Color::Yellow),
            ("Cancelled", stats.cancelled, Color::Red),
        ];
        for (label, count, color) in rows {
            let percentage = stats.percentage(count);
            let width = (percentage / 100.0 * BAR_WIDTH as f64).round() as usize;
            let bar = self.paint(&"█".repeat(width), color);
            writeln!(self.out, "{label:<10} {bar} {count} ({percentage:.1}%)")?;
        }

        self.out.flush()?;
        Ok(())
    }

    fn notify(&mut self, notification: &Notification) -> Result<(), UIError> {
        match notification.kind {
            NotificationKind::Success => {
                let line = self.paint(&format!("✓ {}", notification.description), Color::Green);
                writeln!(self.out, "{line}")?;
                self.out.flush()?;
            }
            NotificationKind::Error => {
                let line = self.paint(
                    &format!("✗ {}: {}", notification.title, notification.description),
                    Color::Red,
                );
                writeln!(self.err, "{line}")?;
                self.err.flush()?;
            }
        }
        Ok(())
    }

    fn display(&mut self, message: &str) -> Result<(), UIError> {
        writeln!(self.out, "{message}")?;
        self.out.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_without_partial_tag() {
        assert_eq!(without_partial_tag("Answer <thi", OPEN_TAG), "Answer ");
        assert_eq!(without_partial_tag("Answer <", OPEN_TAG), "Answer ");
        assert_eq!(
            without_partial_tag("Answer <think>", OPEN_TAG),
            "Answer <think>"
        );
        assert_eq!(without_partial_tag("a < b", OPEN_TAG), "a < b");
        assert_eq!(without_partial_tag("", OPEN_TAG), "");
        assert_eq!(without_partial_tag("reasoning </th", CLOSE_TAG), "reasoning ");
        assert_eq!(without_partial_tag("reasoning <th", CLOSE_TAG), "reasoning <th");
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(45.0), "45");
        assert_eq!(format_minutes(12.4), "12.4");
    }
}
