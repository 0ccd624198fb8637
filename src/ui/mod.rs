pub mod terminal;

use crate::app::StreamState;
use crate::error::SkySettleError;
use crate::types::{FlightStats, ResponseView};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Success,
    Error,
}

/// A one-off message about the outcome of an action
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub kind: NotificationKind,
    pub title: String,
    pub description: String,
}

impl Notification {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Success,
            title: "Success".to_string(),
            description: description.into(),
        }
    }

    pub fn error(description: impl Into<String>) -> Self {
        Self {
            kind: NotificationKind::Error,
            title: "Error".to_string(),
            description: description.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum UIError {
    #[error("IO error: {0}")]
    IOError(#[from] std::io::Error),
}

impl From<UIError> for SkySettleError {
    fn from(err: UIError) -> Self {
        match err {
            UIError::IOError(err) => SkySettleError::Io(err),
        }
    }
}

pub trait Renderer: Send {
    /// Show the latest state of a streamed response
    fn render_stream(&mut self, view: ResponseView, state: &StreamState) -> Result<(), UIError>;

    /// Show flight history statistics
    fn render_stats(&mut self, stats: &FlightStats) -> Result<(), UIError>;

    fn notify(&mut self, notification: &Notification) -> Result<(), UIError>;

    /// Show a plain assistant message
    fn display(&mut self, message: &str) -> Result<(), UIError>;
}
