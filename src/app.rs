//! State container for one flight check and the tasks feeding it.
//!
//! Network work runs in spawned tasks that only ever send [`TaggedEvent`]s.
//! [`AppState::apply`] is the single place state changes, and every event
//! carries the generation of the check that produced it so results of a
//! superseded check are dropped.

use crate::client::{ByteStream, FlightService};
use crate::error::{Result, SkySettleError};
use crate::parser::parse_tagged_content;
use crate::session::{self, SessionStore};
use crate::stream::StreamConsumer;
use crate::types::{FlightQuery, FlightStats, ParsedContent, ResponseView};
use crate::ui::{Notification, Renderer, UIError};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub const ASSISTANT_GREETING: &str = "Hello! I'm your SkySettle assistant, ready to help with \
your flight delay compensation. Could you please provide your flight details including airline, \
flight number, and the date of the delay?";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StreamStatus {
    #[default]
    Idle,
    Streaming,
    Complete,
    Failed(String),
}

/// Accumulated text of one streamed response and what the parser makes of it
#[derive(Debug, Clone, Default)]
pub struct StreamState {
    pub accumulated: String,
    pub parsed: ParsedContent,
    pub status: StreamStatus,
}

impl StreamState {
    fn streaming() -> Self {
        Self {
            status: StreamStatus::Streaming,
            ..Self::default()
        }
    }

    pub fn is_streaming(&self) -> bool {
        self.status == StreamStatus::Streaming
    }
}

#[derive(Debug, Clone)]
pub enum AppEvent {
    StreamUpdated {
        view: ResponseView,
        accumulated: String,
    },
    StreamFinished {
        view: ResponseView,
    },
    StreamFailed {
        view: ResponseView,
        message: String,
    },
    StatsLoaded(FlightStats),
    StatsFailed(String),
}

#[derive(Debug, Clone)]
pub struct TaggedEvent {
    pub generation: u64,
    pub event: AppEvent,
}

/// What a renderer needs to refresh after an event was applied
#[derive(Debug, Clone, PartialEq)]
pub enum Update {
    Stream(ResponseView),
    Stats,
    Notify(Notification),
}

#[derive(Debug, Default)]
pub struct AppState {
    pub generation: u64,
    pub query: Option<FlightQuery>,
    pub compensation: StreamState,
    pub delay_reason: StreamState,
    pub stats: Option<FlightStats>,
    pub stats_loading: bool,
}

impl AppState {
    pub fn stream(&self, view: ResponseView) -> &StreamState {
        match view {
            ResponseView::Compensation => &self.compensation,
            ResponseView::DelayReason => &self.delay_reason,
        }
    }

    fn stream_mut(&mut self, view: ResponseView) -> &mut StreamState {
        match view {
            ResponseView::Compensation => &mut self.compensation,
            ResponseView::DelayReason => &mut self.delay_reason,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.compensation.is_streaming() || self.delay_reason.is_streaming() || self.stats_loading
    }

    /// Drop everything belonging to the current check and move to the next generation.
    fn reset(&mut self) {
        let generation = self.generation + 1;
        *self = Self {
            generation,
            ..Self::default()
        };
    }

    /// Apply one event. Events from an older generation change nothing.
    pub fn apply(&mut self, tagged: TaggedEvent) -> Vec<Update> {
        if tagged.generation != self.generation {
            debug!(
                "Ignoring event from superseded check {} (current {})",
                tagged.generation, self.generation
            );
            return Vec::new();
        }

        match tagged.event {
            AppEvent::StreamUpdated { view, accumulated } => {
                let stream = self.stream_mut(view);
                stream.parsed = parse_tagged_content(&accumulated);
                stream.accumulated = accumulated;
                vec![Update::Stream(view)]
            }
            AppEvent::StreamFinished { view } => {
                self.stream_mut(view).status = StreamStatus::Complete;
                vec![Update::Stream(view)]
            }
            AppEvent::StreamFailed { view, message } => {
                self.stream_mut(view).status = StreamStatus::Failed(message.clone());
                vec![
                    Update::Stream(view),
                    Update::Notify(Notification::error(message)),
                ]
            }
            AppEvent::StatsLoaded(stats) => {
                self.stats = Some(stats);
                self.stats_loading = false;
                vec![
                    Update::Stats,
                    Update::Notify(Notification::success("Flight history loaded")),
                ]
            }
            AppEvent::StatsFailed(message) => {
                self.stats_loading = false;
                vec![Update::Notify(Notification::error(format!(
                    "Failed to load flight history: {message}"
                )))]
            }
        }
    }
}

/// Reply to a free-form chat message.
pub fn reply_to_chat(message: &str) -> Result<&'static str> {
    if message.trim().is_empty() {
        return Err(SkySettleError::Validation(
            "Please enter a message".to_string(),
        ));
    }
    Ok(ASSISTANT_GREETING)
}

/// Drives checks against a [`FlightService`] and owns the resulting state.
pub struct FlightChecker {
    service: Arc<dyn FlightService>,
    store: Box<dyn SessionStore>,
    state: AppState,
    events_tx: UnboundedSender<TaggedEvent>,
    events_rx: UnboundedReceiver<TaggedEvent>,
    tasks: Vec<JoinHandle<()>>,
}

impl FlightChecker {
    pub fn new(service: Arc<dyn FlightService>, store: Box<dyn SessionStore>) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let query = match session::load_query(store.as_ref()) {
            Ok(query) => Some(query),
            Err(SkySettleError::MissingQuery) => None,
            Err(err) => {
                warn!("Ignoring stored flight: {err}");
                None
            }
        };
        let state = AppState {
            query,
            ..AppState::default()
        };

        Self {
            service,
            store,
            state,
            events_tx,
            events_rx,
            tasks: Vec::new(),
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Validate the form input and start streaming the compensation assessment.
    ///
    /// Any check still running is superseded.
    pub fn submit_check(&mut self, flight_number: &str, flight_date: Option<&str>) -> Result<()> {
        let query = FlightQuery::from_input(flight_number, flight_date)?;
        self.new_check()?;

        session::store_query(self.store.as_mut(), &query)?;
        self.state.query = Some(query.clone());
        self.state.compensation = StreamState::streaming();

        info!(
            "Checking compensation for {} on {}",
            query.flight_number,
            query.date_param()
        );
        let service = self.service.clone();
        self.spawn_stream(ResponseView::Compensation, async move {
            service.compensation(&query).await
        });
        Ok(())
    }

    /// Fetch history statistics for the stored flight.
    pub fn load_history(&mut self) -> Result<()> {
        let query = session::load_query(self.store.as_ref())?;
        if self.state.stats_loading {
            return Err(SkySettleError::Busy("Loading flight history"));
        }
        self.state.stats_loading = true;

        info!("Loading flight history for {}", query.flight_number);
        let service = self.service.clone();
        let events_tx = self.events_tx.clone();
        let generation = self.state.generation;
        let handle = tokio::spawn(async move {
            let event = match service.flight_stats(&query).await {
                Ok(stats) => AppEvent::StatsLoaded(stats),
                Err(err) => AppEvent::StatsFailed(err.to_string()),
            };
            let _ = events_tx.send(TaggedEvent { generation, event });
        });
        self.track(handle);
        Ok(())
    }

    /// Stream the delay/cancellation explanation for the stored flight.
    pub fn explain_delay(&mut self) -> Result<()> {
        let query = session::load_query(self.store.as_ref())?;
        if self.state.delay_reason.is_streaming() {
            return Err(SkySettleError::Busy("Loading delay information"));
        }
        self.state.delay_reason = StreamState::streaming();

        info!("Loading delay information for {}", query.flight_number);
        let service = self.service.clone();
        self.spawn_stream(ResponseView::DelayReason, async move {
            service.cancellation_reason(&query).await
        });
        Ok(())
    }

    /// Abandon the current check: stop its tasks and forget the stored flight.
    pub fn new_check(&mut self) -> Result<()> {
        for task in self.tasks.drain(..) {
            task.abort();
        }
        self.state.reset();
        session::clear_query(self.store.as_mut())
    }

    fn spawn_stream<F>(&mut self, view: ResponseView, open: F)
    where
        F: Future<Output = Result<ByteStream>> + Send + 'static,
    {
        let events_tx = self.events_tx.clone();
        let generation = self.state.generation;
        let handle = tokio::spawn(async move {
            let event = match open.await {
                Ok(stream) => pump_stream(stream, view, generation, &events_tx).await,
                Err(err) => AppEvent::StreamFailed {
                    view,
                    message: err.to_string(),
                },
            };
            let _ = events_tx.send(TaggedEvent { generation, event });
        });
        self.track(handle);
    }

    fn track(&mut self, handle: JoinHandle<()>) {
        self.tasks.retain(|task| !task.is_finished());
        self.tasks.push(handle);
    }

    /// Wait for one event and apply it. Returns None once nothing is in flight.
    pub async fn next_updates(&mut self) -> Option<Vec<Update>> {
        if !self.state.is_busy() {
            return None;
        }
        let tagged = self.events_rx.recv().await?;
        Some(self.state.apply(tagged))
    }

    /// Apply events and render them until every request of the current check
    /// has finished.
    pub async fn run_until_idle(
        &mut self,
        renderer: &mut dyn Renderer,
    ) -> std::result::Result<(), UIError> {
        while let Some(updates) = self.next_updates().await {
            for update in updates {
                match update {
                    Update::Stream(view) => renderer.render_stream(view, self.state.stream(view))?,
                    Update::Stats => {
                        if let Some(stats) = &self.state.stats {
                            renderer.render_stats(stats)?;
                        }
                    }
                    Update::Notify(notification) => renderer.notify(&notification)?,
                }
            }
        }
        Ok(())
    }
}

impl Drop for FlightChecker {
    fn drop(&mut self) {
        for task in &self.tasks {
            task.abort();
        }
    }
}

async fn pump_stream(
    stream: ByteStream,
    view: ResponseView,
    generation: u64,
    events_tx: &UnboundedSender<TaggedEvent>,
) -> AppEvent {
    let mut consumer = StreamConsumer::new();
    let result = consumer
        .consume(stream, |accumulated| {
            let _ = events_tx.send(TaggedEvent {
                generation,
                event: AppEvent::StreamUpdated {
                    view,
                    accumulated: accumulated.to_string(),
                },
            });
        })
        .await;

    match result {
        Ok(()) => {
            debug!(
                "{:?} stream complete: {} chunks, {} bytes",
                view,
                consumer.chunk_count(),
                consumer.accumulated().len()
            );
            AppEvent::StreamFinished { view }
        }
        Err(err) => AppEvent::StreamFailed {
            view,
            message: err.to_string(),
        },
    }
}
