use crate::app::StreamState;
use crate::client::{ByteStream, FlightService};
use crate::error::{Result, SkySettleError};
use crate::types::{FlightQuery, FlightStats, ResponseView};
use crate::ui::{Notification, Renderer, UIError};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

type UiResult = std::result::Result<(), UIError>;

/// How the mock answers a streamed request for one flight number
#[derive(Clone, Debug)]
pub enum MockResponse {
    Chunks(Vec<&'static str>),
    ChunksThenError(Vec<&'static str>, &'static str),
    /// Never yields anything, like a server that stalls
    Pending,
}

impl MockResponse {
    fn into_stream(self) -> ByteStream {
        match self {
            MockResponse::Chunks(chunks) => stream::iter(
                chunks
                    .into_iter()
                    .map(|chunk| Ok::<_, SkySettleError>(Bytes::from(chunk))),
            )
            .boxed(),
            MockResponse::ChunksThenError(chunks, message) => stream::iter(
                chunks
                    .into_iter()
                    .map(|chunk| Ok::<_, SkySettleError>(Bytes::from(chunk)))
                    .chain(std::iter::once(Err(SkySettleError::Network(
                        message.to_string(),
                    )))),
            )
            .boxed(),
            MockResponse::Pending => stream::pending::<Result<Bytes>>().boxed(),
        }
    }
}

// Records every request; answers by flight number
#[derive(Clone, Default)]
pub struct MockFlightService {
    calls: Arc<Mutex<Vec<String>>>,
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    stats: Option<FlightStats>,
}

impl MockFlightService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, flight_number: &str, response: MockResponse) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(flight_number.to_string(), response);
        self
    }

    pub fn with_stats(mut self, stats: FlightStats) -> Self {
        self.stats = Some(stats);
        self
    }

    /// Requests made so far as "<endpoint> <flight number>"
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, endpoint: &str, query: &FlightQuery) {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{endpoint} {}", query.flight_number));
    }

    fn stream_for(&self, endpoint: &str, query: &FlightQuery) -> Result<ByteStream> {
        self.record(endpoint, query);
        let response = self
            .responses
            .lock()
            .unwrap()
            .get(&query.flight_number)
            .cloned()
            .unwrap_or(MockResponse::Pending);
        Ok(response.into_stream())
    }
}

#[async_trait]
impl FlightService for MockFlightService {
    async fn compensation(&self, query: &FlightQuery) -> Result<ByteStream> {
        self.stream_for("compensation", query)
    }

    async fn flight_stats(&self, query: &FlightQuery) -> Result<FlightStats> {
        self.record("flight-stats", query);
        self.stats
            .clone()
            .ok_or_else(|| SkySettleError::Decode("no stats configured".to_string()))
    }

    async fn cancellation_reason(&self, query: &FlightQuery) -> Result<ByteStream> {
        self.stream_for("cancellation-reason", query)
    }
}

/// Renderer that keeps everything it was asked to show
#[derive(Default)]
pub struct RecordingRenderer {
    pub streams: Vec<(ResponseView, StreamState)>,
    pub stats: Vec<FlightStats>,
    pub notifications: Vec<Notification>,
    pub messages: Vec<String>,
}

impl RecordingRenderer {
    pub fn snapshots(&self, view: ResponseView) -> Vec<&StreamState> {
        self.streams
            .iter()
            .filter(|(v, _)| *v == view)
            .map(|(_, state)| state)
            .collect()
    }
}

impl Renderer for RecordingRenderer {
    fn render_stream(&mut self, view: ResponseView, state: &StreamState) -> UiResult {
        self.streams.push((view, state.clone()));
        Ok(())
    }

    fn render_stats(&mut self, stats: &FlightStats) -> UiResult {
        self.stats.push(stats.clone());
        Ok(())
    }

    fn notify(&mut self, notification: &Notification) -> UiResult {
        self.notifications.push(notification.clone());
        Ok(())
    }

    fn display(&mut self, message: &str) -> UiResult {
        self.messages.push(message.to_string());
        Ok(())
    }
}
