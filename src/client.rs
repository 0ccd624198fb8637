use crate::config::Settings;
use crate::error::{Result, SkySettleError};
use crate::types::{FlightQuery, FlightStats};
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;
use futures::StreamExt;
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, warn};

pub const COMPENSATION_ENDPOINT: &str = "compensation";
pub const FLIGHT_STATS_ENDPOINT: &str = "flight-stats";
pub const CANCELLATION_REASON_ENDPOINT: &str = "cancellation-reason";

/// Response body delivered segment by segment
pub type ByteStream = BoxStream<'static, Result<Bytes>>;

/// The remote compensation service
#[async_trait]
pub trait FlightService: Send + Sync {
    /// Streamed eligibility assessment for a flight
    async fn compensation(&self, query: &FlightQuery) -> Result<ByteStream>;

    /// Aggregate on-time/delay/cancellation figures for a flight
    async fn flight_stats(&self, query: &FlightQuery) -> Result<FlightStats>;

    /// Streamed explanation of why a flight was delayed or cancelled
    async fn cancellation_reason(&self, query: &FlightQuery) -> Result<ByteStream>;
}

/// [`FlightService`] over HTTP
pub struct HttpFlightService {
    client: Client,
    base_url: String,
}

impl HttpFlightService {
    pub fn new(base_url: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| SkySettleError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_settings(settings: &Settings) -> Result<Self> {
        Self::new(&settings.base_url, settings.request_timeout())
    }

    fn get_url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint)
    }

    async fn get(&self, endpoint: &str, query: &FlightQuery) -> Result<Response> {
        let url = self.get_url(endpoint);
        debug!(
            "GET {url} flight_number={} date={}",
            query.flight_number,
            query.date_param()
        );

        let response = self
            .client
            .get(&url)
            .query(&query.query_pairs())
            .send()
            .await?;

        check_response_error(response).await
    }
}

/// Turn a non-2xx response into [`SkySettleError::Status`].
async fn check_response_error(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    warn!("Request failed with status {status}: {body}");
    Err(SkySettleError::Status { status, body })
}

fn into_byte_stream(response: Response) -> ByteStream {
    response
        .bytes_stream()
        .map(|chunk| chunk.map_err(SkySettleError::from))
        .boxed()
}

#[async_trait]
impl FlightService for HttpFlightService {
    async fn compensation(&self, query: &FlightQuery) -> Result<ByteStream> {
        let response = self.get(COMPENSATION_ENDPOINT, query).await?;
        Ok(into_byte_stream(response))
    }

    async fn flight_stats(&self, query: &FlightQuery) -> Result<FlightStats> {
        let response = self.get(FLIGHT_STATS_ENDPOINT, query).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| SkySettleError::Decode(e.to_string()))
    }

    async fn cancellation_reason(&self, query: &FlightQuery) -> Result<ByteStream> {
        let response = self.get(CANCELLATION_REASON_ENDPOINT, query).await?;
        Ok(into_byte_stream(response))
    }
}
