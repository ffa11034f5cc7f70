//! HTTP gateway to the sensor backend.
//!
//! One async operation per resource. Each operation reports its outcome to
//! the shared [`ConnectionTracker`] and normalizes failures to `None`.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use meshwatch::ApiGateway;
//!
//! # tokio_test::block_on(async {
//! let gateway = ApiGateway::builder()
//!     .base_url("http://localhost:5000")
//!     .timeout(Duration::from_secs(5))
//!     .build()?;
//!
//! if let Some(health) = gateway.health().await {
//!     println!("backend is {}", health.status);
//! }
//! # Ok::<_, meshwatch::TransportError>(())
//! # });
//! ```

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Local;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::{
    BackendHealth, CsvExport, Decision, NodeLocation, NodeSummary, Reading, TelemetrySource,
    TimeSeriesPoint, TransportError,
};
use crate::data::{export_filename, ConnectionTracker, ExportRange, Outcome, TimeSeriesQuery};

const DEFAULT_BASE_URL: &str = "http://localhost:5000";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Gateway to the backend's `/api/*` endpoints.
#[derive(Debug, Clone)]
pub struct ApiGateway {
    client: Client,
    base_url: String,
    timeout: Duration,
    description: String,
    tracker: Arc<ConnectionTracker>,
}

impl ApiGateway {
    /// Create a new builder for configuring the gateway.
    pub fn builder() -> ApiGatewayBuilder {
        ApiGatewayBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn tracker(&self) -> &Arc<ConnectionTracker> {
        &self.tracker
    }

    /// The underlying HTTP client, shared with the push stream.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// URL of the server-sent event stream.
    pub fn stream_url(&self) -> String {
        self.url("/stream")
    }

    /// Reachability check against `/api/health`.
    pub async fn health(&self) -> Option<BackendHealth> {
        let request = self.client.get(self.url("/health"));
        self.get_json("health", request).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, resource: &str, request: RequestBuilder) -> Option<T> {
        let result = async {
            let response = request.timeout(self.timeout).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status(status.as_u16()));
            }
            let body = response.bytes().await?;
            serde_json::from_slice::<T>(&body).map_err(|e| TransportError::Parse(e.to_string()))
        }
        .await;
        self.settle(resource, result)
    }

    /// Fetch a JSON array, dropping rows that do not decode.
    ///
    /// The backend emits `null` for a missing timestamp; one such row must not
    /// discard the rest of the batch.
    async fn get_rows<T: DeserializeOwned>(&self, resource: &str, request: RequestBuilder) -> Option<Vec<T>> {
        let rows: Vec<serde_json::Value> = self.get_json(resource, request).await?;
        Some(decode_rows(resource, rows))
    }

    /// Report the outcome to the tracker and drop the error.
    fn settle<T>(&self, resource: &str, result: Result<T, TransportError>) -> Option<T> {
        match result {
            Ok(payload) => {
                debug!("Fetched {}", resource);
                self.tracker.observe(Outcome::FetchSucceeded);
                Some(payload)
            }
            Err(e) => {
                warn!("Failed to fetch {}: {}", resource, e);
                self.tracker.observe(Outcome::FetchFailed);
                None
            }
        }
    }
}

#[async_trait]
impl TelemetrySource for ApiGateway {
    async fn latest(&self, limit: usize) -> Option<Vec<Reading>> {
        let request = self
            .client
            .get(self.url("/latest"))
            .query(&[("limit", limit.to_string())]);
        self.get_rows("latest", request).await
    }

    async fn node_stats(&self) -> Option<Vec<NodeSummary>> {
        let request = self.client.get(self.url("/nodes"));
        self.get_rows("nodes", request).await
    }

    async fn decisions(&self) -> Option<Vec<Decision>> {
        let request = self.client.get(self.url("/decisions"));
        self.get_rows("decisions", request).await
    }

    async fn node_locations(&self) -> Option<Vec<NodeLocation>> {
        let request = self.client.get(self.url("/nodes/locations"));
        self.get_rows("locations", request).await
    }

    async fn time_series(&self, query: &TimeSeriesQuery) -> Option<Vec<TimeSeriesPoint>> {
        let request = self
            .client
            .get(self.url("/timeseries"))
            .query(&query.query_pairs());
        self.get_rows("timeseries", request).await
    }

    async fn export_csv(&self, range: Option<&ExportRange>) -> Option<CsvExport> {
        let mut request = self.client.get(self.url("/export/csv"));
        if let Some(range) = range {
            request = request.query(&range.query_pairs());
        }

        let result = async {
            let response = request.timeout(self.timeout).send().await?;
            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status(status.as_u16()));
            }
            let bytes = response.bytes().await?.to_vec();
            Ok(CsvExport {
                bytes,
                filename: export_filename(Local::now().date_naive()),
            })
        }
        .await;
        self.settle("export", result)
    }

    fn description(&self) -> &str {
        &self.description
    }
}

fn decode_rows<T: DeserializeOwned>(resource: &str, rows: Vec<serde_json::Value>) -> Vec<T> {
    let total = rows.len();
    let decoded: Vec<T> = rows
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect();
    if decoded.len() < total {
        warn!("Skipped {} malformed {} rows", total - decoded.len(), resource);
    }
    decoded
}

/// Builder for ApiGateway.
#[derive(Debug, Default)]
pub struct ApiGatewayBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    tracker: Option<Arc<ConnectionTracker>>,
}

impl ApiGatewayBuilder {
    /// Set the backend base URL (e.g., "http://localhost:5000").
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the per-request timeout (default: 10 seconds).
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Share a connection tracker with other components.
    pub fn tracker(mut self, tracker: Arc<ConnectionTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Build the gateway.
    ///
    /// The client itself has no global timeout; it is applied per request so
    /// the long-lived stream is not cut off.
    pub fn build(self) -> Result<ApiGateway, TransportError> {
        let client = Client::builder().build()?;
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(ApiGateway {
            client,
            description: format!("http: {}", base_url),
            base_url,
            timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
            tracker: self.tracker.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let gateway = ApiGateway::builder().build().unwrap();
        assert_eq!(gateway.base_url(), DEFAULT_BASE_URL);
        assert_eq!(gateway.description(), "http: http://localhost:5000");
    }

    #[test]
    fn test_decode_rows_skips_null_timestamps() {
        let rows = vec![
            serde_json::json!({"node_id": "!a1", "timestamp": "2024-01-01T10:00:00", "temperature": 21.0}),
            serde_json::json!({"node_id": "!b2", "timestamp": null, "temperature": 19.0}),
        ];
        let readings: Vec<Reading> = decode_rows("latest", rows);
        assert_eq!(readings.len(), 1);
        assert_eq!(readings[0].node_id, "!a1");
    }

    #[test]
    fn test_url_joins_api_prefix() {
        let gateway = ApiGateway::builder()
            .base_url("http://sensors.local:8080/")
            .build()
            .unwrap();
        assert_eq!(gateway.url("/nodes/locations"), "http://sensors.local:8080/api/nodes/locations");
        assert_eq!(gateway.stream_url(), "http://sensors.local:8080/api/stream");
    }
}
