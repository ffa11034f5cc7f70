//! Backend access: HTTP requests and the push stream.
//!
//! The [`TelemetrySource`] trait is the seam between the refresh engine and
//! the network. [`ApiGateway`] implements it over HTTP; tests substitute an
//! in-memory source.

mod error;
mod gateway;
mod models;
mod stream;

pub use error::TransportError;
pub use gateway::{ApiGateway, ApiGatewayBuilder};
pub(crate) use models::timestamp;
pub use models::{
    BackendHealth, CsvExport, Decision, DecisionAction, DecisionMetrics, NodeLocation,
    NodeSummary, Reading, TimeSeriesPoint,
};
pub use stream::{PushStream, SseDecoder, StreamEvent};

use std::fmt::Debug;

use async_trait::async_trait;

use crate::data::{ExportRange, TimeSeriesQuery};

/// Trait for fetching dashboard resources from a backend.
///
/// Every operation resolves to `None` on failure; the implementation is
/// responsible for logging the cause and reporting the outcome to its
/// connection tracker. An empty list is a valid answer, distinct from `None`.
///
/// # Example
///
/// ```no_run
/// use meshwatch::{ApiGateway, TelemetrySource};
///
/// # tokio_test::block_on(async {
/// let gateway = ApiGateway::builder().base_url("http://localhost:5000").build()?;
/// if let Some(readings) = gateway.latest(10).await {
///     println!("Got {} readings", readings.len());
/// }
/// # Ok::<_, meshwatch::TransportError>(())
/// # });
/// ```
#[async_trait]
pub trait TelemetrySource: Send + Sync + Debug {
    /// Most recent readings across all nodes, at most `limit`.
    async fn latest(&self, limit: usize) -> Option<Vec<Reading>>;

    /// Per-node aggregates.
    async fn node_stats(&self) -> Option<Vec<NodeSummary>>;

    /// Recent decisions.
    async fn decisions(&self) -> Option<Vec<Decision>>;

    /// Node positions with their latest averages.
    async fn node_locations(&self) -> Option<Vec<NodeLocation>>;

    /// Bucketed averages for the given window.
    async fn time_series(&self, query: &TimeSeriesQuery) -> Option<Vec<TimeSeriesPoint>>;

    /// CSV export; unbounded when `range` is `None`.
    async fn export_csv(&self, range: Option<&ExportRange>) -> Option<CsvExport>;

    /// Returns a human-readable description of the source.
    ///
    /// Used for display in the TUI status bar.
    fn description(&self) -> &str;
}
