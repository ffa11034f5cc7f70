//! # meshwatch
//!
//! A live terminal dashboard and library for environmental sensor mesh
//! networks.
//!
//! Sensor nodes report temperature, humidity, soil moisture, light and
//! battery voltage to a backend. This crate keeps a local view of that
//! backend in sync by polling its HTTP API on per-resource timers and
//! reacting to its push stream, then renders the result as a TUI.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Application                          │
//! │  ┌─────────┐    ┌───────────┐    ┌─────────┐    ┌──────────┐ │
//! │  │  app    │───▶│ dashboard │───▶│   ui    │───▶│ Terminal │ │
//! │  │ (input) │    │  (state)  │    │(render) │    │          │ │
//! │  └─────────┘    └─────┬─────┘    └─────────┘    └──────────┘ │
//! │                       │ Event queue                          │
//! │                 ┌─────┴─────┐                                │
//! │                 │  refresh  │◀── timers | push stream        │
//! │                 └─────┬─────┘                                │
//! │                       ▼                                      │
//! │                 ┌───────────┐                                │
//! │                 │  source   │◀── ApiGateway | PushStream     │
//! │                 └───────────┘                                │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`source`]**: Backend access through the [`TelemetrySource`] trait,
//!   the HTTP [`ApiGateway`] and the server-sent [`PushStream`]
//! - **[`refresh`]**: Refresh cadences, the [`Event`](refresh::Event) queue
//!   and the [`Scheduler`](refresh::Scheduler) that feeds it
//! - **[`dashboard`]**: The [`Dashboard`] state machine that turns events into
//!   view models
//! - **[`data`]**: Pure transforms: live feed merging, chart aggregation,
//!   heat samples, window resolution, export ranges, connection state
//! - **[`config`]**: Layered [`Settings`]
//! - **[`app`]**, **[`events`]**, **[`ui`]**: The interactive terminal front end
//!
//! ## Usage
//!
//! ### As a CLI tool
//!
//! ```bash
//! # Watch a local backend
//! meshwatch --base-url http://localhost:5000
//!
//! # Log updates without a TUI
//! meshwatch --headless
//!
//! # Save the last 48 hours as CSV and exit
//! meshwatch --window 48 --export readings.csv
//! ```
//!
//! ### As a library
//!
//! ```no_run
//! use std::sync::Arc;
//! use meshwatch::{ApiGateway, ConnectionTracker, Dashboard, DashboardOptions};
//! use tokio::sync::mpsc;
//!
//! # tokio_test::block_on(async {
//! let tracker = Arc::new(ConnectionTracker::new());
//! let gateway = ApiGateway::builder()
//!     .base_url("http://localhost:5000")
//!     .tracker(tracker.clone())
//!     .build()?;
//!
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let mut dashboard = Dashboard::new(Arc::new(gateway), tracker, tx, DashboardOptions::default());
//! dashboard.refresh_all();
//!
//! while let Some(event) = rx.recv().await {
//!     if dashboard.handle(event) {
//!         println!("{} nodes", dashboard.nodes.len());
//!     }
//! }
//! # Ok::<_, meshwatch::TransportError>(())
//! # });
//! ```

pub mod app;
pub mod config;
pub mod dashboard;
pub mod data;
pub mod events;
pub mod refresh;
pub mod source;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use config::Settings;
pub use dashboard::{Dashboard, DashboardOptions};
pub use data::{
    ChartData, ConnectionState, ConnectionTracker, ExportRange, HeatScale, InvalidRangeError,
    LiveFeed, MergePolicy, Metric, TimeWindow, WindowSelection,
};
pub use source::{
    ApiGateway, Decision, NodeLocation, NodeSummary, PushStream, Reading, StreamEvent,
    TelemetrySource, TimeSeriesPoint, TransportError,
};
