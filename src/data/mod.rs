//! View models and the pure transformations that build them.
//!
//! Everything in this module is synchronous and free of I/O except for
//! [`connection`], which publishes state through a `watch` channel.
//!
//! ## Submodules
//!
//! - [`window`]: Time window selection and its query parameters
//! - [`feed`]: Bounded newest-first feed of recent readings
//! - [`series`]: Flat time-series rows reshaped into aligned chart datasets
//! - [`heat`]: Map markers and heat samples
//! - [`connection`]: Connected/disconnected indicator derived from outcomes
//! - [`export`]: Absolute bounds for the CSV export
//! - [`duration`]: Parsing and formatting of duration strings (e.g., "5s", "500ms")
//!
//! ## Data Flow
//!
//! ```text
//! TimeSeriesPoint[] ──▶ series::aggregate() ──▶ ChartData
//! NodeLocation[]    ──▶ heat::build()       ──▶ HeatSample[]
//! Reading[]         ──▶ LiveFeed            ──▶ newest-first feed (≤ 10)
//! ```

pub mod connection;
pub mod duration;
pub mod export;
pub mod feed;
pub mod heat;
pub mod metric;
pub mod series;
pub mod window;

pub use connection::{ConnectionState, ConnectionTracker, Outcome};
pub use export::{export_filename, ExportRange};
pub use feed::{LiveFeed, MergePolicy, FEED_CAPACITY};
pub use heat::{HeatSample, HeatScale, Marker};
pub use metric::Metric;
pub use series::{ChartData, Dataset};
pub use window::{
    InvalidRangeError, Resolution, TimeSeriesQuery, TimeWindow, WindowQuery, WindowSelection,
};
