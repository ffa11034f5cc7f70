//! Dashboard state and the serial update loop.
//!
//! [`Dashboard::handle`] is the only place view models change. Fetches are
//! spawned as independent tasks that post their results back to the same
//! queue as [`Event::Loaded`], so completions are applied one at a time in
//! arrival order.
//!
//! ## Stale time-series responses
//!
//! Every change to the window selection or node filter bumps a generation
//! counter. Time-series requests carry the generation they were issued
//! under, and a response from an older generation is discarded on arrival.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::data::{
    heat, series, window, ChartData, ConnectionState, ConnectionTracker, ExportRange, HeatSample,
    HeatScale, InvalidRangeError, LiveFeed, Marker, MergePolicy, Metric, Resolution,
    TimeSeriesQuery, TimeWindow, WindowSelection,
};
use crate::refresh::{Event, Loaded, Resource, StreamRefresh};
use crate::source::{
    Decision, NodeLocation, NodeSummary, StreamEvent, TelemetrySource, TimeSeriesPoint,
};

/// Behavior knobs taken from configuration.
#[derive(Debug, Clone)]
pub struct DashboardOptions {
    pub latest_limit: usize,
    pub feed_policy: MergePolicy,
    pub stream_refresh: StreamRefresh,
    pub heat_scale: HeatScale,
    pub metric: Metric,
    pub window_hours: u32,
}

impl Default for DashboardOptions {
    fn default() -> Self {
        Self {
            latest_limit: 10,
            feed_policy: MergePolicy::default(),
            stream_refresh: StreamRefresh::default(),
            heat_scale: HeatScale::default(),
            metric: Metric::default(),
            window_hours: 24,
        }
    }
}

/// In-memory view state for all dashboard panels.
#[derive(Debug)]
pub struct Dashboard {
    source: Arc<dyn TelemetrySource>,
    tracker: Arc<ConnectionTracker>,
    tx: mpsc::UnboundedSender<Event>,
    options: DashboardOptions,

    pub feed: LiveFeed,
    pub nodes: Vec<NodeSummary>,
    pub decisions: Vec<Decision>,
    pub locations: Vec<NodeLocation>,
    pub chart: ChartData,
    pub heat: Vec<HeatSample>,
    pub markers: Vec<Marker>,

    series_points: Vec<TimeSeriesPoint>,
    selection: WindowSelection,
    node_filter: Option<String>,
    metric: Metric,
    generation: u64,
    last_updated: HashMap<Resource, Instant>,
}

impl Dashboard {
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        tracker: Arc<ConnectionTracker>,
        tx: mpsc::UnboundedSender<Event>,
        options: DashboardOptions,
    ) -> Self {
        Self {
            source,
            tracker,
            tx,
            selection: WindowSelection::preset(options.window_hours),
            metric: options.metric,
            options,
            feed: LiveFeed::new(),
            nodes: Vec::new(),
            decisions: Vec::new(),
            locations: Vec::new(),
            chart: ChartData::default(),
            heat: Vec::new(),
            markers: Vec::new(),
            series_points: Vec::new(),
            node_filter: None,
            generation: 0,
            last_updated: HashMap::new(),
        }
    }

    /// Apply one queued event. Returns `true` if any view model changed.
    pub fn handle(&mut self, event: Event) -> bool {
        match event {
            Event::Tick(resource) => {
                self.fetch(resource);
                false
            }
            Event::Stream(event) => self.on_stream(event),
            Event::Loaded(loaded) => self.apply(loaded),
            Event::Exported(_) => false,
        }
    }

    fn on_stream(&mut self, event: StreamEvent) -> bool {
        match event {
            StreamEvent::Message(reading) => {
                let mut changed = false;
                if let (MergePolicy::Prepend, Some(reading)) = (self.options.feed_policy, reading) {
                    self.feed.prepend(reading);
                    changed = true;
                }
                for resource in self.options.stream_refresh.resources() {
                    self.fetch(*resource);
                }
                changed
            }
            StreamEvent::Keepalive => false,
            StreamEvent::Error(reason) => {
                debug!("Stream error: {}", reason);
                true
            }
        }
    }

    fn apply(&mut self, loaded: Loaded) -> bool {
        let resource = loaded.resource();
        let changed = match loaded {
            Loaded::Latest(Some(batch)) => self.feed.apply_batch(self.options.feed_policy, batch),
            Loaded::Nodes(Some(nodes)) => {
                self.nodes = nodes;
                true
            }
            Loaded::Decisions(Some(decisions)) => {
                self.decisions = decisions;
                true
            }
            Loaded::Locations(Some(locations)) => {
                self.locations = locations;
                self.rebuild_map();
                true
            }
            Loaded::TimeSeries { generation, points } => {
                if generation != self.generation {
                    debug!(
                        "Discarding time series from generation {} (current {})",
                        generation, self.generation
                    );
                    return false;
                }
                match points {
                    Some(points) => {
                        self.series_points = points;
                        self.rebuild_chart();
                        true
                    }
                    None => return false,
                }
            }
            // Failed fetch: keep what is shown
            _ => return false,
        };
        self.last_updated.insert(resource, Instant::now());
        changed
    }

    /// Spawn a fetch for `resource`. Returns `false` if nothing was requested.
    pub fn fetch(&mut self, resource: Resource) -> bool {
        let source = self.source.clone();
        match resource {
            Resource::Latest => {
                let limit = self.options.latest_limit;
                self.spawn_load(async move { Loaded::Latest(source.latest(limit).await) });
            }
            Resource::Nodes => {
                self.spawn_load(async move { Loaded::Nodes(source.node_stats().await) });
            }
            Resource::Decisions => {
                self.spawn_load(async move { Loaded::Decisions(source.decisions().await) });
            }
            Resource::Locations => {
                self.spawn_load(async move { Loaded::Locations(source.node_locations().await) });
            }
            Resource::TimeSeries => {
                let window = match window::resolve(&self.selection) {
                    Ok(Resolution::Fetch(window)) => window,
                    Ok(Resolution::NoOp) => return false,
                    Err(e) => {
                        warn!("Not fetching time series: {}", e);
                        return false;
                    }
                };
                let query = TimeSeriesQuery {
                    window,
                    node_id: self.node_filter.clone(),
                };
                let generation = self.generation;
                self.spawn_load(async move {
                    let points = source.time_series(&query).await;
                    Loaded::TimeSeries { generation, points }
                });
            }
        }
        true
    }

    /// Fetch all five resources concurrently.
    pub fn refresh_all(&mut self) {
        info!("Refreshing all resources from {}", self.source.description());
        for resource in Resource::ALL {
            self.fetch(resource);
        }
    }

    fn spawn_load<F>(&self, load: F)
    where
        F: Future<Output = Loaded> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // The receiver is gone only during shutdown
            let _ = tx.send(Event::Loaded(load.await));
        });
    }

    /// Switch to a preset window and fetch it immediately.
    pub fn select_preset(&mut self, hours: u32) {
        self.set_selection(WindowSelection::preset(hours));
        self.fetch(Resource::TimeSeries);
    }

    /// Enter custom mode without fetching.
    ///
    /// The draft starts from the applied custom bounds, if any.
    pub fn begin_custom(&mut self) {
        let (start, end) = match &self.selection {
            WindowSelection::Applied(TimeWindow::Custom { start, end }) => {
                (Some(window::format_local(start)), Some(window::format_local(end)))
            }
            WindowSelection::Draft { start, end } => (start.clone(), end.clone()),
            WindowSelection::Applied(TimeWindow::Preset { .. }) => (None, None),
        };
        self.set_selection(WindowSelection::Draft { start, end });
    }

    /// Update the draft bounds. Has no effect on the query until applied.
    pub fn set_custom_bounds(&mut self, start: Option<String>, end: Option<String>) {
        self.selection = WindowSelection::Draft { start, end };
    }

    /// Validate the draft and, if valid, fetch it.
    ///
    /// On error the draft is kept so the user can correct it.
    pub fn apply_custom(&mut self) -> Result<(), InvalidRangeError> {
        let WindowSelection::Draft { start, end } = &self.selection else {
            return Ok(());
        };
        let window = TimeWindow::custom(start.as_deref(), end.as_deref())?;
        self.set_selection(WindowSelection::Applied(window));
        self.fetch(Resource::TimeSeries);
        Ok(())
    }

    fn set_selection(&mut self, selection: WindowSelection) {
        self.selection = selection;
        self.generation += 1;
    }

    /// Restrict the chart to one node, or all nodes with `None`.
    pub fn set_node_filter(&mut self, node_id: Option<String>) {
        if self.node_filter == node_id {
            return;
        }
        self.node_filter = node_id;
        self.generation += 1;
        self.fetch(Resource::TimeSeries);
    }

    /// Step the node filter through "all" and every known node.
    pub fn cycle_node_filter(&mut self) {
        let mut known: Vec<&str> = self.nodes.iter().map(|n| n.node_id.as_str()).collect();
        if known.is_empty() {
            known = self.locations.iter().map(|l| l.node_id.as_str()).collect();
        }

        let next = match &self.node_filter {
            None => known.first().map(|id| id.to_string()),
            Some(current) => known
                .iter()
                .position(|id| *id == current.as_str())
                .and_then(|i| known.get(i + 1))
                .map(|id| id.to_string()),
        };
        self.set_node_filter(next);
    }

    /// Change the displayed metric. Rebuilds the chart and heat map from
    /// data already held; nothing is fetched.
    pub fn set_metric(&mut self, metric: Metric) {
        self.metric = metric;
        self.rebuild_chart();
        self.rebuild_map();
    }

    fn rebuild_chart(&mut self) {
        self.chart = series::aggregate(&self.series_points, &[self.metric]);
    }

    fn rebuild_map(&mut self) {
        self.heat = heat::build(&self.locations, self.metric, self.options.heat_scale);
        self.markers = heat::markers(&self.locations);
    }

    /// Export bounds for the current selection.
    pub fn export_range(&self, now: DateTime<Utc>) -> Result<ExportRange, InvalidRangeError> {
        ExportRange::build(&self.selection, now)
    }

    pub fn selection(&self) -> &WindowSelection {
        &self.selection
    }

    pub fn node_filter(&self) -> Option<&str> {
        self.node_filter.as_deref()
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn connection(&self) -> ConnectionState {
        self.tracker.state()
    }

    /// Time since `resource` last loaded successfully.
    pub fn updated_ago(&self, resource: Resource) -> Option<Duration> {
        self.last_updated.get(&resource).map(|at| at.elapsed())
    }

    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    pub fn source(&self) -> Arc<dyn TelemetrySource> {
        self.source.clone()
    }
}
