//! Application state and navigation logic.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::dashboard::Dashboard;
use crate::data::{TimeWindow, WindowSelection};
use crate::refresh::Event;
use crate::ui::Theme;

/// Preset windows offered by the `w` key, in hours.
pub const PRESET_HOURS: [u32; 6] = [1, 6, 12, 24, 48, 168];

/// How long a status message stays visible.
const STATUS_TTL: Duration = Duration::from_secs(3);

/// The current view/tab in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Rolling feed of the newest readings.
    Feed,
    /// Per-node aggregates.
    Nodes,
    /// Recent rule decisions.
    Decisions,
    /// Time-series chart for the selected window.
    Charts,
    /// Node positions and heat samples.
    Map,
}

impl View {
    pub const ALL: [View; 5] = [View::Feed, View::Nodes, View::Decisions, View::Charts, View::Map];

    /// Cycle to the next view.
    pub fn next(self) -> Self {
        match self {
            View::Feed => View::Nodes,
            View::Nodes => View::Decisions,
            View::Decisions => View::Charts,
            View::Charts => View::Map,
            View::Map => View::Feed,
        }
    }

    /// Cycle to the previous view.
    pub fn prev(self) -> Self {
        match self {
            View::Feed => View::Map,
            View::Nodes => View::Feed,
            View::Decisions => View::Nodes,
            View::Charts => View::Decisions,
            View::Map => View::Charts,
        }
    }

    /// Returns the display label for this view.
    pub fn label(&self) -> &'static str {
        match self {
            View::Feed => "Feed",
            View::Nodes => "Nodes",
            View::Decisions => "Decisions",
            View::Charts => "Charts",
            View::Map => "Map",
        }
    }
}

/// Which bound the custom range editor is typing into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangeField {
    Start,
    End,
}

/// Text entry state for a custom time window.
#[derive(Debug, Clone)]
pub struct RangeInput {
    pub start: String,
    pub end: String,
    pub focus: RangeField,
    pub error: Option<String>,
}

impl RangeInput {
    fn new(start: Option<String>, end: Option<String>) -> Self {
        Self {
            start: start.unwrap_or_default(),
            end: end.unwrap_or_default(),
            focus: RangeField::Start,
            error: None,
        }
    }

    fn field(&mut self) -> &mut String {
        match self.focus {
            RangeField::Start => &mut self.start,
            RangeField::End => &mut self.end,
        }
    }

    pub fn push(&mut self, c: char) {
        self.field().push(c);
        self.error = None;
    }

    pub fn pop(&mut self) {
        self.field().pop();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            RangeField::Start => RangeField::End,
            RangeField::End => RangeField::Start,
        };
    }

    fn bounds(&self) -> (Option<String>, Option<String>) {
        let non_empty = |s: &str| (!s.trim().is_empty()).then(|| s.trim().to_string());
        (non_empty(&self.start), non_empty(&self.end))
    }
}

/// Main application state.
pub struct App {
    pub running: bool,
    pub current_view: View,
    pub show_help: bool,

    pub dashboard: Dashboard,
    events: mpsc::UnboundedReceiver<Event>,

    // Navigation state
    pub selected_index: usize,

    /// Open while the custom window editor is shown.
    pub range_input: Option<RangeInput>,

    /// Directory CSV exports are written to.
    pub export_dir: PathBuf,

    // UI
    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(
        dashboard: Dashboard,
        events: mpsc::UnboundedReceiver<Event>,
        export_dir: PathBuf,
        theme: Theme,
    ) -> Self {
        Self {
            running: true,
            current_view: View::Feed,
            show_help: false,
            dashboard,
            events,
            selected_index: 0,
            range_input: None,
            export_dir,
            theme,
            status_message: None,
        }
    }

    /// Returns a description of the current data source.
    pub fn source_description(&self) -> String {
        self.dashboard.source().description().to_string()
    }

    /// Set a temporary status message that will be shown for a few seconds.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// Get the current status message if it hasn't expired.
    pub fn get_status_message(&self) -> Option<&str> {
        match &self.status_message {
            Some((msg, time)) if time.elapsed() < STATUS_TTL => Some(msg),
            _ => None,
        }
    }

    /// Apply every queued update without blocking.
    ///
    /// Returns true if anything changed.
    pub fn drain_events(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.events.try_recv() {
            changed |= self.handle_event(event);
        }
        if changed {
            self.clamp_selection();
        }
        changed
    }

    pub fn handle_event(&mut self, event: Event) -> bool {
        match event {
            Event::Exported(Ok(path)) => {
                self.set_status_message(format!("Exported to {}", path.display()));
                true
            }
            Event::Exported(Err(reason)) => {
                self.set_status_message(format!("Export failed: {}", reason));
                true
            }
            other => self.dashboard.handle(other),
        }
    }

    /// Switch to the next view.
    pub fn next_view(&mut self) {
        self.set_view(self.current_view.next());
    }

    /// Switch to the previous view.
    pub fn prev_view(&mut self) {
        self.set_view(self.current_view.prev());
    }

    /// Switch to a specific view.
    pub fn set_view(&mut self, view: View) {
        self.current_view = view;
        self.selected_index = 0;
    }

    fn row_count(&self) -> usize {
        match self.current_view {
            View::Feed => self.dashboard.feed.len(),
            View::Nodes => self.dashboard.nodes.len(),
            View::Decisions => self.dashboard.decisions.len(),
            View::Charts => self.dashboard.chart.datasets.len(),
            View::Map => self.dashboard.locations.len(),
        }
    }

    fn clamp_selection(&mut self) {
        self.selected_index = self.selected_index.min(self.row_count().saturating_sub(1));
    }

    /// Move selection down by one item.
    pub fn select_next(&mut self) {
        self.select_next_n(1);
    }

    /// Move selection up by one item.
    pub fn select_prev(&mut self) {
        self.select_prev_n(1);
    }

    pub fn select_next_n(&mut self, n: usize) {
        let max = self.row_count().saturating_sub(1);
        self.selected_index = (self.selected_index + n).min(max);
    }

    pub fn select_prev_n(&mut self, n: usize) {
        self.selected_index = self.selected_index.saturating_sub(n);
    }

    pub fn select_first(&mut self) {
        self.selected_index = 0;
    }

    pub fn select_last(&mut self) {
        self.selected_index = self.row_count().saturating_sub(1);
    }

    /// Fetch every resource now.
    pub fn refresh(&mut self) {
        self.dashboard.refresh_all();
        self.set_status_message("Refreshing...".to_string());
    }

    /// Step to the next preset window and fetch it.
    pub fn cycle_window(&mut self) {
        let next = match self.dashboard.selection() {
            WindowSelection::Applied(TimeWindow::Preset { hours }) => PRESET_HOURS
                .iter()
                .copied()
                .find(|h| h > hours)
                .unwrap_or(PRESET_HOURS[0]),
            _ => PRESET_HOURS[0],
        };
        self.dashboard.select_preset(next);
        self.set_status_message(format!("Window: {}", self.dashboard.selection().describe()));
    }

    /// Enter custom window mode and open the editor. Nothing is fetched yet.
    pub fn start_custom_range(&mut self) {
        self.dashboard.begin_custom();
        let (start, end) = match self.dashboard.selection() {
            WindowSelection::Draft { start, end } => (start.clone(), end.clone()),
            WindowSelection::Applied(_) => (None, None),
        };
        self.range_input = Some(RangeInput::new(start, end));
    }

    /// Apply the edited range. The editor stays open on a validation error.
    pub fn apply_range_input(&mut self) {
        let Some(input) = self.range_input.as_mut() else {
            return;
        };
        let (start, end) = input.bounds();
        self.dashboard.set_custom_bounds(start, end);

        match self.dashboard.apply_custom() {
            Ok(()) => {
                self.range_input = None;
                self.set_status_message(format!("Window: {}", self.dashboard.selection().describe()));
            }
            Err(e) => {
                if let Some(input) = self.range_input.as_mut() {
                    input.error = Some(e.to_string());
                }
            }
        }
    }

    /// Close the editor. The selection stays a draft until applied.
    pub fn cancel_range_input(&mut self) {
        if let Some(input) = self.range_input.take() {
            let (start, end) = input.bounds();
            self.dashboard.set_custom_bounds(start, end);
            self.set_status_message("Custom range not applied (c:edit w:preset)".to_string());
        }
    }

    pub fn cycle_metric(&mut self) {
        let metric = self.dashboard.metric().next();
        self.dashboard.set_metric(metric);
        self.set_status_message(format!("Metric: {}", metric.label()));
    }

    pub fn cycle_node_filter(&mut self) {
        self.dashboard.cycle_node_filter();
        let filter = self.dashboard.node_filter().unwrap_or("all nodes").to_string();
        self.set_status_message(format!("Chart: {}", filter));
    }

    /// Request a CSV export for the current window.
    ///
    /// The download runs in the background and reports back through
    /// [`Event::Exported`].
    pub fn export(&mut self) {
        let range = match self.dashboard.export_range(Utc::now()) {
            Ok(range) => range,
            Err(e) => {
                self.set_status_message(format!("Export failed: {}", e));
                return;
            }
        };

        let source = self.dashboard.source();
        let tx = self.dashboard.sender();
        let dir = self.export_dir.clone();
        info!("Exporting CSV for {}", range.query_string());

        tokio::spawn(async move {
            let result = match source.export_csv(Some(&range)).await {
                Some(export) => export.save_in(&dir).map_err(|e| e.to_string()),
                None => Err("backend request failed".to_string()),
            };
            if let Err(ref reason) = result {
                warn!("CSV export failed: {}", reason);
            }
            let _ = tx.send(Event::Exported(result));
        });
        self.set_status_message("Exporting...".to_string());
    }

    /// Toggle the help overlay.
    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Signal the application to quit.
    pub fn quit(&mut self) {
        self.running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardOptions;
    use crate::data::ConnectionTracker;
    use crate::source::ApiGateway;
    use std::sync::Arc;

    fn app() -> App {
        let tracker = Arc::new(ConnectionTracker::new());
        let gateway = ApiGateway::builder()
            .base_url("http://127.0.0.1:9")
            .tracker(tracker.clone())
            .build()
            .unwrap();
        let (tx, rx) = mpsc::unbounded_channel();
        let dashboard = Dashboard::new(Arc::new(gateway), tracker, tx, DashboardOptions::default());
        App::new(dashboard, rx, std::env::temp_dir(), Theme::dark())
    }

    #[test]
    fn test_view_cycle() {
        let mut view = View::Feed;
        for _ in 0..View::ALL.len() {
            assert_eq!(view.next().prev(), view);
            view = view.next();
        }
        assert_eq!(view, View::Feed);
    }

    #[tokio::test]
    async fn test_cycle_window_steps_through_presets() {
        let mut app = app();
        assert_eq!(app.dashboard.selection(), &WindowSelection::preset(24));

        app.cycle_window();
        assert_eq!(app.dashboard.selection(), &WindowSelection::preset(48));
        app.cycle_window();
        app.cycle_window();
        assert_eq!(app.dashboard.selection(), &WindowSelection::preset(1));
    }

    #[tokio::test]
    async fn test_range_input_keeps_editor_open_on_error() {
        let mut app = app();
        app.start_custom_range();
        assert!(app.dashboard.selection().is_draft());

        for c in "2024-01-01T10:00".chars() {
            app.range_input.as_mut().unwrap().push(c);
        }
        app.apply_range_input();
        let input = app.range_input.as_ref().unwrap();
        assert!(input.error.is_some());

        app.range_input.as_mut().unwrap().toggle_focus();
        for c in "2024-01-01T11:00".chars() {
            app.range_input.as_mut().unwrap().push(c);
        }
        app.apply_range_input();
        assert!(app.range_input.is_none());
        assert!(!app.dashboard.selection().is_draft());
    }

    #[tokio::test]
    async fn test_export_refused_while_draft() {
        let mut app = app();
        app.start_custom_range();
        app.cancel_range_input();

        app.export();
        assert!(app.get_status_message().unwrap().starts_with("Export failed"));
    }

    #[test]
    fn test_exported_event_sets_status() {
        let mut app = app();
        app.handle_event(Event::Exported(Ok(PathBuf::from("sensor_data_2024-01-02.csv"))));
        assert_eq!(app.get_status_message(), Some("Exported to sensor_data_2024-01-02.csv"));
    }
}
