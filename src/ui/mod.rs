//! Terminal UI rendering using ratatui.
//!
//! Each view is implemented in its own submodule with a `render` function.
//!
//! ## Submodules
//!
//! - [`feed`]: Newest readings as they arrive
//! - [`nodes`]: Per-node aggregate table
//! - [`decisions`]: Recent decisions with action highlighting
//! - [`charts`]: Time-series chart for the selected window and metric
//! - [`map`]: Node markers colored by heat intensity
//! - [`common`]: Shared components (header, tabs, status bar, overlays)
//! - [`theme`]: Light/dark theme support with terminal auto-detection
//!
//! ## Rendering Architecture
//!
//! ```text
//! ┌──────────────────────────────────────┐
//! │ Header (common::render_header)       │
//! ├──────────────────────────────────────┤
//! │ Tabs (common::render_tabs)           │
//! ├──────────────────────────────────────┤
//! │                                      │
//! │ View Content                         │
//! │ (feed/nodes/decisions/charts/map)    │
//! │                                      │
//! ├──────────────────────────────────────┤
//! │ Status Bar (common::render_status)   │
//! └──────────────────────────────────────┘
//!         ↑
//!    Overlays rendered on top:
//!    - common::render_range_input
//!    - common::render_help
//! ```

pub mod charts;
pub mod common;
pub mod decisions;
pub mod feed;
pub mod map;
pub mod nodes;
pub mod theme;

pub use theme::Theme;

use ratatui::layout::{Constraint, Layout};
use ratatui::Frame;

use crate::app::{App, View};

/// Draw one full frame.
pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(1), // Header bar
        Constraint::Length(1), // Tabs
        Constraint::Min(8),    // Content
        Constraint::Length(1), // Status bar
    ])
    .split(frame.area());

    common::render_header(frame, app, chunks[0]);
    common::render_tabs(frame, app, chunks[1]);

    match app.current_view {
        View::Feed => feed::render(frame, app, chunks[2]),
        View::Nodes => nodes::render(frame, app, chunks[2]),
        View::Decisions => decisions::render(frame, app, chunks[2]),
        View::Charts => charts::render(frame, app, chunks[2]),
        View::Map => map::render(frame, app, chunks[2]),
    }

    common::render_status_bar(frame, app, chunks[3]);

    if app.range_input.is_some() {
        common::render_range_input(frame, app, frame.area());
    }

    if app.show_help {
        common::render_help(frame, app, frame.area());
    }
}

/// Format an optional reading with fixed precision, or "-".
pub(crate) fn format_value(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}
