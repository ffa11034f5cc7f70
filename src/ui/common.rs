//! Common UI components shared across views.
//!
//! This module contains the header bar, tab bar, status bar, and the help
//! and custom range overlays.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Tabs},
    Frame,
};

use crate::app::{App, RangeField, View};
use crate::data::duration::format_duration;
use crate::refresh::Resource;

/// Render the header bar with connection state and the active selection.
pub fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let dash = &app.dashboard;
    let connection = dash.connection();

    let line = Line::from(vec![
        Span::styled(" ● ", app.theme.connection_style(connection)),
        Span::styled("MESHWATCH ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw("│ "),
        Span::styled(connection.label(), app.theme.connection_style(connection)),
        Span::raw(" │ "),
        Span::styled(
            format!("{}", dash.nodes.len()),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(" nodes │ "),
        Span::raw(dash.selection().describe()),
        Span::raw(" │ "),
        Span::raw(dash.metric().label()),
        Span::raw(" │ "),
        Span::raw(dash.node_filter().unwrap_or("all nodes").to_string()),
    ]);

    frame.render_widget(Paragraph::new(line), area);
}

/// Render the tab bar showing available views.
///
/// Highlights the currently active view.
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let titles: Vec<Line> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, view)| Line::from(format!(" {}:{} ", i + 1, view.label())))
        .collect();

    let selected = View::ALL
        .iter()
        .position(|v| *v == app.current_view)
        .unwrap_or(0);

    let tabs = Tabs::new(titles)
        .select(selected)
        .style(app.theme.tab_inactive)
        .highlight_style(app.theme.tab_active)
        .divider("|");

    frame.render_widget(tabs, area);
}

fn view_resource(view: View) -> Resource {
    match view {
        View::Feed => Resource::Latest,
        View::Nodes => Resource::Nodes,
        View::Decisions => Resource::Decisions,
        View::Charts => Resource::TimeSeries,
        View::Map => Resource::Locations,
    }
}

/// Render the status bar at the bottom.
///
/// Shows: source, time since the current view's data last loaded, controls.
/// Temporary status messages take precedence.
pub fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    if let Some(msg) = app.get_status_message() {
        let paragraph =
            Paragraph::new(format!(" {} ", msg)).style(Style::default().fg(app.theme.highlight));
        frame.render_widget(paragraph, area);
        return;
    }

    let updated = match app.dashboard.updated_ago(view_resource(app.current_view)) {
        Some(elapsed) => format!("Updated {} ago", format_duration(elapsed)),
        None => "Waiting for data".to_string(),
    };

    let controls = match app.current_view {
        View::Charts => "w:window c:custom m:metric n:node e:export ?:help q:quit",
        View::Map => "m:metric r:refresh ?:help q:quit",
        _ => "↑↓:select Tab:switch r:refresh ?:help q:quit",
    };

    let status = format!(" {} | {} | {}", app.source_description(), updated, controls);
    let paragraph = Paragraph::new(status).style(Style::default().add_modifier(Modifier::DIM));

    frame.render_widget(paragraph, area);
}

/// Render the custom window editor as a centered modal.
pub fn render_range_input(frame: &mut Frame, app: &App, area: Rect) {
    let Some(input) = &app.range_input else {
        return;
    };

    let field = |label: &str, value: &str, focused: bool| {
        let style = if focused {
            app.theme.selected
        } else {
            Style::default()
        };
        let cursor = if focused { "_" } else { "" };
        Line::from(vec![
            Span::raw(format!("  {:<6} ", label)),
            Span::styled(format!("{}{}", value, cursor), style),
        ])
    };

    let mut lines = vec![
        Line::from(vec![Span::styled("Custom window (local time)", app.theme.header)]),
        Line::from(""),
        field("Start", &input.start, input.focus == RangeField::Start),
        field("End", &input.end, input.focus == RangeField::End),
        Line::from(""),
        Line::from(Span::styled(
            "  YYYY-MM-DDTHH:MM[:SS]",
            Style::default().add_modifier(Modifier::DIM),
        )),
    ];
    if let Some(error) = &input.error {
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            Style::default().fg(app.theme.critical),
        )));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "Tab:switch Enter:apply Esc:close",
        Style::default().add_modifier(Modifier::DIM),
    )));

    let block = Block::default()
        .title(" Window ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let width = 52u16.min(area.width.saturating_sub(4));
    let height = 12u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    let modal = Rect::new(x, y, width, height);

    frame.render_widget(Clear, modal);
    frame.render_widget(Paragraph::new(lines).block(block), modal);
}

/// Render the help overlay with keyboard shortcuts.
///
/// Displayed as a centered modal on top of the current view.
pub fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let section = |title: &'static str| {
        Line::from(vec![Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )])
    };

    let help_text = vec![
        Line::from(vec![Span::styled("Keyboard Shortcuts", app.theme.header)]),
        Line::from(""),
        section(" Navigation"),
        Line::from("  ←/→ Tab     Switch views"),
        Line::from("  1-5         Jump to view"),
        Line::from("  ↑/↓ j/k     Navigate list"),
        Line::from("  PgUp/PgDn   Jump 10 items"),
        Line::from(""),
        section(" Charts & Map"),
        Line::from("  w         Next preset window"),
        Line::from("  c         Custom window"),
        Line::from("  m         Cycle metric"),
        Line::from("  n         Cycle node filter"),
        Line::from(""),
        section(" General"),
        Line::from("  r         Refresh everything"),
        Line::from("  e         Export CSV"),
        Line::from("  q         Quit"),
        Line::from(""),
        Line::from(vec![Span::styled(
            "Press any key to close",
            Style::default().add_modifier(Modifier::DIM),
        )]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.highlight));

    let paragraph = Paragraph::new(help_text).block(block);

    // Center the help overlay - responsive to terminal size
    let help_width = 42u16.min(area.width.saturating_sub(4));
    let help_height = 23u16.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(help_width)) / 2;
    let y = area.y + (area.height.saturating_sub(help_height)) / 2;
    let help_area = Rect::new(x, y, help_width, help_height);

    frame.render_widget(Clear, help_area);
    frame.render_widget(paragraph, help_area);
}
