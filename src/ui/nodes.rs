//! Node statistics view.

use chrono::Utc;
use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use super::format_value;
use crate::app::App;

/// Nodes silent for longer than this are dimmed.
const STALE_AFTER_MINUTES: i64 = 15;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let nodes = &app.dashboard.nodes;
    let now = Utc::now();

    let header = Row::new(vec![
        "Node", "Last seen", "Readings", "Temp °C", "Humidity %", "Soil %", "Light lx", "Voltage V",
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = nodes
        .iter()
        .map(|n| {
            let age = now.signed_duration_since(n.last_seen);
            let seen_style = if age.num_minutes() >= STALE_AFTER_MINUTES {
                Style::default().fg(app.theme.warning)
            } else {
                Style::default()
            };
            Row::new(vec![
                Cell::from(n.node_id.clone()),
                Cell::from(format_age(age.num_seconds())).style(seen_style),
                Cell::from(n.reading_count.to_string()),
                Cell::from(format_value(n.avg_temp, 1)),
                Cell::from(format_value(n.avg_humidity, 1)),
                Cell::from(format_value(n.avg_soil_moisture, 1)),
                Cell::from(format_value(n.avg_lux, 0)),
                Cell::from(format_value(n.avg_voltage, 2)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!(" Nodes ({}) ", nodes.len()))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !nodes.is_empty() {
        state.select(Some(app.selected_index.min(nodes.len() - 1)));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

/// Compact age like "42s", "7m", "3h", "2d".
fn format_age(seconds: i64) -> String {
    let seconds = seconds.max(0);
    if seconds < 60 {
        format!("{}s ago", seconds)
    } else if seconds < 3_600 {
        format!("{}m ago", seconds / 60)
    } else if seconds < 86_400 {
        format!("{}h ago", seconds / 3_600)
    } else {
        format!("{}d ago", seconds / 86_400)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_age() {
        assert_eq!(format_age(-5), "0s ago");
        assert_eq!(format_age(125), "2m ago");
        assert_eq!(format_age(7_200), "2h ago");
        assert_eq!(format_age(200_000), "2d ago");
    }
}
