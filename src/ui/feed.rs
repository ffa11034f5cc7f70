//! Live feed view: the newest readings, newest first.

use ratatui::{
    layout::{Alignment, Constraint, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState},
    Frame,
};

use super::format_value;
use crate::app::App;
use crate::data::{Metric, FEED_CAPACITY};
use crate::source::Reading;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let feed = &app.dashboard.feed;

    let block = Block::default()
        .title(format!(" Live feed ({}/{}) ", feed.len(), FEED_CAPACITY))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if feed.is_empty() {
        let text = if feed.is_placeholder() {
            "Waiting for readings..."
        } else {
            "No recent readings"
        };
        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let header = Row::new(vec![
        "Time", "Node", "Temp °C", "Humidity %", "Soil %", "Light lx", "Voltage V",
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = feed
        .iter()
        .map(|r| {
            let mut cells = vec![
                Cell::from(r.timestamp.format("%H:%M:%S").to_string()),
                Cell::from(r.node_id.clone()),
            ];
            cells.extend(metric_values(r).into_iter().map(Cell::from));
            Row::new(cells)
        })
        .collect();

    let widths = [
        Constraint::Length(10),
        Constraint::Fill(2),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(block)
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    state.select(Some(app.selected_index.min(feed.len().saturating_sub(1))));

    frame.render_stateful_widget(table, area, &mut state);
}

/// One formatted value per metric, in column order.
fn metric_values(reading: &Reading) -> Vec<String> {
    Metric::ALL
        .iter()
        .map(|m| format_value(reading.metric(*m), precision(*m)))
        .collect()
}

/// Decimal places shown for each metric.
fn precision(metric: Metric) -> usize {
    match metric {
        Metric::Lux => 0,
        Metric::Voltage => 2,
        _ => 1,
    }
}
