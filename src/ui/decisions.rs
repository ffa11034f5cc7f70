//! Decisions view.
//!
//! One row per decision, newest first as returned by the backend. The action
//! column is colored by qualifier and the confidence shown as a percentage.

use ratatui::{
    layout::{Constraint, Rect},
    style::Style,
    widgets::{Block, Borders, Cell, Row, Table, TableState},
    Frame,
};

use super::format_value;
use crate::app::App;
use crate::source::Decision;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let decisions = &app.dashboard.decisions;

    let header = Row::new(vec!["Time", "Node", "Action", "Conf.", "Decision", "Soil / Temp / V"])
        .height(1)
        .style(app.theme.header);

    let rows: Vec<Row> = decisions
        .iter()
        .map(|d| {
            Row::new(vec![
                Cell::from(d.timestamp.format("%m-%d %H:%M").to_string()),
                Cell::from(d.node_id.clone()),
                Cell::from(action_label(d)).style(app.theme.action_style(&d.action)),
                Cell::from(format!("{:.0}%", d.confidence * 100.0)),
                Cell::from(d.decision.clone()),
                Cell::from(metrics_label(d)),
            ])
        })
        .collect();

    let widths = [
        Constraint::Length(12),
        Constraint::Fill(1),
        Constraint::Fill(1),
        Constraint::Length(6),
        Constraint::Fill(3),
        Constraint::Fill(1),
    ];

    let table = Table::new(rows, widths)
        .header(header)
        .block(
            Block::default()
                .title(format!(" Decisions ({}) ", decisions.len()))
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .border_style(Style::default().fg(app.theme.border)),
        )
        .row_highlight_style(app.theme.selected)
        .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !decisions.is_empty() {
        state.select(Some(app.selected_index.min(decisions.len() - 1)));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

fn action_label(decision: &Decision) -> String {
    match decision.action.parts() {
        Some((action, qualifier)) => format!("{} ({})", action, qualifier),
        None => decision.action.as_str().to_string(),
    }
}

fn metrics_label(decision: &Decision) -> String {
    match &decision.metrics {
        Some(m) => format!(
            "{} / {} / {}",
            format_value(m.soil_moisture, 0),
            format_value(m.temperature, 1),
            format_value(m.voltage, 2)
        ),
        None => "-".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::DecisionAction;
    use chrono::Utc;

    fn decision(action: &str) -> Decision {
        Decision {
            node_id: "n1".to_string(),
            timestamp: Utc::now(),
            decision: "Low soil moisture detected".to_string(),
            action: DecisionAction(action.to_string()),
            confidence: 0.88,
            metrics: None,
        }
    }

    #[test]
    fn test_action_label() {
        assert_eq!(action_label(&decision("water_needed")), "water (needed)");
        assert_eq!(action_label(&decision("none")), "none");
        assert_eq!(metrics_label(&decision("none")), "-");
    }
}
