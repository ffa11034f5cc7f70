//! Time-series chart view.
//!
//! The x axis is the label index rather than wall time, so buckets a node
//! skipped show as gaps in that node's dataset instead of interpolated lines.

use ratatui::{
    layout::{Alignment, Rect},
    style::{Modifier, Style},
    symbols,
    text::Span,
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph},
    Frame,
};

use super::theme::hex_color;
use crate::app::App;
use crate::data::series;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let dash = &app.dashboard;
    let chart = &dash.chart;
    let metric = dash.metric();

    let title = format!(
        " {} ({}) │ {} ",
        metric.label(),
        metric.unit(),
        dash.selection().describe()
    );
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    if chart.is_empty() || chart.labels.is_empty() {
        let text = if dash.selection().is_draft() {
            "Press c to finish the custom window"
        } else {
            "No data for this window"
        };
        let paragraph = Paragraph::new(text)
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    // The chart widget borrows point slices, so they must outlive it.
    let coords: Vec<Vec<(f64, f64)>> = chart.datasets.iter().map(points).collect();

    let datasets: Vec<Dataset> = chart
        .datasets
        .iter()
        .zip(&coords)
        .map(|(dataset, data)| {
            Dataset::default()
                .name(dataset.label.clone())
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Scatter)
                .style(Style::default().fg(hex_color(dataset.color)))
                .data(data)
        })
        .collect();

    let (y_min, y_max) = y_bounds(&coords);
    let x_max = chart.labels.len().saturating_sub(1).max(1) as f64;

    let x_labels: Vec<Span> = x_axis_labels(&chart.labels)
        .into_iter()
        .map(Span::raw)
        .collect();
    let y_labels = vec![
        Span::raw(format!("{:.1}", y_min)),
        Span::raw(format!("{:.1}", (y_min + y_max) / 2.0)),
        Span::raw(format!("{:.1}", y_max)),
    ];

    let widget = Chart::new(datasets)
        .block(block)
        .x_axis(
            Axis::default()
                .style(Style::default().fg(app.theme.border))
                .bounds([0.0, x_max])
                .labels(x_labels),
        )
        .y_axis(
            Axis::default()
                .title(metric.unit())
                .style(Style::default().fg(app.theme.border))
                .bounds([y_min, y_max])
                .labels(y_labels),
        );

    frame.render_widget(widget, area);
}

/// Present slots of a dataset as `(label index, value)` pairs.
fn points(dataset: &series::Dataset) -> Vec<(f64, f64)> {
    dataset
        .data
        .iter()
        .enumerate()
        .filter_map(|(i, value)| value.map(|v| (i as f64, v)))
        .collect()
}

/// Y range covering every point, padded so flat lines stay visible.
fn y_bounds(coords: &[Vec<(f64, f64)>]) -> (f64, f64) {
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for (_, y) in coords.iter().flatten() {
        min = min.min(*y);
        max = max.max(*y);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let pad = ((max - min) * 0.1).max(0.5);
    (min - pad, max + pad)
}

/// First, middle and last label, trimmed to the time of day when the
/// window fits in one day.
fn x_axis_labels(labels: &[String]) -> Vec<String> {
    let (Some(first), Some(last)) = (labels.first(), labels.last()) else {
        return Vec::new();
    };
    let same_day = first.get(..10) == last.get(..10);
    let short = |label: &String| {
        if same_day {
            label.get(11..).unwrap_or(label).to_string()
        } else {
            label.clone()
        }
    };

    if labels.len() < 3 {
        return labels.iter().map(short).collect();
    }
    vec![short(first), short(&labels[labels.len() / 2]), short(last)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Metric;

    fn dataset(data: Vec<Option<f64>>) -> series::Dataset {
        series::Dataset {
            label: "n1".to_string(),
            node_id: "n1".to_string(),
            metric: Metric::Temperature,
            data,
            color: series::PALETTE[0],
        }
    }

    #[test]
    fn test_points_skip_gaps() {
        let coords = points(&dataset(vec![Some(20.0), None, Some(22.0)]));
        assert_eq!(coords, vec![(0.0, 20.0), (2.0, 22.0)]);
    }

    #[test]
    fn test_y_bounds_padding() {
        assert_eq!(y_bounds(&[]), (0.0, 1.0));

        let (min, max) = y_bounds(&[vec![(0.0, 10.0)], vec![(1.0, 10.0)]]);
        assert_eq!((min, max), (9.5, 10.5));

        let (min, max) = y_bounds(&[vec![(0.0, 0.0), (1.0, 100.0)]]);
        assert_eq!((min, max), (-10.0, 110.0));
    }

    #[test]
    fn test_x_axis_labels() {
        let same_day: Vec<String> = ["2024-01-01 10:00", "2024-01-01 11:00", "2024-01-01 12:00"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(x_axis_labels(&same_day), vec!["10:00", "11:00", "12:00"]);

        let spanning: Vec<String> = ["2024-01-01 23:00", "2024-01-02 00:00"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(x_axis_labels(&spanning), spanning);
        assert!(x_axis_labels(&[]).is_empty());
    }
}
