//! Map view: node markers on a lat/lon canvas, colored by heat intensity,
//! with a side table of the selected metric's averages.

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    symbols,
    widgets::{
        canvas::{Canvas, Points},
        Block, Borders, Cell, Paragraph, Row, Table, TableState,
    },
    Frame,
};

use super::format_value;
use crate::app::App;
use crate::data::{HeatSample, Marker};

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::horizontal([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    render_canvas(frame, app, chunks[0]);
    render_table(frame, app, chunks[1]);
}

fn render_canvas(frame: &mut Frame, app: &App, area: Rect) {
    let dash = &app.dashboard;
    let block = Block::default()
        .title(format!(" Map │ {} ", dash.metric().label()))
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border));

    let Some((lon_bounds, lat_bounds)) = bounds(&dash.markers) else {
        let paragraph = Paragraph::new("No node locations")
            .alignment(Alignment::Center)
            .style(Style::default().add_modifier(Modifier::DIM))
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let scale = intensity_scale(&dash.heat);

    let canvas = Canvas::default()
        .block(block)
        .marker(symbols::Marker::Braille)
        .x_bounds(lon_bounds)
        .y_bounds(lat_bounds)
        .paint(|ctx| {
            for marker in &dash.markers {
                ctx.draw(&Points {
                    coords: &[(marker.lon, marker.lat)],
                    color: app.theme.border,
                });
            }
            for sample in &dash.heat {
                ctx.draw(&Points {
                    coords: &[(sample.lon, sample.lat)],
                    color: app.theme.heat_color(sample.intensity / scale),
                });
            }
            ctx.layer();
            for marker in &dash.markers {
                ctx.print(marker.lon, marker.lat, format!(" {}", marker.name));
            }
        });

    frame.render_widget(canvas, area);
}

fn render_table(frame: &mut Frame, app: &App, area: Rect) {
    let dash = &app.dashboard;
    let metric = dash.metric();

    let header = Row::new(vec![
        "Node".to_string(),
        format!("{} {}", metric.label(), metric.unit()),
        "Readings".to_string(),
    ])
    .height(1)
    .style(app.theme.header);

    let rows: Vec<Row> = dash
        .locations
        .iter()
        .map(|location| {
            let name = location.name.as_deref().unwrap_or(&location.node_id);
            let located = location.lat.is_some() && location.lon.is_some();
            let style = if located {
                Style::default()
            } else {
                Style::default().add_modifier(Modifier::DIM)
            };
            Row::new(vec![
                Cell::from(name.to_string()),
                Cell::from(format_value(location.average(metric), 1)),
                Cell::from(
                    location
                        .reading_count
                        .map(|c| c.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                ),
            ])
            .style(style)
        })
        .collect();

    let table = Table::new(
        rows,
        [Constraint::Fill(2), Constraint::Fill(1), Constraint::Fill(1)],
    )
    .header(header)
    .block(
        Block::default()
            .title(format!(" Locations ({}) ", dash.locations.len()))
            .borders(Borders::ALL)
            .border_type(app.theme.border_type)
            .border_style(Style::default().fg(app.theme.border)),
    )
    .row_highlight_style(app.theme.selected)
    .highlight_symbol("▶ ");

    let mut state = TableState::default();
    if !dash.locations.is_empty() {
        state.select(Some(app.selected_index.min(dash.locations.len() - 1)));
    }

    frame.render_stateful_widget(table, area, &mut state);
}

/// Padded `(lon, lat)` bounds around all markers.
fn bounds(markers: &[Marker]) -> Option<([f64; 2], [f64; 2])> {
    let first = markers.first()?;
    let (mut lon_min, mut lon_max) = (first.lon, first.lon);
    let (mut lat_min, mut lat_max) = (first.lat, first.lat);
    for marker in &markers[1..] {
        lon_min = lon_min.min(marker.lon);
        lon_max = lon_max.max(marker.lon);
        lat_min = lat_min.min(marker.lat);
        lat_max = lat_max.max(marker.lat);
    }

    // A single node or a straight line still gets some room around it.
    let lon_pad = ((lon_max - lon_min) * 0.15).max(0.001);
    let lat_pad = ((lat_max - lat_min) * 0.15).max(0.001);
    Some((
        [lon_min - lon_pad, lon_max + lon_pad],
        [lat_min - lat_pad, lat_max + lat_pad],
    ))
}

/// Divisor that brings every intensity into `0.0..=1.0` for coloring.
///
/// Normalized intensities mostly already fit; raw ones are scaled by the max.
fn intensity_scale(heat: &[HeatSample]) -> f64 {
    heat.iter()
        .map(|sample| sample.intensity)
        .fold(1.0, f64::max)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(lat: f64, lon: f64) -> Marker {
        Marker {
            node_id: "n".to_string(),
            name: "n".to_string(),
            lat,
            lon,
        }
    }

    #[test]
    fn test_bounds() {
        assert!(bounds(&[]).is_none());

        let (lon, lat) = bounds(&[marker(10.0, 20.0), marker(12.0, 24.0)]).unwrap();
        assert!((lon[0] - 19.4).abs() < 1e-9 && (lon[1] - 24.6).abs() < 1e-9);
        assert!((lat[0] - 9.7).abs() < 1e-9 && (lat[1] - 12.3).abs() < 1e-9);

        let (lon, lat) = bounds(&[marker(10.0, 20.0)]).unwrap();
        assert!(lon[0] < 20.0 && lon[1] > 20.0);
        assert!(lat[0] < 10.0 && lat[1] > 10.0);
    }

    #[test]
    fn test_intensity_scale() {
        let sample = |intensity| HeatSample {
            lat: 0.0,
            lon: 0.0,
            intensity,
        };
        assert_eq!(intensity_scale(&[]), 1.0);
        assert_eq!(intensity_scale(&[sample(0.4), sample(0.8)]), 1.0);
        assert_eq!(intensity_scale(&[sample(12.0), sample(30.0)]), 30.0);
    }
}
