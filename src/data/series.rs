//! Reshapes flat time-series rows into aligned per-node chart datasets.
//!
//! ## Precondition
//!
//! The x-axis labels are taken in first-occurrence order and never re-sorted,
//! so the chart reads chronologically only if the backend returns rows in
//! chronological order (it orders by bucket ascending).

use std::collections::HashMap;

use serde::Serialize;

use super::Metric;
use crate::source::TimeSeriesPoint;

/// Display colors assigned to nodes in order of first appearance.
pub const PALETTE: [&str; 8] = [
    "#3b82f6", "#ef4444", "#10b981", "#f59e0b", "#8b5cf6", "#ec4899", "#14b8a6", "#f97316",
];

/// Label format for the x-axis.
pub const LABEL_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One line on the chart: a single metric for a single node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dataset {
    pub label: String,
    pub node_id: String,
    pub metric: Metric,
    /// One slot per label; `None` is a gap, never a zero.
    pub data: Vec<Option<f64>>,
    pub color: &'static str,
}

/// Chart view model: shared labels plus aligned datasets.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartData {
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

impl ChartData {
    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

/// Aggregate `points` into one dataset per (node, metric) pair.
pub fn aggregate(points: &[TimeSeriesPoint], metrics: &[Metric]) -> ChartData {
    let mut labels: Vec<String> = Vec::new();
    let mut label_slots: HashMap<String, usize> = HashMap::new();
    // (node_id, [(label slot, point)]) in first-appearance order
    let mut partitions: Vec<(&str, Vec<(usize, &TimeSeriesPoint)>)> = Vec::new();
    let mut partition_index: HashMap<&str, usize> = HashMap::new();

    for point in points {
        let label = point.timestamp.format(LABEL_FORMAT).to_string();
        let slot = match label_slots.get(&label) {
            Some(slot) => *slot,
            None => {
                let slot = labels.len();
                label_slots.insert(label.clone(), slot);
                labels.push(label);
                slot
            }
        };

        let node = point.node_id.as_str();
        let index = *partition_index.entry(node).or_insert_with(|| {
            partitions.push((node, Vec::new()));
            partitions.len() - 1
        });
        partitions[index].1.push((slot, point));
    }

    let mut datasets = Vec::with_capacity(partitions.len() * metrics.len());
    for (order, (node, rows)) in partitions.iter().enumerate() {
        let color = PALETTE[order % PALETTE.len()];
        for metric in metrics {
            let mut data = vec![None; labels.len()];
            for (slot, point) in rows {
                if data[*slot].is_none() {
                    data[*slot] = point.average(*metric);
                }
            }

            let label = if metrics.len() == 1 {
                node.to_string()
            } else {
                format!("{} {}", node, metric.label())
            };
            datasets.push(Dataset {
                label,
                node_id: node.to_string(),
                metric: *metric,
                data,
                color,
            });
        }
    }

    ChartData { labels, datasets }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn point(node: &str, minute: u32, temp: Option<f64>) -> TimeSeriesPoint {
        TimeSeriesPoint {
            node_id: node.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 10, minute, 0).unwrap(),
            avg_temp: temp,
            avg_humidity: Some(50.0),
            avg_soil_moisture: None,
            avg_lux: None,
            avg_voltage: None,
            max_temp: None,
            min_temp: None,
        }
    }

    #[test]
    fn test_empty_input() {
        let chart = aggregate(&[], &[Metric::Temperature]);
        assert!(chart.is_empty());
        assert!(chart.labels.is_empty());
    }

    #[test]
    fn test_missing_points_are_gaps() {
        let points = vec![
            point("a", 0, Some(20.0)),
            point("b", 0, Some(18.0)),
            point("a", 5, Some(21.0)),
            point("b", 10, Some(19.0)),
        ];

        let chart = aggregate(&points, &[Metric::Temperature]);
        assert_eq!(
            chart.labels,
            vec!["2024-01-01 10:00", "2024-01-01 10:05", "2024-01-01 10:10"]
        );
        assert_eq!(chart.datasets[0].data, vec![Some(20.0), Some(21.0), None]);
        assert_eq!(chart.datasets[1].data, vec![Some(18.0), None, Some(19.0)]);
    }

    #[test]
    fn test_absent_metric_stays_absent() {
        let points = vec![point("a", 0, None), point("a", 5, Some(21.0))];
        let chart = aggregate(&points, &[Metric::Temperature, Metric::SoilMoisture]);

        assert_eq!(chart.datasets[0].data, vec![None, Some(21.0)]);
        assert_eq!(chart.datasets[1].data, vec![None, None]);
        assert_eq!(chart.datasets[1].label, "a Soil moisture");
    }

    #[test]
    fn test_labels_keep_first_occurrence_order() {
        let points = vec![point("a", 10, Some(1.0)), point("a", 0, Some(2.0))];
        let chart = aggregate(&points, &[Metric::Temperature]);
        assert_eq!(chart.labels, vec!["2024-01-01 10:10", "2024-01-01 10:00"]);
    }

    #[test]
    fn test_colors_follow_first_appearance() {
        let mut points = Vec::new();
        for i in 0..(PALETTE.len() + 1) {
            points.push(point(&format!("node-{i}"), 0, Some(1.0)));
        }

        let chart = aggregate(&points, &[Metric::Temperature]);
        assert_eq!(chart.datasets[0].color, PALETTE[0]);
        assert_eq!(chart.datasets[1].color, PALETTE[1]);
        assert_eq!(chart.datasets[PALETTE.len()].color, PALETTE[0]);
    }

    #[test]
    fn test_one_dataset_per_node_and_metric() {
        let points = vec![point("a", 0, Some(1.0)), point("b", 0, Some(2.0))];
        let chart = aggregate(&points, &[Metric::Temperature, Metric::Humidity]);

        assert_eq!(chart.datasets.len(), 4);
        assert_eq!(chart.datasets[0].color, chart.datasets[1].color);
        assert_eq!(chart.datasets[1].data, vec![Some(50.0)]);
    }
}
