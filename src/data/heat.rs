//! Map view models: node markers and heat samples.

use serde::{Deserialize, Serialize};

use super::Metric;
use crate::source::NodeLocation;

/// How a metric average becomes a heat intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatScale {
    /// The average itself.
    Raw,
    /// The average divided by [`Metric::heat_divisor`].
    #[default]
    Normalized,
}

impl HeatScale {
    pub fn apply(&self, metric: Metric, value: f64) -> f64 {
        match self {
            HeatScale::Raw => value,
            HeatScale::Normalized => value / metric.heat_divisor(),
        }
    }
}

/// A `(lat, lon, intensity)` tuple for the heat overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatSample {
    pub lat: f64,
    pub lon: f64,
    pub intensity: f64,
}

/// A node placed on the map.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Marker {
    pub node_id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// Build heat samples for `metric`.
///
/// Locations without coordinates, or without an average for the metric,
/// are skipped.
pub fn build(locations: &[NodeLocation], metric: Metric, scale: HeatScale) -> Vec<HeatSample> {
    locations
        .iter()
        .filter_map(|location| {
            let (lat, lon) = (location.lat?, location.lon?);
            let value = location.average(metric)?;
            Some(HeatSample {
                lat,
                lon,
                intensity: scale.apply(metric, value),
            })
        })
        .collect()
}

/// Markers for every location that has coordinates.
pub fn markers(locations: &[NodeLocation]) -> Vec<Marker> {
    locations
        .iter()
        .filter_map(|location| {
            Some(Marker {
                node_id: location.node_id.clone(),
                name: location.name.clone().unwrap_or_else(|| location.node_id.clone()),
                lat: location.lat?,
                lon: location.lon?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn location(node: &str, lat: Option<f64>, lon: Option<f64>, temp: Option<f64>) -> NodeLocation {
        NodeLocation {
            node_id: node.to_string(),
            name: None,
            lat,
            lon,
            avg_temp: temp,
            avg_humidity: None,
            avg_soil_moisture: None,
            avg_lux: None,
            avg_voltage: None,
            reading_count: None,
            last_seen: None,
        }
    }

    #[test]
    fn test_skips_incomplete_locations() {
        let locations = vec![
            location("full", Some(41.7), Some(-86.2), Some(25.0)),
            location("no-lat", None, Some(-86.2), Some(25.0)),
            location("no-lon", Some(41.7), None, Some(25.0)),
            location("no-temp", Some(41.7), Some(-86.2), None),
        ];

        let samples = build(&locations, Metric::Temperature, HeatScale::Raw);
        assert_eq!(
            samples,
            vec![HeatSample {
                lat: 41.7,
                lon: -86.2,
                intensity: 25.0
            }]
        );
    }

    #[test]
    fn test_normalized_scale_divides() {
        let locations = vec![location("a", Some(1.0), Some(2.0), Some(25.0))];
        let samples = build(&locations, Metric::Temperature, HeatScale::Normalized);
        assert!((samples[0].intensity - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_markers_fall_back_to_node_id() {
        let mut named = location("a", Some(1.0), Some(2.0), None);
        named.name = Some("Dev Node".to_string());
        let locations = vec![named, location("b", Some(3.0), Some(4.0), None), location("c", None, None, None)];

        let markers = markers(&locations);
        assert_eq!(markers.len(), 2);
        assert_eq!(markers[0].name, "Dev Node");
        assert_eq!(markers[1].name, "b");
    }
}
