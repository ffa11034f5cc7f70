//! Payload types returned by the sensor backend.
//!
//! These types match the JSON produced by the backend's `/api/*` endpoints.
//! The client never validates them beyond what deserialization requires;
//! every metric is optional because nodes routinely omit sensors.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::data::Metric;

/// One timestamped multi-metric sample from a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub node_id: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub temperature: Option<f64>,
    pub relative_humidity: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub lux: Option<f64>,
    pub voltage: Option<f64>,
}

impl Reading {
    pub fn metric(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Temperature => self.temperature,
            Metric::Humidity => self.relative_humidity,
            Metric::SoilMoisture => self.soil_moisture,
            Metric::Lux => self.lux,
            Metric::Voltage => self.voltage,
        }
    }
}

/// Per-node aggregate over the backend's stats window, recomputed each fetch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeSummary {
    pub node_id: String,
    #[serde(with = "timestamp")]
    pub last_seen: DateTime<Utc>,
    pub reading_count: u64,
    pub avg_temp: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub avg_soil_moisture: Option<f64>,
    pub avg_lux: Option<f64>,
    pub avg_voltage: Option<f64>,
}

/// A rule or model verdict for one reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub node_id: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub decision: String,
    pub action: DecisionAction,
    /// In `0.0..=1.0`.
    pub confidence: f64,
    /// Readings the verdict was based on, when the backend includes them.
    #[serde(default)]
    pub metrics: Option<DecisionMetrics>,
}

/// Action tag attached to a decision: `"none"` or `"<action>_<qualifier>"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DecisionAction(pub String);

impl DecisionAction {
    pub fn is_none(&self) -> bool {
        self.0 == "none"
    }

    /// Split into `(action, qualifier)`, e.g. `"water_needed"` -> `("water", "needed")`.
    ///
    /// Returns `None` for the `"none"` action and for tags without a qualifier.
    pub fn parts(&self) -> Option<(&str, &str)> {
        if self.is_none() {
            return None;
        }
        self.0.split_once('_')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionMetrics {
    pub soil_moisture: Option<f64>,
    pub temperature: Option<f64>,
    pub voltage: Option<f64>,
}

/// A node's map position, merged by the backend with its latest aggregates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeLocation {
    pub node_id: String,
    pub name: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub avg_temp: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub avg_soil_moisture: Option<f64>,
    pub avg_lux: Option<f64>,
    pub avg_voltage: Option<f64>,
    pub reading_count: Option<u64>,
    #[serde(default, with = "timestamp::optional")]
    pub last_seen: Option<DateTime<Utc>>,
}

impl NodeLocation {
    /// The location's average for `metric`, if the backend had one.
    pub fn average(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Temperature => self.avg_temp,
            Metric::Humidity => self.avg_humidity,
            Metric::SoilMoisture => self.avg_soil_moisture,
            Metric::Lux => self.avg_lux,
            Metric::Voltage => self.avg_voltage,
        }
    }
}

/// One row per (node, time bucket) as aggregated by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeSeriesPoint {
    pub node_id: String,
    #[serde(with = "timestamp")]
    pub timestamp: DateTime<Utc>,
    pub avg_temp: Option<f64>,
    pub avg_humidity: Option<f64>,
    pub avg_soil_moisture: Option<f64>,
    pub avg_lux: Option<f64>,
    pub avg_voltage: Option<f64>,
    pub max_temp: Option<f64>,
    pub min_temp: Option<f64>,
}

impl TimeSeriesPoint {
    pub fn average(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Temperature => self.avg_temp,
            Metric::Humidity => self.avg_humidity,
            Metric::SoilMoisture => self.avg_soil_moisture,
            Metric::Lux => self.avg_lux,
            Metric::Voltage => self.avg_voltage,
        }
    }
}

/// Response of `/api/health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendHealth {
    pub status: String,
    pub timestamp: String,
}

/// Opaque CSV body returned by the export endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsvExport {
    pub bytes: Vec<u8>,
    /// Suggested file name, derived from the current date.
    pub filename: String,
}

impl CsvExport {
    /// Write the payload into `dir` under its suggested file name.
    pub fn save_in(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(&self.filename);
        self.save_as(&path)?;
        Ok(path)
    }

    pub fn save_as(&self, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, &self.bytes)
    }
}

/// Backend timestamps: RFC 3339, or naive ISO-8601 which is taken as UTC.
pub(crate) mod timestamp {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}")))
    }

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true))
    }

    pub mod optional {
        use super::*;

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
        where
            D: Deserializer<'de>,
        {
            match Option::<String>::deserialize(deserializer)? {
                Some(raw) => parse(&raw)
                    .map(Some)
                    .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw}"))),
                None => Ok(None),
            }
        }

        pub fn serialize<S>(ts: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match ts {
                Some(ts) => super::serialize(ts, serializer),
                None => serializer.serialize_none(),
            }
        }
    }
}
