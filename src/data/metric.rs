//! Sensor metrics shared by the chart, map and table views.

use serde::{Deserialize, Serialize};

/// One of the five quantities every sensor node reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    #[default]
    Temperature,
    Humidity,
    SoilMoisture,
    Lux,
    Voltage,
}

impl Metric {
    /// All metrics in display order.
    pub const ALL: [Metric; 5] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::SoilMoisture,
        Metric::Lux,
        Metric::Voltage,
    ];

    /// Cycle to the next metric.
    pub fn next(self) -> Self {
        match self {
            Metric::Temperature => Metric::Humidity,
            Metric::Humidity => Metric::SoilMoisture,
            Metric::SoilMoisture => Metric::Lux,
            Metric::Lux => Metric::Voltage,
            Metric::Voltage => Metric::Temperature,
        }
    }

    /// Returns the display label for this metric.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::Temperature => "Temperature",
            Metric::Humidity => "Humidity",
            Metric::SoilMoisture => "Soil moisture",
            Metric::Lux => "Light",
            Metric::Voltage => "Voltage",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Humidity | Metric::SoilMoisture => "%",
            Metric::Lux => "lx",
            Metric::Voltage => "V",
        }
    }

    /// Fixed divisor that maps a typical reading into roughly `0.0..=1.0`
    /// for the normalized heat scale.
    pub fn heat_divisor(&self) -> f64 {
        match self {
            Metric::Temperature => 50.0,
            Metric::Humidity | Metric::SoilMoisture => 100.0,
            Metric::Lux => 1000.0,
            Metric::Voltage => 5.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_cycles_through_all() {
        let mut metric = Metric::Temperature;
        for expected in Metric::ALL.iter().skip(1) {
            metric = metric.next();
            assert_eq!(metric, *expected);
        }
        assert_eq!(metric.next(), Metric::Temperature);
    }

    #[test]
    fn test_deserialize_snake_case() {
        let metric: Metric = serde_json::from_str("\"soil_moisture\"").unwrap();
        assert_eq!(metric, Metric::SoilMoisture);
    }
}
