//! Layered settings: defaults, optional TOML file, environment, CLI.
//!
//! ```toml
//! base_url = "http://sensors.local:5000"
//! latest_limit = 10
//! request_timeout = "10s"
//! stream_retry = "3s"
//! feed_policy = "replace"     # or "prepend"
//! stream_refresh = "rich"     # or "minimal"
//! heat_scale = "normalized"   # or "raw"
//! metric = "temperature"
//! window_hours = 24
//!
//! [cadence]
//! latest = "5s"
//! nodes = "10s"
//! decisions = "8s"
//! locations = "15s"
//! time_series = "30s"
//! ```
//!
//! Environment variables use the `MESHWATCH_` prefix with `__` between
//! nested keys, e.g. `MESHWATCH_CADENCE__LATEST=2s`.

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::dashboard::DashboardOptions;
use crate::data::duration::{parse_cadence, parse_duration};
use crate::data::window::MAX_WINDOW_HOURS;
use crate::data::{HeatScale, MergePolicy, Metric};
use crate::refresh::{Cadences, StreamRefresh};

/// Values given on the command line; they win over every other layer.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub base_url: Option<String>,
    pub window_hours: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CadenceSettings {
    pub latest: String,
    pub nodes: String,
    pub decisions: String,
    pub locations: String,
    pub time_series: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub latest_limit: usize,
    pub request_timeout: String,
    pub stream_retry: String,
    pub cadence: CadenceSettings,
    pub feed_policy: MergePolicy,
    pub stream_refresh: StreamRefresh,
    pub heat_scale: HeatScale,
    pub metric: Metric,
    pub window_hours: u32,
}

impl Settings {
    /// Load settings, reading `path` if given.
    ///
    /// A missing file is an error when it was asked for explicitly.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", "http://localhost:5000")?
            .set_default("latest_limit", 10)?
            .set_default("request_timeout", "10s")?
            .set_default("stream_retry", "3s")?
            .set_default("cadence.latest", "5s")?
            .set_default("cadence.nodes", "10s")?
            .set_default("cadence.decisions", "8s")?
            .set_default("cadence.locations", "15s")?
            .set_default("cadence.time_series", "30s")?
            .set_default("feed_policy", "replace")?
            .set_default("stream_refresh", "rich")?
            .set_default("heat_scale", "normalized")?
            .set_default("metric", "temperature")?
            .set_default("window_hours", 24)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix("MESHWATCH")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("base_url", overrides.base_url.clone())?
            .set_override_option("window_hours", overrides.window_hours.map(i64::from))?
            .build()
            .context("Failed to read configuration")?;

        let settings: Settings = config
            .try_deserialize()
            .context("Invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        self.cadences()?;
        self.request_timeout()?;
        self.stream_retry()?;
        if self.window_hours == 0 {
            anyhow::bail!("window_hours must be greater than zero");
        }
        if self.window_hours > MAX_WINDOW_HOURS {
            anyhow::bail!("window_hours must be at most {}", MAX_WINDOW_HOURS);
        }
        Ok(())
    }

    pub fn cadences(&self) -> Result<Cadences> {
        let parse = |name: &str, raw: &str| {
            parse_cadence(raw).with_context(|| format!("Invalid cadence.{}", name))
        };
        Ok(Cadences {
            latest: parse("latest", &self.cadence.latest)?,
            nodes: parse("nodes", &self.cadence.nodes)?,
            decisions: parse("decisions", &self.cadence.decisions)?,
            locations: parse("locations", &self.cadence.locations)?,
            time_series: parse("time_series", &self.cadence.time_series)?,
        })
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        parse_cadence(&self.request_timeout).context("Invalid request_timeout")
    }

    pub fn stream_retry(&self) -> Result<Duration> {
        parse_duration(&self.stream_retry).context("Invalid stream_retry")
    }

    pub fn dashboard_options(&self) -> DashboardOptions {
        DashboardOptions {
            latest_limit: self.latest_limit,
            feed_policy: self.feed_policy,
            stream_refresh: self.stream_refresh,
            heat_scale: self.heat_scale,
            metric: self.metric,
            window_hours: self.window_hours,
        }
    }
}
