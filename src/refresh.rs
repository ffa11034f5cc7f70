//! Periodic refresh timers and the single update queue they feed.
//!
//! Five interval tasks, one per polled resource, plus an optional task that
//! forwards push-stream events. Everything lands in one unbounded `mpsc`
//! queue that the [`Dashboard`](crate::Dashboard) drains serially, so view
//! state is only ever mutated from one place.
//!
//! Timers are never reset by stream traffic and there is no backoff: a
//! failed fetch simply waits for the next tick.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

use crate::source::{Decision, NodeLocation, NodeSummary, PushStream, Reading, StreamEvent, TimeSeriesPoint};

/// A polled backend resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Latest,
    Nodes,
    Decisions,
    Locations,
    TimeSeries,
}

impl Resource {
    pub const ALL: [Resource; 5] = [
        Resource::Latest,
        Resource::Nodes,
        Resource::Decisions,
        Resource::Locations,
        Resource::TimeSeries,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Resource::Latest => "latest",
            Resource::Nodes => "nodes",
            Resource::Decisions => "decisions",
            Resource::Locations => "locations",
            Resource::TimeSeries => "timeseries",
        }
    }
}

/// Refresh interval per resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cadences {
    pub latest: Duration,
    pub nodes: Duration,
    pub decisions: Duration,
    pub locations: Duration,
    pub time_series: Duration,
}

impl Default for Cadences {
    fn default() -> Self {
        Self {
            latest: Duration::from_secs(5),
            nodes: Duration::from_secs(10),
            decisions: Duration::from_secs(8),
            locations: Duration::from_secs(15),
            time_series: Duration::from_secs(30),
        }
    }
}

impl Cadences {
    pub fn for_resource(&self, resource: Resource) -> Duration {
        match resource {
            Resource::Latest => self.latest,
            Resource::Nodes => self.nodes,
            Resource::Decisions => self.decisions,
            Resource::Locations => self.locations,
            Resource::TimeSeries => self.time_series,
        }
    }
}

/// Which resources a stream message refetches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamRefresh {
    /// Time series only.
    Minimal,
    /// Time series, node stats and decisions.
    #[default]
    Rich,
}

impl StreamRefresh {
    pub fn resources(&self) -> &'static [Resource] {
        match self {
            StreamRefresh::Minimal => &[Resource::TimeSeries],
            StreamRefresh::Rich => &[Resource::TimeSeries, Resource::Nodes, Resource::Decisions],
        }
    }
}

/// A completed fetch. `None` means the request failed.
#[derive(Debug, Clone)]
pub enum Loaded {
    Latest(Option<Vec<Reading>>),
    Nodes(Option<Vec<NodeSummary>>),
    Decisions(Option<Vec<Decision>>),
    Locations(Option<Vec<NodeLocation>>),
    TimeSeries {
        /// Window generation the request was issued under.
        generation: u64,
        points: Option<Vec<TimeSeriesPoint>>,
    },
}

impl Loaded {
    pub fn resource(&self) -> Resource {
        match self {
            Loaded::Latest(_) => Resource::Latest,
            Loaded::Nodes(_) => Resource::Nodes,
            Loaded::Decisions(_) => Resource::Decisions,
            Loaded::Locations(_) => Resource::Locations,
            Loaded::TimeSeries { .. } => Resource::TimeSeries,
        }
    }
}

/// Everything that can arrive on the update queue.
#[derive(Debug)]
pub enum Event {
    Tick(Resource),
    Stream(StreamEvent),
    Loaded(Loaded),
    /// A CSV export finished: the saved path, or why it failed.
    Exported(Result<PathBuf, String>),
}

/// Owns the timer and stream-forwarding tasks.
#[derive(Debug)]
pub struct Scheduler {
    tasks: Vec<JoinHandle<()>>,
}

impl Scheduler {
    /// Start one interval task per resource and, if given, forward `stream`.
    ///
    /// The first tick of each timer fires one full period after start; the
    /// caller performs the initial load itself.
    pub fn start(cadences: &Cadences, stream: Option<PushStream>, tx: mpsc::UnboundedSender<Event>) -> Self {
        let mut tasks = Vec::with_capacity(Resource::ALL.len() + 1);

        for resource in Resource::ALL {
            let period = cadences.for_resource(resource);
            let tx = tx.clone();
            tasks.push(tokio::spawn(async move {
                let mut ticker = interval_at(Instant::now() + period, period);
                ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
                loop {
                    ticker.tick().await;
                    if tx.send(Event::Tick(resource)).is_err() {
                        break;
                    }
                }
            }));
        }

        if let Some(mut stream) = stream {
            debug!("Forwarding {}", stream.description());
            tasks.push(tokio::spawn(async move {
                while let Some(event) = stream.recv().await {
                    if tx.send(Event::Stream(event)).is_err() {
                        break;
                    }
                }
            }));
        }

        Self { tasks }
    }

    /// Stop all timers and the stream subscription.
    pub fn stop(&mut self) {
        for task in self.tasks.drain(..) {
            task.abort();
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ConnectionTracker;
    use std::io::Cursor;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_no_tick_at_start() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _scheduler = Scheduler::start(&Cadences::default(), None, tx);

        tokio::time::sleep(Duration::from_secs(4)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timers_tick_independently() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _scheduler = Scheduler::start(&Cadences::default(), None, tx);

        tokio::time::sleep(Duration::from_millis(10_500)).await;

        let mut ticks = Vec::new();
        while let Ok(Event::Tick(resource)) = rx.try_recv() {
            ticks.push(resource);
        }
        // latest at 5s and 10s, decisions at 8s, nodes at 10s
        assert_eq!(ticks.iter().filter(|r| **r == Resource::Latest).count(), 2);
        assert_eq!(ticks.iter().filter(|r| **r == Resource::Decisions).count(), 1);
        assert_eq!(ticks.iter().filter(|r| **r == Resource::Nodes).count(), 1);
        assert!(!ticks.contains(&Resource::Locations));
        assert!(!ticks.contains(&Resource::TimeSeries));
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_timers() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut scheduler = Scheduler::start(&Cadences::default(), None, tx);
        scheduler.stop();

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_stream_events_share_the_queue() {
        let tracker = Arc::new(ConnectionTracker::new());
        let stream = PushStream::spawn(Cursor::new(": ping\n"), "test", tracker);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let _scheduler = Scheduler::start(&Cadences::default(), Some(stream), tx);

        assert!(matches!(rx.recv().await, Some(Event::Stream(StreamEvent::Keepalive))));
        assert!(matches!(rx.recv().await, Some(Event::Stream(StreamEvent::Error(_)))));
    }

    #[test]
    fn test_stream_refresh_resources() {
        assert_eq!(StreamRefresh::Minimal.resources(), &[Resource::TimeSeries]);
        assert_eq!(StreamRefresh::default().resources().len(), 3);
    }
}
