//! Rolling feed of the most recent readings.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::source::Reading;

/// Maximum number of readings kept in the feed.
pub const FEED_CAPACITY: usize = 10;

/// How new readings reach the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MergePolicy {
    /// Each polled batch replaces the feed, unless its newest timestamp is
    /// the one already shown.
    #[default]
    Replace,
    /// Readings pushed by the stream are inserted at the front. Polled batches
    /// only seed the feed while it still shows the placeholder.
    Prepend,
}

/// Bounded, newest-first view of recent readings.
///
/// Neither policy deduplicates per node: replace compares only the newest
/// timestamp of the whole batch, and prepend inserts whatever it is given.
#[derive(Debug, Clone)]
pub struct LiveFeed {
    entries: VecDeque<Reading>,
    /// True until the first batch or reading arrives.
    placeholder: bool,
}

impl Default for LiveFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl LiveFeed {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(FEED_CAPACITY),
            placeholder: true,
        }
    }

    /// Apply a polled batch under `policy`.
    ///
    /// Returns `true` if the feed changed and needs re-rendering.
    pub fn apply_batch(&mut self, policy: MergePolicy, batch: Vec<Reading>) -> bool {
        match policy {
            MergePolicy::Replace => self.replace_on_change(batch),
            MergePolicy::Prepend if self.placeholder => self.replace_on_change(batch),
            MergePolicy::Prepend => false,
        }
    }

    /// Replace the feed with `batch` unless its newest reading is already shown.
    ///
    /// An empty batch clears the feed.
    pub fn replace_on_change(&mut self, mut batch: Vec<Reading>) -> bool {
        self.placeholder = false;
        if batch.is_empty() {
            self.entries.clear();
            return true;
        }

        // Stable, so equal timestamps keep the backend's order.
        batch.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        if self.newest_timestamp() == Some(batch[0].timestamp) {
            return false;
        }

        batch.truncate(FEED_CAPACITY);
        self.entries = batch.into();
        true
    }

    /// Insert a pushed reading at the front, evicting from the back.
    pub fn prepend(&mut self, reading: Reading) {
        self.placeholder = false;
        self.entries.push_front(reading);
        self.entries.truncate(FEED_CAPACITY);
    }

    pub fn newest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.entries.front().map(|r| r.timestamp)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reading> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether nothing has been received yet ("no data" placeholder).
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reading(node: &str, minute: u32) -> Reading {
        Reading {
            node_id: node.to_string(),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 10, minute, 0).unwrap(),
            temperature: Some(20.0 + minute as f64),
            relative_humidity: None,
            soil_moisture: None,
            lux: None,
            voltage: Some(3.7),
        }
    }

    fn batch(minutes: &[u32]) -> Vec<Reading> {
        minutes.iter().map(|m| reading("n1", *m)).collect()
    }

    #[test]
    fn test_new_feed_is_placeholder() {
        let feed = LiveFeed::new();
        assert!(feed.is_placeholder());
        assert!(feed.is_empty());
        assert!(feed.newest_timestamp().is_none());
    }

    #[test]
    fn test_replace_fills_empty_feed() {
        let mut feed = LiveFeed::new();
        assert!(feed.replace_on_change(batch(&[5, 4, 3])));
        assert_eq!(feed.len(), 3);
        assert!(!feed.is_placeholder());
        assert_eq!(feed.newest_timestamp(), Some(reading("n1", 5).timestamp));
    }

    #[test]
    fn test_replace_skips_unchanged_newest() {
        let mut feed = LiveFeed::new();
        feed.replace_on_change(batch(&[5, 4, 3]));

        // Same newest timestamp, different tail: still skipped.
        assert!(!feed.replace_on_change(batch(&[5, 2])));
        assert_eq!(feed.len(), 3);
        assert_eq!(feed.iter().last().unwrap().timestamp, reading("n1", 3).timestamp);
    }

    #[test]
    fn test_replace_on_newer_batch() {
        let mut feed = LiveFeed::new();
        feed.replace_on_change(batch(&[5, 4]));
        assert!(feed.replace_on_change(batch(&[6, 5, 4])));
        assert_eq!(feed.len(), 3);
        assert_eq!(feed.newest_timestamp(), Some(reading("n1", 6).timestamp));
    }

    #[test]
    fn test_empty_batch_clears() {
        let mut feed = LiveFeed::new();
        feed.replace_on_change(batch(&[5, 4]));
        assert!(feed.replace_on_change(Vec::new()));
        assert!(feed.is_empty());
        assert!(!feed.is_placeholder());

        // Clearing an already empty feed is still a clear.
        assert!(feed.replace_on_change(Vec::new()));
        assert!(feed.is_empty());
    }

    #[test]
    fn test_replace_caps_and_orders_newest_first() {
        let mut feed = LiveFeed::new();
        let minutes: Vec<u32> = (0..15).collect();
        feed.replace_on_change(batch(&minutes));

        assert_eq!(feed.len(), FEED_CAPACITY);
        let stamps: Vec<_> = feed.iter().map(|r| r.timestamp).collect();
        assert!(stamps.windows(2).all(|w| w[0] >= w[1]));
        assert_eq!(stamps[0], reading("n1", 14).timestamp);
    }

    #[test]
    fn test_prepend_caps_at_capacity() {
        let mut feed = LiveFeed::new();
        for minute in 0..12 {
            feed.prepend(reading("n1", minute));
        }
        assert_eq!(feed.len(), FEED_CAPACITY);
        assert_eq!(feed.newest_timestamp(), Some(reading("n1", 11).timestamp));
        assert_eq!(feed.iter().last().unwrap().timestamp, reading("n1", 2).timestamp);
    }

    #[test]
    fn test_prepend_clears_placeholder_and_keeps_duplicates() {
        let mut feed = LiveFeed::new();
        feed.prepend(reading("n1", 1));
        assert!(!feed.is_placeholder());

        feed.prepend(reading("n1", 1));
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn test_prepend_policy_only_seeds_placeholder() {
        let mut feed = LiveFeed::new();
        assert!(feed.apply_batch(MergePolicy::Prepend, batch(&[3, 2])));
        assert_eq!(feed.len(), 2);

        assert!(!feed.apply_batch(MergePolicy::Prepend, batch(&[9, 8])));
        assert_eq!(feed.newest_timestamp(), Some(reading("n1", 3).timestamp));
    }
}
