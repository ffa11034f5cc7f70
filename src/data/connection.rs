//! Connection state derived from fetch and push-stream outcomes.

use tokio::sync::watch;
use tracing::info;

/// Health indicator shown in the header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    Connected,
    #[default]
    Disconnected,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
        }
    }
}

/// Something that happened on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    FetchSucceeded,
    FetchFailed,
    /// Any stream traffic, including keepalives and unparseable payloads.
    StreamMessage,
    StreamError,
}

impl Outcome {
    fn state(self) -> ConnectionState {
        match self {
            Outcome::FetchSucceeded | Outcome::StreamMessage => ConnectionState::Connected,
            Outcome::FetchFailed | Outcome::StreamError => ConnectionState::Disconnected,
        }
    }
}

/// Two-state tracker; the state is always the one implied by the most
/// recent outcome.
///
/// Shared behind an `Arc` by the gateway and the stream task.
#[derive(Debug)]
pub struct ConnectionTracker {
    sender: watch::Sender<ConnectionState>,
}

impl Default for ConnectionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionTracker {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(ConnectionState::Disconnected);
        Self { sender }
    }

    /// Record an outcome and return the resulting state.
    pub fn observe(&self, outcome: Outcome) -> ConnectionState {
        let next = outcome.state();
        let previous = self.sender.send_replace(next);
        if previous != next {
            info!("Connection {} -> {} ({:?})", previous.label(), next.label(), outcome);
        }
        next
    }

    pub fn state(&self) -> ConnectionState {
        *self.sender.borrow()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_disconnected() {
        assert_eq!(ConnectionTracker::new().state(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_follows_most_recent_outcome() {
        let tracker = ConnectionTracker::new();
        let observed: Vec<_> = [Outcome::FetchFailed, Outcome::FetchSucceeded, Outcome::FetchFailed]
            .into_iter()
            .map(|o| tracker.observe(o))
            .collect();

        assert_eq!(
            observed,
            vec![
                ConnectionState::Disconnected,
                ConnectionState::Connected,
                ConnectionState::Disconnected
            ]
        );
    }

    #[test]
    fn test_stream_traffic_connects() {
        let tracker = ConnectionTracker::new();
        assert_eq!(tracker.observe(Outcome::StreamMessage), ConnectionState::Connected);
        assert_eq!(tracker.observe(Outcome::StreamError), ConnectionState::Disconnected);
    }
}
