//! Server-sent event subscription.
//!
//! Receives reading notifications from the backend's `/api/stream` endpoint.
//! Every payload, keepalive comment, and failure is reported to the
//! connection tracker before it is handed on.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::io::StreamReader;
use tracing::{debug, info, warn};

use super::{ApiGateway, Reading};
use crate::data::{ConnectionTracker, Outcome};

/// One thing that happened on the push stream.
#[derive(Debug, Clone, PartialEq)]
pub enum StreamEvent {
    /// A data event. `None` when the payload was not a reading; the event
    /// still counts as traffic.
    Message(Option<Reading>),
    /// A `:` comment line.
    Keepalive,
    /// The connection failed or was closed.
    Error(String),
}

impl StreamEvent {
    fn outcome(&self) -> Outcome {
        match self {
            StreamEvent::Message(_) | StreamEvent::Keepalive => Outcome::StreamMessage,
            StreamEvent::Error(_) => Outcome::StreamError,
        }
    }
}

/// Line-oriented decoder for the `text/event-stream` format.
///
/// Only `data:` fields and comments are interpreted; `event:`, `id:` and
/// `retry:` are ignored.
#[derive(Debug, Default)]
pub struct SseDecoder {
    data: Vec<String>,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one line (with or without its terminator).
    ///
    /// Returns an event when the line completes one.
    pub fn feed_line(&mut self, line: &str) -> Option<StreamEvent> {
        let line = line.trim_end_matches(['\r', '\n']);

        if line.is_empty() {
            if self.data.is_empty() {
                return None;
            }
            let payload = self.data.join("\n");
            self.data.clear();
            return Some(StreamEvent::Message(serde_json::from_str(&payload).ok()));
        }

        if line.starts_with(':') {
            return Some(StreamEvent::Keepalive);
        }

        if let Some(value) = line.strip_prefix("data:") {
            self.data.push(value.strip_prefix(' ').unwrap_or(value).to_string());
        }
        None
    }
}

/// Why a pump over one connection stopped.
enum PumpEnd {
    Closed(String),
    ReceiverGone,
}

/// Handle to a running stream subscription.
///
/// Events are buffered until read with [`recv`](Self::recv) or
/// [`poll`](Self::poll). Dropping the handle stops the background task.
#[derive(Debug)]
pub struct PushStream {
    receiver: mpsc::UnboundedReceiver<StreamEvent>,
    description: String,
    task: JoinHandle<()>,
}

impl PushStream {
    /// Spawn a background task that decodes events from `reader`.
    ///
    /// The task ends at EOF after emitting [`StreamEvent::Error`].
    pub fn spawn<R>(reader: R, description: &str, tracker: Arc<ConnectionTracker>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(async move {
            if let PumpEnd::Closed(reason) = pump(reader, &tracker, &tx).await {
                emit(&tracker, &tx, StreamEvent::Error(reason));
            }
        });

        Self {
            receiver: rx,
            description: format!("stream: {}", description),
            task,
        }
    }

    /// Subscribe to the gateway's event stream.
    ///
    /// When the connection fails or closes, an error event is emitted and the
    /// subscription is retried after `retry`, indefinitely.
    pub fn connect(gateway: &ApiGateway, retry: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let client = gateway.client().clone();
        let url = gateway.stream_url();
        let tracker = gateway.tracker().clone();
        let description = format!("stream: {}", url);

        let task = tokio::spawn(async move {
            loop {
                info!("Subscribing to {}", url);
                let reason = match client
                    .get(&url)
                    .header(reqwest::header::ACCEPT, "text/event-stream")
                    .send()
                    .await
                {
                    Ok(response) if response.status().is_success() => {
                        let bytes = Box::pin(
                            response
                                .bytes_stream()
                                .map(|chunk| chunk.map_err(std::io::Error::other)),
                        );
                        match pump(StreamReader::new(bytes), &tracker, &tx).await {
                            PumpEnd::Closed(reason) => reason,
                            PumpEnd::ReceiverGone => break,
                        }
                    }
                    Ok(response) => format!("Stream returned status {}", response.status().as_u16()),
                    Err(e) => format!("Stream request failed: {}", e),
                };

                warn!("Push stream lost: {}; retrying in {:?}", reason, retry);
                if !emit(&tracker, &tx, StreamEvent::Error(reason)) {
                    break;
                }
                tokio::time::sleep(retry).await;
            }
        });

        Self {
            receiver: rx,
            description,
            task,
        }
    }

    /// Wait for the next event. Returns `None` once the task has ended and
    /// all buffered events were read.
    pub async fn recv(&mut self) -> Option<StreamEvent> {
        self.receiver.recv().await
    }

    /// Take the next buffered event without waiting.
    pub fn poll(&mut self) -> Option<StreamEvent> {
        self.receiver.try_recv().ok()
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}

impl Drop for PushStream {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn pump<R>(
    reader: R,
    tracker: &ConnectionTracker,
    tx: &mpsc::UnboundedSender<StreamEvent>,
) -> PumpEnd
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut decoder = SseDecoder::new();
    let mut line = String::new();

    loop {
        line.clear();
        match reader.read_line(&mut line).await {
            Ok(0) => return PumpEnd::Closed("Connection closed".to_string()),
            Ok(_) => {
                if let Some(event) = decoder.feed_line(&line) {
                    debug!("Stream event: {:?}", event);
                    if !emit(tracker, tx, event) {
                        return PumpEnd::ReceiverGone;
                    }
                }
            }
            Err(e) => return PumpEnd::Closed(format!("Read error: {}", e)),
        }
    }
}

/// Report the event to the tracker, then forward it. Returns `false` if the
/// receiving side is gone.
fn emit(tracker: &ConnectionTracker, tx: &mpsc::UnboundedSender<StreamEvent>, event: StreamEvent) -> bool {
    tracker.observe(event.outcome());
    tx.send(event).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ConnectionState;
    use std::io::Cursor;
    use tokio::io::AsyncWriteExt;

    fn sample_event() -> &'static str {
        "data: {\"node_id\":\"n1\",\"timestamp\":\"2024-01-01T10:00:00\",\"temperature\":21.0,\
         \"relative_humidity\":null,\"soil_moisture\":null,\"lux\":null,\"voltage\":3.9}\n\n"
    }

    #[test]
    fn test_decoder_dispatches_on_blank_line() {
        let mut decoder = SseDecoder::new();
        assert!(decoder.feed_line("data: {\"status\": \"ok\"}\n").is_none());
        assert_eq!(decoder.feed_line("\n"), Some(StreamEvent::Message(None)));
        // A second blank line with no data is not an event
        assert!(decoder.feed_line("\r\n").is_none());
    }

    #[test]
    fn test_decoder_comment_is_keepalive() {
        let mut decoder = SseDecoder::new();
        assert_eq!(decoder.feed_line(": keepalive"), Some(StreamEvent::Keepalive));
    }

    #[test]
    fn test_decoder_joins_multiline_data() {
        let mut decoder = SseDecoder::new();
        decoder.feed_line("event: reading");
        decoder.feed_line("data: {\"node_id\":\"n1\",\"timestamp\":\"2024-01-01T10:00:00\",");
        decoder.feed_line("data: \"temperature\":20.5}");
        match decoder.feed_line("") {
            Some(StreamEvent::Message(Some(reading))) => {
                assert_eq!(reading.node_id, "n1");
                assert_eq!(reading.temperature, Some(20.5));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_stream_delivers_reading() {
        let tracker = Arc::new(ConnectionTracker::new());
        let mut stream = PushStream::spawn(Cursor::new(sample_event()), "test", tracker.clone());

        match stream.recv().await {
            Some(StreamEvent::Message(Some(reading))) => assert_eq!(reading.node_id, "n1"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(stream.recv().await, Some(StreamEvent::Error("Connection closed".to_string())));
        assert_eq!(tracker.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_unparseable_payload_still_connects() {
        let tracker = Arc::new(ConnectionTracker::new());
        // Keep the writer open so the stream does not hit EOF mid-test.
        let (mut writer, reader) = tokio::io::duplex(256);
        let mut stream = PushStream::spawn(reader, "test", tracker.clone());

        writer.write_all(b"data: not json\n\n").await.unwrap();
        assert_eq!(stream.recv().await, Some(StreamEvent::Message(None)));
        // The tracker was updated before the event was forwarded
        assert_eq!(tracker.state(), ConnectionState::Connected);

        drop(writer);
        assert_eq!(stream.recv().await, Some(StreamEvent::Error("Connection closed".to_string())));
        assert_eq!(tracker.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_keepalive_connects() {
        let tracker = Arc::new(ConnectionTracker::new());
        let (mut writer, reader) = tokio::io::duplex(64);
        let mut stream = PushStream::spawn(reader, "test", tracker.clone());

        writer.write_all(b": ping\n").await.unwrap();
        assert_eq!(stream.recv().await, Some(StreamEvent::Keepalive));
        assert_eq!(tracker.state(), ConnectionState::Connected);
        assert!(stream.poll().is_none());
    }

    #[tokio::test]
    async fn test_stream_description() {
        let tracker = Arc::new(ConnectionTracker::new());
        let stream = PushStream::spawn(Cursor::new(""), "http://localhost:5000/api/stream", tracker);
        assert_eq!(stream.description(), "stream: http://localhost:5000/api/stream");
    }
}
