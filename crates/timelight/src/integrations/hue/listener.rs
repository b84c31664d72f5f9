use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;
use tracing::error;
use tracing::info;
use tracing::warn;

use super::client::Client;
use super::event::Event;
use super::event::EventFilter;
use super::sse::SseEvent;
use super::sse::SseParser;

/// Capacity of the listener→engine channel. A full channel makes the listener
/// wait, which is the only backpressure on the stream.
pub const EVENT_CHANNEL_CAPACITY: usize = 8;

/// Fixed delay between reconnect attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, thiserror::Error)]
enum ListenError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("event receiver dropped")]
    ChannelClosed,
}

/// Reads the bridge event stream and forwards matching events to the engine,
/// reconnecting forever on failure.
pub struct EventListener {
    client: Client,
    filter: EventFilter,
    retry_delay: Duration,
    last_event_id: Option<String>,
}

impl EventListener {
    pub fn new(client: Client, filter: EventFilter, retry_delay: Duration) -> Self {
        Self {
            client,
            filter,
            retry_delay,
            last_event_id: None,
        }
    }

    /// Run the listener in a background task.
    pub fn spawn(self, out: mpsc::Sender<Event>) -> JoinHandle<()> {
        tokio::spawn(self.run(out))
    }

    /// Listen until the receiving side of `out` is dropped.
    pub async fn run(mut self, out: mpsc::Sender<Event>) {
        loop {
            match self.listen(&out).await {
                Ok(()) => warn!("Bridge closed the event stream"),
                Err(ListenError::ChannelClosed) => break,
                Err(e) => error!("Error while listening for events: {}", e),
            }
            if out.is_closed() {
                break;
            }

            warn!(
                "Reconnecting to event stream in {:?} (last event id: {:?})",
                self.retry_delay, self.last_event_id
            );
            tokio::time::sleep(self.retry_delay).await;
        }
        info!("Event receiver dropped, stopping listener");
    }

    async fn listen(&mut self, out: &mpsc::Sender<Event>) -> Result<(), ListenError> {
        let mut response = self
            .client
            .event_stream_request(self.last_event_id.as_deref())
            .send()
            .await?
            .error_for_status()?;

        info!("Listening for bridge events");

        let mut parser = SseParser::new();
        while let Some(chunk) = response.chunk().await? {
            for frame in parser.feed(&chunk) {
                if frame.id.is_some() {
                    self.last_event_id = frame.id.clone();
                }
                self.forward(frame, out).await?;
            }
        }
        Ok(())
    }

    async fn forward(&self, frame: SseEvent, out: &mpsc::Sender<Event>) -> Result<(), ListenError> {
        if frame.data.is_empty() {
            return Ok(());
        }

        let events = match Event::decode_batch(&frame.data, frame.id.as_deref()) {
            Ok(events) => events,
            Err(e) => {
                error!("Error while decoding event payload: {}", e);
                return Ok(());
            }
        };

        for event in events {
            if event.data.is_empty() || !(self.filter)(&event) {
                continue;
            }
            debug!(
                "Forwarding event {} ({} resources)",
                event.id,
                event.data.len()
            );
            out.send(event)
                .await
                .map_err(|_| ListenError::ChannelClosed)?;
        }
        Ok(())
    }
}
