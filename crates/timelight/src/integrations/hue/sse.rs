//! Incremental parser for `text/event-stream` bodies.
//!
//! Chunks arrive at arbitrary byte boundaries; complete lines are consumed and
//! partial ones are held until the next chunk. A line or event payload longer
//! than [`MAX_LENGTH`] is dropped along with the rest of its event.

use tracing::warn;

/// Longest line, and longest event payload, held in memory.
pub const MAX_LENGTH: usize = 1 << 20;

/// One dispatched server-sent event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SseEvent {
    /// Last event id seen on the stream at dispatch time.
    pub id: Option<String>,
    pub event: Option<String>,
    pub data: String,
}

#[derive(Debug, Default)]
pub struct SseParser {
    buffer: Vec<u8>,
    last_event_id: Option<String>,
    event_type: Option<String>,
    data: String,
    /// Set after an overflow; lines are ignored until the next blank line.
    discarding: bool,
}

impl SseParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of the response body, returning every event completed by it.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buffer.extend_from_slice(chunk);

        let mut events = Vec::new();
        while let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }

            let line = String::from_utf8_lossy(&line);
            if let Some(event) = self.process_line(&line) {
                events.push(event);
            }
        }

        if self.buffer.len() > MAX_LENGTH {
            warn!("Dropping event stream line longer than {} bytes", MAX_LENGTH);
            self.buffer.clear();
            self.discard();
        }
        events
    }

    fn process_line(&mut self, line: &str) -> Option<SseEvent> {
        if self.discarding {
            if line.is_empty() {
                self.discarding = false;
            }
            return None;
        }
        if line.is_empty() {
            return self.dispatch();
        }
        if line.starts_with(':') {
            return None;
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "id" if !value.contains('\0') => self.last_event_id = Some(value.to_string()),
            "event" => self.event_type = Some(value.to_string()),
            "data" if self.data.len() + value.len() >= MAX_LENGTH => {
                warn!("Dropping event stream payload longer than {} bytes", MAX_LENGTH);
                self.discard();
            }
            "data" => {
                self.data.push_str(value);
                self.data.push('\n');
            }
            _ => {}
        }
        None
    }

    fn discard(&mut self) {
        self.data.clear();
        self.event_type = None;
        self.discarding = true;
    }

    fn dispatch(&mut self) -> Option<SseEvent> {
        let event = self.event_type.take();
        if self.data.is_empty() {
            return None;
        }

        let mut data = std::mem::take(&mut self.data);
        data.pop();

        Some(SseEvent {
            id: self.last_event_id.clone(),
            event,
            data,
        })
    }
}
