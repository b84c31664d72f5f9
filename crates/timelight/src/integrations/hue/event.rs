use chrono::DateTime;
use chrono::Utc;
use serde::Deserialize;
use tracing::debug;
use tracing::warn;

use super::resource::Resource;
use super::resource::ResourceType;

/// A decoded bridge event.
#[derive(Debug, Clone)]
pub struct Event {
    /// The bridge's event UUID.
    pub id: String,
    /// The SSE delivery id this event arrived under.
    pub last_event_id: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
    pub event_type: String,
    pub data: Vec<Resource>,
}

/// Predicate deciding which decoded events are forwarded to the engine.
pub type EventFilter = fn(&Event) -> bool;

#[derive(Debug, Deserialize)]
struct RawEvent {
    id: String,
    #[serde(default, rename = "creationtime")]
    creation_time: Option<DateTime<Utc>>,
    #[serde(rename = "type")]
    event_type: String,
    #[serde(default)]
    data: Vec<serde_json::Value>,
}

impl Event {
    pub const UPDATE: &'static str = "update";

    pub fn is_update(&self) -> bool {
        self.event_type == Self::UPDATE
    }

    /// Decode the JSON array carried in one SSE `data` field.
    ///
    /// Malformed events and resources are logged and dropped; the rest of the
    /// batch is still returned. Only a payload that is not a JSON array at all
    /// is an error.
    pub fn decode_batch(
        payload: &str,
        last_event_id: Option<&str>,
    ) -> Result<Vec<Event>, serde_json::Error> {
        let raw_events: Vec<serde_json::Value> = serde_json::from_str(payload)?;

        let mut events = Vec::with_capacity(raw_events.len());
        for raw in raw_events {
            let raw: RawEvent = match serde_json::from_value(raw) {
                Ok(raw) => raw,
                Err(e) => {
                    warn!("Dropping malformed event: {}", e);
                    continue;
                }
            };

            let mut data = Vec::with_capacity(raw.data.len());
            for value in raw.data {
                match Resource::decode(value) {
                    Ok(Resource::Unrecognized { rtype }) => {
                        debug!("Unknown resource type {} in event {}", rtype, raw.id);
                        data.push(Resource::Unrecognized { rtype });
                    }
                    Ok(resource) => data.push(resource),
                    Err(e) => warn!("Dropping resource in event {}: {}", raw.id, e),
                }
            }

            events.push(Event {
                id: raw.id,
                last_event_id: last_event_id.map(str::to_string),
                creation_time: raw.creation_time,
                event_type: raw.event_type,
                data,
            });
        }

        Ok(events)
    }
}

/// Forward only update events that mention a light or a scene.
pub fn update_filter(event: &Event) -> bool {
    event.is_update()
        && event.data.iter().any(|r| {
            matches!(
                r.resource_type(),
                ResourceType::Light | ResourceType::Scene
            )
        })
}
