//! Philips Hue bridge integration (CLIP v2 API).
//!
//! This module holds the resource schemas the bridge speaks, the HTTPS client used
//! for queries and commands, and the server-sent event stream the bridge pushes
//! state changes over.

mod client;
mod event;
mod light;
mod listener;
mod resource;
mod scene;
mod sse;

pub use client::Client;
pub use client::Error;
pub use client::HueError;
pub use event::Event;
pub use event::EventFilter;
pub use event::update_filter;
pub use light::Color;
pub use light::ColorTemperature;
pub use light::ColorTemperatureUpdate;
pub use light::Dimming;
pub use light::DimmingUpdate;
pub use light::Dynamics;
pub use light::Light;
pub use light::LightMetadata;
pub use light::LightOn;
pub use light::LightUpdate;
pub use light::MirekSchema;
pub use light::Xy;
pub use listener::DEFAULT_RETRY_DELAY;
pub use listener::EVENT_CHANNEL_CAPACITY;
pub use listener::EventListener;
pub use resource::DecodeError;
pub use resource::Resource;
pub use resource::ResourceRef;
pub use resource::ResourceType;
pub use scene::Action;
pub use scene::ColorAction;
pub use scene::ColorTemperatureAction;
pub use scene::DimmingAction;
pub use scene::Scene;
pub use scene::SceneAction;
pub use scene::SceneMetadata;
pub use scene::SceneStatus;
pub use scene::SceneUpdate;
pub use sse::SseEvent;
pub use sse::SseParser;
