mod bridge;
mod detector;
mod dispatch;
mod engine;
mod light;
mod registry;
mod scene;
mod schedule;
mod target;

#[cfg(test)]
mod tests;

pub use bridge::Bridge;
pub use detector::BRIGHTNESS_TOLERANCE;
pub use detector::DetectorOutcome;
pub use detector::MIREK_TOLERANCE;
pub use dispatch::DispatchReport;
pub use engine::DEFAULT_TRANSITION_DURATION;
pub use engine::DEFAULT_UPDATE_INTERVAL;
pub use engine::Engine;
pub use engine::EngineSettings;
pub use engine::TickReport;
pub use light::TrackedLight;
pub use registry::Registry;
pub use scene::SCENE_NAME_MARKER;
pub use scene::TrackedScene;
pub use schedule::LinearTransition;
pub use schedule::Schedule;
pub use schedule::SmoothTransition;
pub use schedule::TransitionSpec;
pub use schedule::minute_of_day;
pub use target::Capabilities;
pub use target::MAX_BRIGHTNESS;
pub use target::MAX_MIREK;
pub use target::MIN_BRIGHTNESS;
pub use target::MIN_MIREK;
pub use target::TargetState;
