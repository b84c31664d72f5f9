pub mod config;
mod engine;
pub mod integrations;

pub use config::Config;
pub use config::ConfigError;
pub use config::LogLevel;
pub use engine::BRIGHTNESS_TOLERANCE;
pub use engine::Bridge;
pub use engine::Capabilities;
pub use engine::DEFAULT_TRANSITION_DURATION;
pub use engine::DEFAULT_UPDATE_INTERVAL;
pub use engine::DetectorOutcome;
pub use engine::DispatchReport;
pub use engine::Engine;
pub use engine::EngineSettings;
pub use engine::LinearTransition;
pub use engine::MIREK_TOLERANCE;
pub use engine::Registry;
pub use engine::SCENE_NAME_MARKER;
pub use engine::Schedule;
pub use engine::SmoothTransition;
pub use engine::TargetState;
pub use engine::TickReport;
pub use engine::TrackedLight;
pub use engine::TrackedScene;
pub use engine::TransitionSpec;
