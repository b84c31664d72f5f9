//! Configuration file parsing and structures.
//!
//! timelight reads a single TOML file with three sections: logging, the bridge
//! to talk to, and the schedule to follow. The schedule is either one
//! transition driving both channels or an independent transition per channel.

use std::collections::HashMap;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use chrono::NaiveTime;
use serde::Deserialize;
use serde::Serialize;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::filter::Targets;

use crate::engine::EngineSettings;
use crate::engine::LinearTransition;
use crate::engine::MAX_BRIGHTNESS;
use crate::engine::MAX_MIREK;
use crate::engine::MIN_BRIGHTNESS;
use crate::engine::MIN_MIREK;
use crate::engine::Schedule;
use crate::engine::SmoothTransition;
use crate::engine::TargetState;
use crate::engine::TransitionSpec;
use crate::engine::minute_of_day;

/// Top-level configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    pub bridge: BridgeConfig,
    pub timelight: TimelightConfig,
}

#[derive(
    Debug,
    Default,
    Deserialize,
    Serialize,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default)]
    pub level: LogLevel,

    /// Per-target levels, keyed by module path (e.g. "timelight::integrations::hue")
    #[serde(default)]
    pub overrides: HashMap<String, LogLevel>,
}

impl LoggingConfig {
    /// Build the subscriber filter. `level` replaces the configured default
    /// level when given; overrides always apply.
    pub fn filter(&self, level: Option<LogLevel>) -> Targets {
        Targets::new()
            .with_default(level.unwrap_or(self.level))
            .with_targets(self.overrides.iter().map(|(t, l)| (t.clone(), *l)))
    }
}

/// Hue bridge connection
#[derive(Debug, Deserialize)]
pub struct BridgeConfig {
    /// Bridge host, or a full base URL such as "https://10.0.0.2:8443"
    pub addr: String,

    /// Application key issued by the bridge. Older setups call it "username".
    #[serde(alias = "username")]
    pub app_key: String,

    /// Seconds to wait before reconnecting the event stream
    #[serde(default = "default_retry_delay_secs")]
    pub event_retry_delay_secs: u64,
}

fn default_retry_delay_secs() -> u64 {
    2
}

impl BridgeConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.event_retry_delay_secs)
    }
}

/// Engine timing and schedule
#[derive(Debug, Deserialize)]
pub struct TimelightConfig {
    #[serde(default = "default_update_interval_secs")]
    pub update_interval_secs: u64,

    #[serde(default = "default_transition_duration_ms")]
    pub transition_duration_ms: u64,

    /// One transition for both channels
    #[serde(default)]
    pub schedule: Option<ScheduleConfig>,

    /// Per-channel transitions, used instead of `schedule`
    #[serde(default)]
    pub brightness: Option<ChannelConfig>,
    #[serde(default)]
    pub color_temp: Option<ChannelConfig>,
}

fn default_update_interval_secs() -> u64 {
    60
}

fn default_transition_duration_ms() -> u64 {
    10_000
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Curve {
    Linear,
    #[default]
    Smooth,
}

#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq)]
pub struct StateConfig {
    #[serde(default)]
    pub brightness: Option<f64>,
    #[serde(default)]
    pub color_temp_mirek: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ScheduleConfig {
    #[serde(default)]
    pub curve: Curve,
    pub start_time: String,
    /// Smooth curves hold the start state until this time. Defaults to
    /// `start_time`; ignored by linear curves.
    #[serde(default)]
    pub transition_time: Option<String>,
    pub end_time: String,
    pub start: StateConfig,
    pub end: StateConfig,
}

#[derive(Debug, Deserialize)]
pub struct ChannelConfig {
    #[serde(default)]
    pub curve: Curve,
    pub start_time: String,
    #[serde(default)]
    pub transition_time: Option<String>,
    pub end_time: String,
    pub start_value: f64,
    pub end_value: f64,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(path.as_ref().to_path_buf(), e))?;

        let config: Config = toml::from_str(&contents)?;
        config.timelight.validate()?;
        Ok(config)
    }
}

impl TimelightConfig {
    pub fn settings(&self) -> EngineSettings {
        EngineSettings {
            update_interval: Duration::from_secs(self.update_interval_secs),
            transition_duration: Duration::from_millis(self.transition_duration_ms),
        }
    }

    /// Check everything the engine relies on: a non-zero update interval and
    /// a buildable schedule.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.update_interval_secs == 0 {
            return Err(ConfigError::ZeroUpdateInterval);
        }
        self.schedule()?;
        Ok(())
    }

    /// Build the validated schedule.
    pub fn schedule(&self) -> Result<Schedule, ConfigError> {
        let per_channel = self.brightness.is_some() || self.color_temp.is_some();
        match (&self.schedule, per_channel) {
            (Some(_), true) => Err(ConfigError::ConflictingSchedule),
            (None, false) => Err(ConfigError::MissingSchedule),
            (Some(schedule), false) => {
                let window = Window::parse(
                    "timelight.schedule",
                    &schedule.start_time,
                    schedule.transition_time.as_deref(),
                    &schedule.end_time,
                )?;
                Ok(Schedule::Uniform(window.transition(
                    schedule.curve,
                    schedule.start.target("timelight.schedule.start")?,
                    schedule.end.target("timelight.schedule.end")?,
                )))
            }
            (None, true) => {
                let brightness = channel(
                    "timelight.brightness",
                    self.brightness.as_ref(),
                    |v| TargetState::default().with_brightness(clamp_brightness(v)),
                )?;
                let color_temp = channel(
                    "timelight.color_temp",
                    self.color_temp.as_ref(),
                    |v| TargetState::default().with_color_temp(clamp_mirek(v)),
                )?;
                Ok(Schedule::PerChannel {
                    brightness,
                    color_temp,
                })
            }
        }
    }
}

impl StateConfig {
    /// The clamped target state. `section` names this table in errors.
    pub fn target(&self, section: &str) -> Result<TargetState, ConfigError> {
        let brightness = self
            .brightness
            .map(|v| finite(section, "brightness", v))
            .transpose()?;
        let mirek = self
            .color_temp_mirek
            .map(|v| finite(section, "color_temp_mirek", v))
            .transpose()?;
        Ok(TargetState {
            brightness: brightness.map(clamp_brightness),
            color_temp_mirek: mirek.map(clamp_mirek),
        })
    }
}

fn finite(section: &str, field: &str, value: f64) -> Result<f64, ConfigError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(ConfigError::InvalidValue {
            field: format!("{}.{}", section, field),
            value,
        })
    }
}

fn clamp_brightness(value: f64) -> f64 {
    value.clamp(MIN_BRIGHTNESS, MAX_BRIGHTNESS)
}

fn clamp_mirek(value: f64) -> u16 {
    value.round().clamp(f64::from(MIN_MIREK), f64::from(MAX_MIREK)) as u16
}

// A missing channel has no goal and never produces a value.
fn channel(
    section: &'static str,
    config: Option<&ChannelConfig>,
    state: impl Fn(f64) -> TargetState,
) -> Result<TransitionSpec, ConfigError> {
    let Some(config) = config else {
        return Ok(TransitionSpec::Linear(LinearTransition {
            start_minute: 0,
            end_minute: 0,
            start: TargetState::default(),
            end: TargetState::default(),
        }));
    };

    let window = Window::parse(
        section,
        &config.start_time,
        config.transition_time.as_deref(),
        &config.end_time,
    )?;
    let start = finite(section, "start_value", config.start_value)?;
    let end = finite(section, "end_value", config.end_value)?;
    Ok(window.transition(config.curve, state(start), state(end)))
}

struct Window {
    start: u32,
    transition: u32,
    end: u32,
}

impl Window {
    fn parse(
        section: &'static str,
        start: &str,
        transition: Option<&str>,
        end: &str,
    ) -> Result<Self, ConfigError> {
        let start = parse_time(section, "start_time", start)?;
        let transition = match transition {
            Some(t) => parse_time(section, "transition_time", t)?,
            None => start,
        };
        let end = parse_time(section, "end_time", end)?;

        if !(start <= transition && transition <= end) {
            return Err(ConfigError::InvalidWindow { section });
        }

        Ok(Self {
            start,
            transition,
            end,
        })
    }

    fn transition(&self, curve: Curve, start: TargetState, end: TargetState) -> TransitionSpec {
        match curve {
            Curve::Linear => TransitionSpec::Linear(LinearTransition {
                start_minute: self.start,
                end_minute: self.end,
                start,
                end,
            }),
            Curve::Smooth => TransitionSpec::Smooth(SmoothTransition {
                start_minute: self.start,
                transition_minute: self.transition,
                end_minute: self.end,
                start,
                end,
            }),
        }
    }
}

fn parse_time(section: &'static str, field: &'static str, value: &str) -> Result<u32, ConfigError> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map(minute_of_day)
        .map_err(|_| ConfigError::InvalidTime {
            field: format!("{}.{}", section, field),
            value: value.to_string(),
        })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {0}: {1}")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid time for {field}: {value:?} (expected HH:MM)")]
    InvalidTime { field: String, value: String },

    #[error("Invalid value for {field}: {value} (expected a finite number)")]
    InvalidValue { field: String, value: f64 },

    #[error("Times in {section} must satisfy start_time <= transition_time <= end_time")]
    InvalidWindow { section: &'static str },

    #[error("timelight.schedule cannot be combined with per-channel sections")]
    ConflictingSchedule,

    #[error("No schedule configured: set timelight.schedule or per-channel sections")]
    MissingSchedule,

    #[error("timelight.update_interval_secs must be at least 1")]
    ZeroUpdateInterval,
}
