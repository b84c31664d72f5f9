use std::time::Duration;

use chrono::Local;
use chrono::NaiveDateTime;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio::time::MissedTickBehavior;
use tracing::debug;
use tracing::info;
use tracing::warn;

use super::bridge::Bridge;
use super::detector;
use super::detector::DetectorOutcome;
use super::dispatch;
use super::dispatch::DispatchReport;
use super::registry::Registry;
use super::schedule::Schedule;
use crate::integrations::hue;

/// Default period between dispatch passes.
pub const DEFAULT_UPDATE_INTERVAL: Duration = Duration::from_secs(60);

/// Default transition duration attached to light commands.
pub const DEFAULT_TRANSITION_DURATION: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    pub update_interval: Duration,
    pub transition_duration: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            update_interval: DEFAULT_UPDATE_INTERVAL,
            transition_duration: DEFAULT_TRANSITION_DURATION,
        }
    }
}

/// Results of one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub lights: DispatchReport,
    pub scenes: DispatchReport,
}

/// timelight engine
///
/// Owns the registry and is its only writer. Bridge events and the periodic
/// ticker are both handled on the task running [`Engine::run`], so no locking
/// is needed.
pub struct Engine<B: Bridge> {
    bridge: B,
    schedule: Schedule,
    settings: EngineSettings,
    registry: Registry,
}

impl<B: Bridge> Engine<B> {
    pub fn new(
        bridge: B,
        schedule: Schedule,
        settings: EngineSettings,
        registry: Registry,
    ) -> Self {
        Self {
            bridge,
            schedule,
            settings,
            registry,
        }
    }

    /// Query the bridge for lights and scenes and build the engine. Fails if
    /// either query fails.
    pub async fn initialize(
        bridge: B,
        schedule: Schedule,
        settings: EngineSettings,
    ) -> anyhow::Result<Self> {
        let registry = Registry::load(&bridge).await?;
        Ok(Self::new(bridge, schedule, settings, registry))
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Compute the current target and push it to managed lights and tracked
    /// scenes.
    pub async fn reconcile(&mut self, now: NaiveDateTime) -> TickReport {
        let target = self.schedule.target_light_state(now.time());
        debug!("Target at {}: {}", now.time(), target);

        let lights = dispatch::update_lights(
            &self.bridge,
            &mut self.registry,
            target,
            self.settings.transition_duration,
            now,
        )
        .await;
        let scenes = dispatch::update_scenes(&self.bridge, &mut self.registry, target, now).await;

        TickReport { lights, scenes }
    }

    /// Feed one bridge event to the override detector.
    pub fn handle_event(&mut self, event: &hue::Event, now: NaiveDateTime) -> DetectorOutcome {
        debug!(
            "Handling event {} (last event id: {:?}, created: {:?})",
            event.id, event.last_event_id, event.creation_time
        );
        detector::handle_event(&mut self.registry, event, now)
    }

    /// Run the engine's main loop.
    ///
    /// Reconciles immediately, then on every tick of the update interval.
    /// Ticks missed while a pass is running are skipped rather than queued.
    /// Pending events are always handled before a due tick, so overrides
    /// reported during a pass take effect before the next one.
    pub async fn run(&mut self, mut events: mpsc::Receiver<hue::Event>) {
        info!(
            "Engine starting (update interval: {:?})",
            self.settings.update_interval
        );

        self.reconcile(now()).await;

        let mut period = self.settings.update_interval;
        if period.is_zero() {
            warn!(
                "Update interval must be non-zero, using {:?}",
                DEFAULT_UPDATE_INTERVAL
            );
            period = DEFAULT_UPDATE_INTERVAL;
        }
        let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let mut events_open = true;
        loop {
            tokio::select! {
                biased;

                event = events.recv(), if events_open => match event {
                    Some(event) => {
                        self.handle_event(&event, now());
                    }
                    None => {
                        warn!("Event channel closed, continuing on schedule only");
                        events_open = false;
                    }
                },
                _ = ticker.tick() => {
                    self.reconcile(now()).await;
                }
            }
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}
