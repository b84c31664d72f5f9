use std::time::Duration;

use chrono::NaiveDateTime;

use super::target::Capabilities;
use super::target::TargetState;
use crate::integrations::hue;

/// A bridge light the engine knows about.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedLight {
    pub id: String,
    pub name: String,
    pub capabilities: Capabilities,

    /// Whether the engine is currently driving this light.
    pub managed: bool,

    /// Last state pushed to (or assumed on) the light, already restricted to
    /// its capabilities.
    pub last_commanded: TargetState,
    pub last_command_time: Option<NaiveDateTime>,
}

impl TrackedLight {
    /// Build from a full light resource. A capability exists when the bridge
    /// reports the matching sub-object, whatever its current value.
    pub fn from_resource(light: &hue::Light) -> Self {
        Self {
            id: light.id.clone(),
            name: light.name().to_string(),
            capabilities: Capabilities {
                brightness: light.dimming.is_some(),
                color_temperature: light.color_temperature.is_some(),
                color: light.color.is_some(),
            },
            managed: false,
            last_commanded: TargetState::default(),
            last_command_time: None,
        }
    }

    pub fn restrict(&self, target: TargetState) -> TargetState {
        target.restrict(self.capabilities)
    }

    /// The command needed to move this light to `target`, or `None` when it
    /// was last commanded to exactly that state.
    pub fn command_for(
        &self,
        target: TargetState,
        transition: Duration,
    ) -> Option<(TargetState, hue::LightUpdate)> {
        let target = self.restrict(target);
        if target == self.last_commanded {
            return None;
        }

        let update = hue::LightUpdate {
            on: None,
            dimming: target
                .brightness
                .map(|brightness| hue::DimmingUpdate { brightness }),
            color_temperature: target
                .color_temp_mirek
                .map(|mirek| hue::ColorTemperatureUpdate { mirek }),
            dynamics: Some(hue::Dynamics {
                duration: transition.as_millis() as u64,
            }),
        };
        Some((target, update))
    }

    /// Record a successful command.
    pub fn commanded(&mut self, target: TargetState, now: NaiveDateTime) {
        self.last_commanded = self.restrict(target);
        self.last_command_time = Some(now);
    }

    /// Take the light back under management, assuming it now shows `target`.
    pub fn adopt(&mut self, target: TargetState, now: NaiveDateTime) {
        self.managed = true;
        self.commanded(target, now);
    }

    pub fn release(&mut self) {
        self.managed = false;
    }
}
