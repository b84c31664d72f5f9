//! Manual override detection.
//!
//! Bridge events are compared against what the engine last commanded. A
//! managed light whose reported state drifts beyond tolerance was changed by
//! someone else and is released; a recalled timelight scene takes its lights
//! back.

use chrono::NaiveDateTime;
use tracing::debug;
use tracing::info;

use super::light::TrackedLight;
use super::registry::Registry;
use crate::integrations::hue;

/// Brightness units (0-100) a report may differ from the target by. The
/// bridge quantises dimming, so reports never match exactly.
pub const BRIGHTNESS_TOLERANCE: f64 = 2.0;

/// Mirek a report may differ from the target by.
pub const MIREK_TOLERANCE: f64 = 10.0;

/// What one event changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DetectorOutcome {
    /// Lights taken back under management by a scene recall.
    pub adopted: usize,
    /// Lights released after a manual change.
    pub released: usize,
}

/// Apply one bridge event to the registry. Never issues commands; changes
/// take effect on the next dispatch.
pub fn handle_event(
    registry: &mut Registry,
    event: &hue::Event,
    now: NaiveDateTime,
) -> DetectorOutcome {
    let mut outcome = DetectorOutcome::default();

    if !event.is_update() {
        debug!("Ignoring {} event {}", event.event_type, event.id);
        return outcome;
    }

    for resource in &event.data {
        match resource {
            hue::Resource::Scene(scene) => {
                outcome.adopted += handle_scene_update(registry, scene, now)
            }
            hue::Resource::Light(light) => {
                if handle_light_update(registry, light) {
                    outcome.released += 1;
                }
            }
            hue::Resource::Unrecognized { rtype } => {
                debug!("Unknown resource type {} in event {}", rtype, event.id)
            }
        }
    }

    outcome
}

fn handle_scene_update(registry: &mut Registry, update: &hue::Scene, now: NaiveDateTime) -> usize {
    let Some(scene) = registry.scenes.get(&update.id) else {
        return 0;
    };
    // Without a status we cannot tell a recall from an edit.
    if update.status.is_none() {
        return 0;
    }

    let target = scene.last_commanded.unwrap_or_default();
    let mut adopted = 0;
    for id in &scene.lights {
        if let Some(light) = registry.lights.get_mut(id) {
            light.adopt(target, now);
            adopted += 1;
        }
    }

    info!(
        "Timelight scene '{}' recalled, marked {} lights as managed",
        scene.name, adopted
    );
    adopted
}

fn handle_light_update(registry: &mut Registry, update: &hue::Light) -> bool {
    let Some(light) = registry.lights.get_mut(&update.id) else {
        return false;
    };
    if !light.managed {
        return false;
    }

    debug!("Checking for manual change on {}", light.name);
    if !light_changed(light, update) {
        return false;
    }

    info!(
        "Manual change detected on '{}' (target: {}, reported dimming: {:?}, reported temp: {:?})",
        light.name, light.last_commanded, update.dimming, update.color_temperature
    );
    light.release();
    true
}

/// Whether a reported light state differs from what was last commanded by
/// more than protocol noise.
pub fn light_changed(light: &TrackedLight, update: &hue::Light) -> bool {
    if update.id != light.id {
        return false;
    }

    if update.on.is_some_and(|on| !on.on) {
        return true;
    }

    let target = light.last_commanded;

    if let (true, Some(dimming), Some(brightness)) = (
        light.capabilities.brightness,
        &update.dimming,
        target.brightness,
    ) {
        if !within(dimming.brightness, brightness, BRIGHTNESS_TOLERANCE) {
            return true;
        }
    }

    if let (true, Some(temp), Some(mirek)) = (
        light.capabilities.color_temperature,
        &update.color_temperature,
        target.color_temp_mirek,
    ) {
        match temp.mirek {
            Some(reported) if temp.mirek_valid => {
                if !within(f64::from(reported), f64::from(mirek), MIREK_TOLERANCE) {
                    return true;
                }
            }
            _ => return true,
        }
    }

    false
}

fn within(a: f64, b: f64, eps: f64) -> bool {
    (a - b).abs() < eps
}
