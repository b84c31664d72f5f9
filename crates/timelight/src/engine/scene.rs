use std::collections::BTreeMap;
use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use tracing::warn;

use super::light::TrackedLight;
use super::target::TargetState;
use crate::integrations::hue;

/// Scenes whose name contains this (case-insensitively) are kept in step with
/// the schedule. Every other scene is left alone.
pub const SCENE_NAME_MARKER: &str = "timelight";

pub fn is_timelight_scene(scene: &hue::Scene) -> bool {
    scene.name().to_lowercase().contains(SCENE_NAME_MARKER)
}

/// A bridge scene the engine rewrites on every tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedScene {
    pub id: String,
    pub name: String,

    /// Tracked lights targeted by this scene's actions.
    pub lights: BTreeSet<String>,

    /// The scene's action list as last seen on (or pushed to) the bridge.
    pub actions: Vec<hue::SceneAction>,

    /// `None` until the first successful push.
    pub last_commanded: Option<TargetState>,
    pub last_update_time: Option<NaiveDateTime>,
}

impl TrackedScene {
    /// Build from a scene resource. Light targets that are not in `lights` are
    /// skipped with a warning.
    pub fn from_resource(scene: &hue::Scene, lights: &BTreeMap<String, TrackedLight>) -> Self {
        let mut members = BTreeSet::new();
        for action in &scene.actions {
            if action.target.rtype != hue::ResourceType::Light {
                continue;
            }
            if !lights.contains_key(&action.target.id) {
                warn!(
                    "Scene '{}' references unknown light {}",
                    scene.name(),
                    action.target.id
                );
                continue;
            }
            members.insert(action.target.id.clone());
        }

        Self {
            id: scene.id.clone(),
            name: scene.name().to_string(),
            lights: members,
            actions: scene.actions.clone(),
            last_commanded: None,
            last_update_time: None,
        }
    }

    /// Rewrite the action list so every member light is switched on at
    /// `target`, limited to what each light supports. Actions for anything
    /// else are kept untouched.
    pub fn rebuild_actions(
        &self,
        target: TargetState,
        lights: &BTreeMap<String, TrackedLight>,
    ) -> Vec<hue::SceneAction> {
        self.actions
            .iter()
            .map(|old| {
                let light = match lights.get(&old.target.id) {
                    Some(light)
                        if old.target.rtype == hue::ResourceType::Light
                            && self.lights.contains(&light.id) =>
                    {
                        light
                    }
                    _ => return old.clone(),
                };

                let target = light.restrict(target);
                let mut action = old.action.clone();
                action.on = Some(hue::LightOn { on: true });

                match target.brightness {
                    Some(brightness) => action.dimming = Some(hue::DimmingAction { brightness }),
                    None if !light.capabilities.brightness => action.dimming = None,
                    None => {}
                }

                match target.color_temp_mirek {
                    Some(mirek) => {
                        action.color_temperature = Some(hue::ColorTemperatureAction { mirek });
                        action.color = None;
                    }
                    None if !light.capabilities.color_temperature => {
                        action.color_temperature = None
                    }
                    None => {}
                }

                hue::SceneAction {
                    target: old.target.clone(),
                    action,
                }
            })
            .collect()
    }

    /// Record a successful push of `actions` built for `target`.
    pub fn updated(
        &mut self,
        target: TargetState,
        actions: Vec<hue::SceneAction>,
        now: NaiveDateTime,
    ) {
        self.actions = actions;
        self.last_commanded = Some(target);
        self.last_update_time = Some(now);
    }
}
