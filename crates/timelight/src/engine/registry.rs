use std::collections::BTreeMap;

use anyhow::Context;
use tracing::info;

use super::bridge::Bridge;
use super::light::TrackedLight;
use super::scene::TrackedScene;
use super::scene::is_timelight_scene;
use crate::integrations::hue;

/// Every light and timelight scene the engine tracks, keyed by bridge id.
///
/// Built once at startup; fixtures added to or removed from the bridge later
/// are not picked up.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    pub(super) lights: BTreeMap<String, TrackedLight>,
    pub(super) scenes: BTreeMap<String, TrackedScene>,
}

impl Registry {
    /// Build from bridge query results. Lights go first since scenes resolve
    /// their members against them.
    pub fn build(lights: &[hue::Light], scenes: &[hue::Scene]) -> Self {
        let lights: BTreeMap<_, _> = lights
            .iter()
            .map(|l| (l.id.clone(), TrackedLight::from_resource(l)))
            .collect();
        info!("Initialized lights: {}", lights.len());

        let mut tracked_scenes = BTreeMap::new();
        for scene in scenes.iter().filter(|s| is_timelight_scene(s)) {
            let tracked = TrackedScene::from_resource(scene, &lights);
            info!(
                "Initialized scene '{}' with {} lights",
                tracked.name,
                tracked.lights.len()
            );
            tracked_scenes.insert(tracked.id.clone(), tracked);
        }
        info!("Initialized timelight scenes: {}", tracked_scenes.len());

        Self {
            lights,
            scenes: tracked_scenes,
        }
    }

    /// Query the bridge and build the registry. Any failure is fatal.
    pub async fn load<B: Bridge + ?Sized>(bridge: &B) -> anyhow::Result<Self> {
        let lights = bridge
            .get_lights()
            .await
            .context("Failed to query lights")?;
        let scenes = bridge
            .get_scenes()
            .await
            .context("Failed to query scenes")?;
        Ok(Self::build(&lights, &scenes))
    }

    pub fn light(&self, id: &str) -> Option<&TrackedLight> {
        self.lights.get(id)
    }

    pub fn scene(&self, id: &str) -> Option<&TrackedScene> {
        self.scenes.get(id)
    }

    pub fn lights(&self) -> impl Iterator<Item = &TrackedLight> {
        self.lights.values()
    }

    pub fn scenes(&self) -> impl Iterator<Item = &TrackedScene> {
        self.scenes.values()
    }

    pub fn managed_count(&self) -> usize {
        self.lights.values().filter(|l| l.managed).count()
    }
}
