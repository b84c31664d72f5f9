use async_trait::async_trait;

use crate::integrations::hue;

/// Bridge operations the engine depends on.
///
/// Implemented by [`hue::Client`]; tests substitute a recording mock.
#[async_trait]
pub trait Bridge: Send + Sync {
    async fn get_lights(&self) -> Result<Vec<hue::Light>, hue::Error>;

    async fn get_scenes(&self) -> Result<Vec<hue::Scene>, hue::Error>;

    async fn update_light(&self, id: &str, update: &hue::LightUpdate) -> Result<(), hue::Error>;

    async fn update_scene(&self, id: &str, update: &hue::SceneUpdate) -> Result<(), hue::Error>;
}

#[async_trait]
impl Bridge for hue::Client {
    async fn get_lights(&self) -> Result<Vec<hue::Light>, hue::Error> {
        hue::Client::get_lights(self).await
    }

    async fn get_scenes(&self) -> Result<Vec<hue::Scene>, hue::Error> {
        hue::Client::get_scenes(self).await
    }

    async fn update_light(&self, id: &str, update: &hue::LightUpdate) -> Result<(), hue::Error> {
        hue::Client::update_light(self, id, update).await
    }

    async fn update_scene(&self, id: &str, update: &hue::SceneUpdate) -> Result<(), hue::Error> {
        hue::Client::update_scene(self, id, update).await
    }
}

#[cfg(test)]
pub use mock::MockBridge;
