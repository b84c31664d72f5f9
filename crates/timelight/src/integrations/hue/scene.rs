use serde::Deserialize;
use serde::Serialize;

use super::light::LightOn;
use super::light::Xy;
use super::resource::ResourceRef;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneMetadata {
    pub name: String,
}

/// Recall status of a scene. Its presence in an update event means the scene
/// was (re)applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_recall: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneAction {
    pub target: ResourceRef,
    pub action: Action,
}

/// Light settings applied to one scene target.
///
/// Fields we never touch (gradient, effects, ...) are carried through `extra`
/// so rewriting a scene does not drop them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Action {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on: Option<LightOn>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimming: Option<DimmingAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_temperature: Option<ColorTemperatureAction>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimmingAction {
    pub brightness: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorAction {
    pub xy: Xy,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorTemperatureAction {
    pub mirek: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_v1: Option<String>,
    #[serde(default)]
    pub actions: Vec<SceneAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SceneMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<ResourceRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SceneStatus>,
}

impl Scene {
    pub fn name(&self) -> &str {
        self.metadata.as_ref().map(|m| m.name.as_str()).unwrap_or("")
    }
}

/// Body of `PUT /resource/scene/{id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SceneUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<SceneAction>>,
}
