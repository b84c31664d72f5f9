use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use strum::AsRefStr;
use strum::EnumString;

use super::light::Light;
use super::scene::Scene;

/// Resource type tags used by the bridge (`type` / `rtype` fields).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, AsRefStr, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ResourceType {
    Device,
    BridgeHome,
    Room,
    Zone,
    Light,
    Button,
    RelativeRotary,
    Temperature,
    LightLevel,
    Motion,
    Entertainment,
    GroupedLight,
    DevicePower,
    ZigbeeBridgeConnectivity,
    ZigbeeConnectivity,
    ZgpConnectivity,
    Bridge,
    ZigbeeDeviceDiscovery,
    Homekit,
    Matter,
    MatterFabric,
    Scene,
    EntertainmentConfiguration,
    PublicImage,
    AuthV1,
    BehaviorScript,
    BehaviorInstance,
    Geofence,
    GeofenceClient,
    Geolocation,
    SmartScene,
    /// Any tag this build does not know about yet.
    #[serde(other)]
    Unknown,
}

/// Reference to another resource, as found in scene action targets and owners.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceRef {
    #[serde(rename = "rid")]
    pub id: String,
    #[serde(rename = "rtype")]
    pub rtype: ResourceType,
}

/// A resource carried in an event's `data` list.
///
/// Only lights and scenes are modelled; everything else decodes to
/// `Unrecognized` with its raw tag so callers can log and skip it.
#[derive(Debug, Clone)]
pub enum Resource {
    Light(Light),
    Scene(Scene),
    Unrecognized { rtype: String },
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("resource is missing its type field")]
    MissingType,

    #[error("resource type field is not a string")]
    TypeNotString,

    #[error("failed to decode {rtype} resource: {source}")]
    Json {
        rtype: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Resource {
    /// Decode a single resource object, selecting the variant by its `type` tag
    /// before decoding the rest of the payload.
    pub fn decode(value: serde_json::Value) -> Result<Self, DecodeError> {
        let rtype = match value.get("type") {
            None => return Err(DecodeError::MissingType),
            Some(serde_json::Value::String(s)) => s.clone(),
            Some(_) => return Err(DecodeError::TypeNotString),
        };

        let json_err = |source| DecodeError::Json {
            rtype: rtype.clone(),
            source,
        };

        match ResourceType::from_str(&rtype) {
            Ok(ResourceType::Light) => serde_json::from_value(value)
                .map(Resource::Light)
                .map_err(json_err),
            Ok(ResourceType::Scene) => serde_json::from_value(value)
                .map(Resource::Scene)
                .map_err(json_err),
            _ => Ok(Resource::Unrecognized { rtype }),
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        match self {
            Resource::Light(_) => ResourceType::Light,
            Resource::Scene(_) => ResourceType::Scene,
            Resource::Unrecognized { rtype } => {
                ResourceType::from_str(rtype).unwrap_or(ResourceType::Unknown)
            }
        }
    }

    pub fn id(&self) -> Option<&str> {
        match self {
            Resource::Light(light) => Some(&light.id),
            Resource::Scene(scene) => Some(&scene.id),
            Resource::Unrecognized { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_resource_type_tags() {
        assert_eq!(ResourceType::GroupedLight.as_ref(), "grouped_light");
        assert_eq!(ResourceType::AuthV1.as_ref(), "auth_v1");
        assert_eq!(
            ResourceType::from_str("smart_scene").unwrap(),
            ResourceType::SmartScene
        );

        let rref: ResourceRef =
            serde_json::from_value(json!({"rid": "abc", "rtype": "light"})).unwrap();
        assert_eq!(rref.rtype, ResourceType::Light);

        let unknown: ResourceRef =
            serde_json::from_value(json!({"rid": "abc", "rtype": "contact"})).unwrap();
        assert_eq!(unknown.rtype, ResourceType::Unknown);
    }

    #[test]
    fn test_decode_light() {
        let resource = Resource::decode(json!({
            "id": "light-1",
            "type": "light",
            "dimming": {"brightness": 42.5}
        }))
        .unwrap();

        assert_eq!(resource.resource_type(), ResourceType::Light);
        assert_eq!(resource.id(), Some("light-1"));
        match resource {
            Resource::Light(light) => {
                assert_eq!(light.dimming.unwrap().brightness, 42.5);
                assert!(light.on.is_none());
            }
            other => panic!("expected light, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_unrecognized() {
        let resource = Resource::decode(json!({
            "id": "motion-1",
            "type": "motion",
            "motion": {"motion": true}
        }))
        .unwrap();
        assert_eq!(resource.resource_type(), ResourceType::Motion);
        assert!(resource.id().is_none());

        let resource = Resource::decode(json!({"id": "x", "type": "brand_new"})).unwrap();
        assert_eq!(resource.resource_type(), ResourceType::Unknown);
    }

    #[test]
    fn test_decode_errors() {
        assert!(matches!(
            Resource::decode(json!({"id": "x"})),
            Err(DecodeError::MissingType)
        ));
        assert!(matches!(
            Resource::decode(json!({"id": "x", "type": 7})),
            Err(DecodeError::TypeNotString)
        ));
        assert!(matches!(
            Resource::decode(json!({"type": "light", "dimming": "bright"})),
            Err(DecodeError::Json { .. })
        ));
    }
}
