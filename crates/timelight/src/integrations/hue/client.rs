use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use tracing::error;

use super::light::Light;
use super::light::LightUpdate;
use super::resource::ResourceRef;
use super::scene::Scene;
use super::scene::SceneUpdate;

const APP_KEY_HEADER: &str = "hue-application-key";
const EVENT_STREAM_PATH: &str = "/eventstream/clip/v2";
const RESOURCE_PATH: &str = "/clip/v2/resource";

/// An error entry from the bridge's `errors` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HueError {
    pub description: String,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to decode bridge response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Bridge reported errors: {}", join_descriptions(.0))]
    Bridge(Vec<HueError>),

    #[error("Bridge returned unexpected status {0}")]
    Status(u16),
}

fn join_descriptions(errors: &[HueError]) -> String {
    errors
        .iter()
        .map(|e| e.description.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Response envelope shared by every CLIP v2 resource endpoint.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    errors: Vec<HueError>,
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

/// HTTPS client for a single Hue bridge.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: String,
    app_key: String,
    http: reqwest::Client,
}

impl Client {
    /// Create a client for the bridge at `addr`.
    ///
    /// `addr` is normally a bare host (`192.168.1.10`), which is reached over
    /// HTTPS. An explicit scheme (`http://127.0.0.1:8080`) is used as given.
    pub fn new(addr: &str, app_key: &str) -> Result<Self, Error> {
        // Bridges serve a self-signed certificate.
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()?;

        let base_url = if addr.contains("://") {
            addr.trim_end_matches('/').to_string()
        } else {
            format!("https://{}", addr)
        };

        Ok(Self {
            base_url,
            app_key: app_key.to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resource_url(&self, endpoint: &str) -> String {
        format!("{}{}{}", self.base_url, RESOURCE_PATH, endpoint)
    }

    async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<Vec<T>, Error> {
        let request = self
            .http
            .get(self.resource_url(endpoint))
            .header(APP_KEY_HEADER, &self.app_key);
        Self::send(request).await
    }

    async fn put<B: Serialize>(&self, endpoint: &str, body: &B) -> Result<Vec<ResourceRef>, Error> {
        let request = self
            .http
            .put(self.resource_url(endpoint))
            .header(APP_KEY_HEADER, &self.app_key)
            .json(body);
        Self::send(request).await
    }

    async fn send<T: DeserializeOwned>(request: reqwest::RequestBuilder) -> Result<Vec<T>, Error> {
        let response = request.send().await?;
        let status = response.status();
        let url = response.url().to_string();
        let body = response.bytes().await?;

        debug!("Request complete: {} ({})", url, status);

        match serde_json::from_slice::<Envelope<T>>(&body) {
            Ok(envelope) if !envelope.errors.is_empty() => {
                let err = Error::Bridge(envelope.errors);
                error!("Request to {} failed: {}", url, err);
                Err(err)
            }
            Ok(envelope) if status.is_success() => Ok(envelope.data),
            Ok(_) => Err(Error::Status(status.as_u16())),
            Err(e) if status.is_success() => Err(Error::Decode(e)),
            Err(_) => Err(Error::Status(status.as_u16())),
        }
    }

    pub async fn get_lights(&self) -> Result<Vec<Light>, Error> {
        self.get("/light").await
    }

    pub async fn get_scenes(&self) -> Result<Vec<Scene>, Error> {
        self.get("/scene").await
    }

    pub async fn update_light(&self, id: &str, update: &LightUpdate) -> Result<(), Error> {
        self.put(&format!("/light/{}", id), update).await?;
        Ok(())
    }

    pub async fn update_scene(&self, id: &str, update: &SceneUpdate) -> Result<(), Error> {
        self.put(&format!("/scene/{}", id), update).await?;
        Ok(())
    }

    /// Build the long-lived event stream request, resuming after
    /// `last_event_id` when one is known.
    pub(super) fn event_stream_request(
        &self,
        last_event_id: Option<&str>,
    ) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .get(format!("{}{}", self.base_url, EVENT_STREAM_PATH))
            .header(APP_KEY_HEADER, &self.app_key)
            .header(reqwest::header::ACCEPT, "text/event-stream");
        if let Some(id) = last_event_id {
            request = request.header("Last-Event-ID", id);
        }
        request
    }
}
