use crate::error::{ViewerError, ViewerResult};
use crate::system::body::{BodyId, CelestialBody, MapLayers, StarId};
use serde::de::DeserializeOwned;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

/// A raster request against `/api/planet/{id}/map`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MapImage<'a> {
    pub body: BodyId,
    pub stretch: bool,
    pub layer: Option<&'a str>,
    pub width: Option<u32>,
}

impl<'a> MapImage<'a> {
    pub fn flat(body: BodyId) -> Self {
        Self {
            body,
            stretch: false,
            layer: None,
            width: None,
        }
    }

    pub fn stretched(body: BodyId) -> Self {
        Self {
            stretch: true,
            ..Self::flat(body)
        }
    }

    pub fn layer(mut self, name: &'a str) -> Self {
        self.layer = Some(name);
        self
    }

    pub fn width(mut self, px: u32) -> Self {
        self.width = Some(px);
        self
    }

    pub fn path(&self) -> String {
        let mut query = Vec::new();
        if self.stretch {
            query.push("stretch=true".to_string());
        }
        if let Some(name) = self.layer {
            query.push(format!("name={}", name));
        }
        if let Some(px) = self.width {
            query.push(format!("width={}", px));
        }

        let mut path = format!("/api/planet/{}/map", self.body);
        if !query.is_empty() {
            path.push('?');
            path.push_str(&query.join("&"));
        }
        path
    }
}

pub fn planets_path(star: StarId) -> String {
    format!("/api/star/{}/planets", star)
}

pub fn maps_path(body: BodyId) -> String {
    format!("/api/planet/{}/maps", body)
}

pub fn icon_path(image: &str) -> String {
    format!("/icons/{}.png", image)
}

pub fn decode_json<T: DeserializeOwned>(url: &str, text: &str) -> ViewerResult<T> {
    serde_json::from_str(text).map_err(|source| ViewerError::Decode {
        url: url.to_string(),
        source,
    })
}

/// Read-only client for the system API.
#[derive(Clone, Debug, Default)]
pub struct DataService {
    base_url: String,
}

impl DataService {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn map_url(&self, image: &MapImage<'_>) -> String {
        self.url(&image.path())
    }

    pub fn icon_url(&self, image: &str) -> String {
        self.url(&icon_path(image))
    }

    pub async fn planets(&self, star: StarId) -> ViewerResult<Vec<CelestialBody>> {
        self.get_json(&planets_path(star)).await
    }

    pub async fn map_layers(&self, body: BodyId) -> ViewerResult<MapLayers> {
        let names: Vec<String> = self.get_json(&maps_path(body)).await?;
        Ok(MapLayers::new(names))
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> ViewerResult<T> {
        let url = self.url(path);
        log::debug!("GET {}", url);
        let text = fetch_text(&url).await?;
        decode_json(&url, &text)
    }
}

async fn fetch_text(url: &str) -> ViewerResult<String> {
    let network = |reason: String| ViewerError::Network {
        url: url.to_string(),
        reason,
    };
    let describe = |value: JsValue| value.as_string().unwrap_or_else(|| format!("{:?}", value));

    let window = web_sys::window().ok_or_else(|| network("no window".to_string()))?;
    let resp_val = JsFuture::from(window.fetch_with_str(url))
        .await
        .map_err(|e| network(describe(e)))?;
    let resp: web_sys::Response = resp_val.dyn_into().map_err(|e| network(describe(e)))?;

    if !resp.ok() {
        return Err(network(format!("HTTP {} {}", resp.status(), resp.status_text())));
    }

    let text_promise = resp.text().map_err(|e| network(describe(e)))?;
    let text_val = JsFuture::from(text_promise)
        .await
        .map_err(|e| network(describe(e)))?;
    text_val
        .as_string()
        .ok_or_else(|| network("response body was not text".to_string()))
}
