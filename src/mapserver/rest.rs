//! Map server REST catalog probes.

use reqwest::{Client, StatusCode};
use serde::Deserialize;

use crate::config::MapServerConfig;
use crate::error::{HarnessError, HarnessResult};

pub struct MapServerRest {
    client: Client,
    config: MapServerConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LayerInfo {
    pub name: String,
    #[serde(rename = "type", default)]
    pub layer_type: Option<String>,
    #[serde(rename = "defaultStyle", default)]
    pub default_style: Option<StyleRef>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StyleRef {
    pub name: String,
}

#[derive(Deserialize)]
struct LayerEnvelope {
    layer: LayerInfo,
}

impl MapServerRest {
    pub fn new(config: MapServerConfig) -> HarnessResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Fetch a layer's REST configuration. `None` means the catalog does not
    /// know the layer at all; any status besides 200 and 404 is an error.
    pub async fn get_layer(&self, name: &str) -> HarnessResult<Option<LayerInfo>> {
        let url = self.url(&format!("rest/layers/{}.json", name));
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {
                let envelope: LayerEnvelope = response.json().await?;
                Ok(Some(envelope.layer))
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(HarnessError::from_response(response).await),
        }
    }

    pub async fn layer_exists(&self, name: &str) -> HarnessResult<bool> {
        Ok(self.get_layer(name).await?.is_some())
    }
}
