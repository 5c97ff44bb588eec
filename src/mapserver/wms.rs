//! WMS GetCapabilities fetching and parsing.
//!
//! The harness only needs two things out of a capabilities document: which
//! layers the map server advertises, and the time positions configured on a
//! layer's time dimension. The parser reads both the 1.1.1 form
//! (`<Extent name="time">`) and the 1.3.0 form (`<Dimension name="time">`).

use quick_xml::Reader;
use quick_xml::events::Event;
use reqwest::Client;

use crate::config::MapServerConfig;
use crate::error::{HarnessError, HarnessResult};

pub struct WmsClient {
    client: Client,
    config: MapServerConfig,
}

impl WmsClient {
    pub fn new(config: MapServerConfig) -> HarnessResult<Self> {
        let client = Client::builder().build()?;
        Ok(Self { client, config })
    }

    /// Fetch and parse the capabilities document. When `type_name` is given
    /// as `workspace:layer`, the request goes to that layer's virtual
    /// service endpoint so the document only describes the one layer.
    pub async fn capabilities(&self, type_name: Option<&str>) -> HarnessResult<WmsCapabilities> {
        let base = self.config.base_url.trim_end_matches('/');
        let endpoint = match type_name {
            Some(type_name) => format!("{}/{}/wms", base, type_name.replace(':', "/")),
            None => format!("{}/wms", base),
        };
        let url = format!(
            "{}?service=WMS&version=1.1.1&request=GetCapabilities",
            endpoint
        );

        tracing::debug!("fetching capabilities from {}", url);
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(HarnessError::from_response(response).await);
        }

        WmsCapabilities::parse(&response.text().await?)
    }
}

#[derive(Debug, Clone)]
pub struct WmsLayer {
    pub name: String,
    pub title: Option<String>,
    /// Time dimension positions, kept verbatim. Interval notation such as
    /// `start/end/period` stays a single position.
    pub time_positions: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct WmsCapabilities {
    pub layers: Vec<WmsLayer>,
}

#[derive(Default)]
struct LayerBuilder {
    depth: usize,
    name: Option<String>,
    title: Option<String>,
    time_positions: Vec<String>,
}

enum Field {
    None,
    Name,
    Title,
    Time,
}

impl WmsCapabilities {
    pub fn parse(xml: &str) -> HarnessResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut layers = Vec::new();
        let mut stack: Vec<LayerBuilder> = Vec::new();
        let mut field = Field::None;
        let mut depth = 0usize;

        loop {
            match reader.read_event()? {
                Event::Start(element) => {
                    depth += 1;
                    field = Field::None;
                    match element.local_name().as_ref() {
                        b"Layer" => stack.push(LayerBuilder {
                            depth,
                            ..Default::default()
                        }),
                        // Name and Title only count as direct children of a
                        // Layer; a Style block nested inside carries its own.
                        b"Name" if direct_child(&stack, depth) => field = Field::Name,
                        b"Title" if direct_child(&stack, depth) => field = Field::Title,
                        b"Extent" | b"Dimension" if direct_child(&stack, depth) => {
                            if attribute_is(&element, "name", "time")? {
                                field = Field::Time;
                            }
                        }
                        _ => {}
                    }
                }
                Event::Text(text) => {
                    if let Some(current) = stack.last_mut() {
                        let text = text
                            .unescape()
                            .map_err(|e| HarnessError::Capabilities(e.to_string()))?;
                        match field {
                            Field::Name => current.name = Some(text.into_owned()),
                            Field::Title => current.title = Some(text.into_owned()),
                            Field::Time => current.time_positions = split_positions(&text),
                            Field::None => {}
                        }
                    }
                }
                Event::End(element) => {
                    if element.local_name().as_ref() == b"Layer" {
                        if let Some(done) = stack.pop() {
                            if let Some(name) = done.name {
                                layers.push(WmsLayer {
                                    name,
                                    title: done.title,
                                    time_positions: done.time_positions,
                                });
                            }
                        }
                    }
                    depth -= 1;
                    field = Field::None;
                }
                Event::Eof => break,
                _ => {}
            }
        }

        Ok(Self { layers })
    }

    /// Look up a layer, tolerating `workspace:name` prefixes on either side.
    pub fn layer(&self, name: &str) -> Option<&WmsLayer> {
        self.layers
            .iter()
            .find(|layer| layer.name == name || local_part(&layer.name) == local_part(name))
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|layer| layer.name.as_str()).collect()
    }
}

fn direct_child(stack: &[LayerBuilder], depth: usize) -> bool {
    stack.last().is_some_and(|layer| layer.depth == depth - 1)
}

fn attribute_is(
    element: &quick_xml::events::BytesStart<'_>,
    attribute: &str,
    expected: &str,
) -> HarnessResult<bool> {
    let value = element
        .try_get_attribute(attribute)
        .map_err(|e| HarnessError::Capabilities(e.to_string()))?
        .map(|attr| {
            attr.unescape_value()
                .map(|v| v.into_owned())
                .map_err(|e| HarnessError::Capabilities(e.to_string()))
        })
        .transpose()?;
    Ok(value.is_some_and(|v| v.eq_ignore_ascii_case(expected)))
}

fn split_positions(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|position| !position.is_empty())
        .map(str::to_string)
        .collect()
}

fn local_part(name: &str) -> &str {
    name.rsplit(':').next().unwrap_or(name)
}
