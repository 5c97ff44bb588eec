//! Composite post-upload verification.
//!
//! After the wizard reports success, a layer must be visible in three
//! places: the portal's own layer page, the map server's catalogs (REST and
//! the WMS capabilities document), and the portal's upload bookkeeping. The
//! capabilities check tolerates propagation lag with a bounded retry loop;
//! the REST catalog is authoritative and checked once.

use reqwest::{StatusCode, header};
use std::sync::Arc;
use tokio::time::sleep;

use crate::config::Timeouts;
use crate::db::PortalDatabase;
use crate::error::{HarnessError, HarnessResult};
use crate::mapserver::rest::{LayerInfo, MapServerRest};
use crate::mapserver::wms::WmsClient;
use crate::portal::session::PortalSession;

pub struct LayerVerifier {
    session: Arc<PortalSession>,
    rest: MapServerRest,
    wms: WmsClient,
    db: Option<PortalDatabase>,
    workspace: String,
    timeouts: Timeouts,
}

impl LayerVerifier {
    pub fn new(
        session: Arc<PortalSession>,
        rest: MapServerRest,
        wms: WmsClient,
        db: Option<PortalDatabase>,
        workspace: String,
    ) -> Self {
        let timeouts = session.timeouts().clone();
        Self {
            session,
            rest,
            wms,
            db,
            workspace,
            timeouts,
        }
    }

    /// Workspace-qualified name the map server knows a layer by.
    pub fn type_name(&self, layer_name: &str) -> String {
        format!("{}:{}", self.workspace, layer_name)
    }

    /// The layer page the final wizard step redirects to renders correctly.
    pub async fn check_layer_page(&self, path: &str) -> HarnessResult<()> {
        let response = self.session.get(path).await?;
        if response.status() != StatusCode::OK {
            return Err(HarnessError::from_response(response).await);
        }
        if response.headers().get(header::CONTENT_TYPE).is_none() {
            return Err(HarnessError::Upload(format!(
                "layer page {} has no content type",
                path
            )));
        }
        Ok(())
    }

    /// Wait for the layer to show up in the capabilities document. The map
    /// server caches capability output, so exhaustion is a warning, not a
    /// failure; the REST check stays authoritative.
    pub async fn check_caps(&self, type_name: &str) -> HarnessResult<bool> {
        for attempt in 0..self.timeouts.caps_attempts {
            sleep(self.timeouts.caps_interval()).await;
            match self.wms.capabilities(Some(type_name)).await {
                Ok(caps) if caps.layer(type_name).is_some() => {
                    tracing::debug!(
                        "{} visible in capabilities after {} attempts",
                        type_name,
                        attempt + 1
                    );
                    return Ok(true);
                }
                Ok(_) => tracing::debug!("{} not in capabilities yet", type_name),
                Err(e) => tracing::debug!("capabilities not ready: {}", e),
            }
        }
        tracing::warn!(
            "layer {} never appeared in the capabilities document",
            type_name
        );
        Ok(false)
    }

    /// The layer is present in the map server's REST catalog.
    pub async fn check_rest(&self, layer_name: &str) -> HarnessResult<LayerInfo> {
        self.rest.get_layer(layer_name).await?.ok_or_else(|| {
            HarnessError::Upload(format!(
                "layer {} missing from the map server catalog",
                layer_name
            ))
        })
    }

    /// The newest matching upload record is marked complete. Skipped when no
    /// database is configured; a still-pending record is only warned about,
    /// matching how flaky the importer's bookkeeping is in practice.
    pub async fn check_upload_record(&self, layer_name: &str) -> HarnessResult<()> {
        let Some(db) = &self.db else {
            tracing::debug!("no database configured, skipping upload record check");
            return Ok(());
        };

        match db.latest_upload(layer_name).await? {
            Some(record) if record.complete => Ok(()),
            Some(record) => {
                tracing::warn!("upload record for {} not complete yet", record.name);
                Ok(())
            }
            None => Err(HarnessError::Upload(format!(
                "no upload record found for {}",
                layer_name
            ))),
        }
    }

    /// Everything the suite checks after a successful upload.
    pub async fn check_layer_complete(
        &self,
        layer_page: &str,
        original_name: &str,
    ) -> HarnessResult<()> {
        self.check_layer_page(layer_page).await?;

        // The page path ends with the workspace-qualified type name; the
        // colon may arrive percent-encoded.
        let tail = layer_page
            .rsplit('/')
            .next()
            .unwrap_or(original_name)
            .replace("%3A", ":");
        let type_name = if tail.contains(':') {
            tail.clone()
        } else {
            self.type_name(&tail)
        };
        let layer_name = tail.rsplit(':').next().unwrap_or(original_name).to_string();

        self.check_caps(&type_name).await?;
        self.check_rest(&layer_name).await?;
        self.check_upload_record(&layer_name).await
    }

    pub fn database(&self) -> Option<&PortalDatabase> {
        self.db.as_ref()
    }

    pub fn wms(&self) -> &WmsClient {
        &self.wms
    }
}
