//! Upload wizard driver.
//!
//! The portal imports a layer through a multi-step wizard: a multipart post
//! to the `save` step, an optional `time` step for time-enabled vector data,
//! an optional `srs` step, a `csv` column-mapping step for CSV files, and a
//! `final` step that answers with the new layer's page URL. The harness
//! drives those steps the same way the portal's own frontend does, as
//! CSRF-protected AJAX form posts.

use bytes::Bytes;
use reqwest::multipart::{Form, Part};
use std::path::Path;
use std::sync::Arc;
use url::Url;

use crate::config::Timeouts;
use crate::error::{HarnessError, HarnessResult};
use crate::fixtures::dataset;
use crate::portal::progress::{self, ProgressReport};
use crate::portal::session::PortalSession;

/// Default permission set posted alongside every upload.
const DEFAULT_PERMISSIONS: &str =
    r#"{"users": {"AnonymousUser": ["view_resourcebase", "download_resourcebase"]}, "groups": {}}"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadStep {
    Save,
    Time,
    Srs,
    Csv,
    Final,
}

impl UploadStep {
    pub fn fragment(self) -> &'static str {
        match self {
            UploadStep::Save => "save",
            UploadStep::Time => "time",
            UploadStep::Srs => "srs",
            UploadStep::Csv => "csv",
            UploadStep::Final => "final",
        }
    }

    pub fn path(self) -> String {
        format!("/upload/{}", self.fragment())
    }

    /// Whether a wizard redirect URL points at this step.
    pub fn in_url(self, url: &str) -> bool {
        url.contains(&self.path())
    }

    /// Rewrite a step URL to point at another step, keeping the query string.
    /// The wizard redirects to `srs` even when the SRS is already known, and
    /// the suite jumps straight to `final` in that case.
    pub fn rewrite(url: &str, from: UploadStep, to: UploadStep) -> String {
        url.replacen(&from.path(), &to.path(), 1)
    }
}

/// Body of every wizard step response.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub redirect_to: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    /// Progress endpoint to poll while the importer works.
    #[serde(default)]
    pub progress: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub error_msg: Option<String>,
}

impl UploadResponse {
    /// Importer session id carried in the upload URL's `id` query parameter.
    pub fn session_id(&self) -> Option<i64> {
        let raw = self.url.as_deref().or(self.redirect_to.as_deref())?;
        let parsed = Url::parse(raw).ok().or_else(|| {
            Url::parse("http://portal.invalid")
                .ok()?
                .join(raw)
                .ok()
        })?;
        parsed
            .query_pairs()
            .find(|(key, _)| key == "id")
            .and_then(|(_, value)| value.parse().ok())
    }
}

/// Time dimension settings for the wizard's `time` step.
#[derive(Debug, Clone)]
pub struct TimeConfig {
    pub attribute: String,
    pub end_attribute: Option<String>,
    pub presentation: String,
}

impl TimeConfig {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            end_attribute: None,
            presentation: "LIST".to_string(),
        }
    }

    pub fn with_end(mut self, end_attribute: impl Into<String>) -> Self {
        self.end_attribute = Some(end_attribute.into());
        self
    }
}

pub struct UploadClient {
    session: Arc<PortalSession>,
    timeouts: Timeouts,
}

impl UploadClient {
    pub fn new(session: Arc<PortalSession>) -> Self {
        let timeouts = session.timeouts().clone();
        Self { session, timeouts }
    }

    pub fn session(&self) -> &PortalSession {
        &self.session
    }

    /// Post a file to the wizard's `save` step. Shapefiles bring their
    /// sidecar files along as extra multipart parts.
    ///
    /// A non-success HTTP status (an unsupported extension, for one) comes
    /// back as `HarnessError::UnexpectedStatus`.
    pub async fn upload_file(&self, path: &Path) -> HarnessResult<UploadResponse> {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| HarnessError::Upload(format!("bad upload path {}", path.display())))?
            .to_string();

        tracing::info!("uploading {}", file_name);

        let bytes = tokio::fs::read(path).await?;
        let mut form = Form::new()
            .text("permissions", DEFAULT_PERMISSIONS)
            .part("base_file", Part::bytes(bytes).file_name(file_name));

        if path.extension().and_then(|e| e.to_str()) == Some("shp") {
            for sidecar in dataset::shapefile_family(path)? {
                let ext = sidecar.extension().and_then(|e| e.to_str()).unwrap_or("");
                let Some(field) = dataset::sidecar_field(ext) else {
                    continue;
                };
                let name = sidecar
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or(ext)
                    .to_string();
                let bytes = tokio::fs::read(&sidecar).await?;
                form = form.part(field, Part::bytes(bytes).file_name(name));
            }
        }

        let response = self
            .session
            .post_multipart(&UploadStep::Save.path(), form)
            .await?;
        PortalSession::expect_json(response).await
    }

    /// Post an in-memory fixture to the `save` step.
    pub async fn upload_bytes(
        &self,
        file_name: &str,
        bytes: Bytes,
    ) -> HarnessResult<UploadResponse> {
        tracing::info!("uploading {} ({} bytes)", file_name, bytes.len());

        let form = Form::new().text("permissions", DEFAULT_PERMISSIONS).part(
            "base_file",
            Part::bytes(bytes.to_vec()).file_name(file_name.to_string()),
        );

        let response = self
            .session
            .post_multipart(&UploadStep::Save.path(), form)
            .await?;
        PortalSession::expect_json(response).await
    }

    /// Poll the progress endpoint named by a step response, when present.
    pub async fn wait_for_progress(
        &self,
        response: &UploadResponse,
    ) -> HarnessResult<Option<ProgressReport>> {
        match &response.progress {
            Some(url) => Ok(Some(
                progress::wait_for_completion(&self.session, url, &self.timeouts).await?,
            )),
            None => Ok(None),
        }
    }

    /// Verify the initial save step succeeded and handed back a redirect.
    pub fn ensure_saved<'a>(&self, response: &'a UploadResponse) -> HarnessResult<&'a str> {
        if !response.success {
            return Err(HarnessError::Upload(format!(
                "save step reported failure: {:?}",
                response.error_msg
            )));
        }
        response
            .redirect_to
            .as_deref()
            .ok_or(HarnessError::MissingField("redirect_to"))
    }

    /// Walk the remaining wizard steps after a successful save and return
    /// the layer page URL from the final step.
    pub async fn finish_upload(
        &self,
        start: &UploadResponse,
        layer_name: &str,
        is_raster: bool,
    ) -> HarnessResult<String> {
        let mut current = self.ensure_saved(start)?.to_string();

        if !is_raster {
            if UploadStep::Time.in_url(&current) {
                // Time step offered but not configured; pass straight through.
                let page = self.session.get(&current).await?;
                if !page.status().is_success() {
                    return Err(HarnessError::from_response(page).await);
                }
                let data: UploadResponse =
                    PortalSession::expect_json(self.session.post_form(&current, &[]).await?)
                        .await?;
                self.wait_for_progress(&data).await?;
                current = self.ensure_saved(&data)?.to_string();
            }

            if UploadStep::Srs.in_url(&current) {
                current = UploadStep::rewrite(&current, UploadStep::Srs, UploadStep::Final);
            }
        }

        if !UploadStep::Final.in_url(&current) {
            return Err(HarnessError::Upload(format!(
                "expected the final wizard step, got {}",
                current
            )));
        }

        let done: UploadResponse = self.session.get_json(&current).await?;
        let url = done.url.ok_or(HarnessError::MissingField("url"))?;
        if !url.contains(layer_name) {
            return Err(HarnessError::Upload(format!(
                "expected {} in layer URL, got {}",
                layer_name, url
            )));
        }
        Ok(url)
    }

    /// The whole happy path: save, wait for the importer, walk the wizard,
    /// return the layer page URL.
    pub async fn upload_and_complete(
        &self,
        path: &Path,
        layer_name: &str,
        is_raster: bool,
    ) -> HarnessResult<String> {
        let saved = self.upload_file(path).await?;
        self.wait_for_progress(&saved).await?;
        self.finish_upload(&saved, layer_name, is_raster).await
    }

    /// Post the time step form and follow it to the final step.
    pub async fn configure_time(
        &self,
        step_url: &str,
        config: &TimeConfig,
    ) -> HarnessResult<UploadResponse> {
        let page = self.session.get(&UploadStep::Time.path()).await?;
        if !page.status().is_success() {
            return Err(HarnessError::from_response(page).await);
        }

        let mut fields: Vec<(&str, &str)> = vec![
            ("time_attribute", config.attribute.as_str()),
            ("presentation_strategy", config.presentation.as_str()),
        ];
        if let Some(end) = &config.end_attribute {
            fields.push(("time_end_attribute", end.as_str()));
        }

        let response = self.session.post_form(step_url, &fields).await?;
        PortalSession::expect_json(response).await
    }

    /// Post the CSV column mapping form for a CSV upload.
    pub async fn configure_csv(
        &self,
        step_url: &str,
        lat_column: &str,
        lng_column: &str,
    ) -> HarnessResult<UploadResponse> {
        let fields = [("lat", lat_column), ("lng", lng_column)];
        let response = self.session.post_form(step_url, &fields).await?;
        PortalSession::expect_json(response).await
    }
}
