//! Authenticated HTTP session against the portal.
//!
//! The portal uses cookie-based sessions with CSRF-protected forms, so the
//! session keeps a cookie jar for the whole test run and re-reads the CSRF
//! token from it before every form post.

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Response, StatusCode, header};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::time::sleep;
use url::Url;

use crate::config::{PortalConfig, Timeouts};
use crate::error::{HarnessError, HarnessResult};

const CSRF_COOKIE: &str = "csrftoken";
const SESSION_COOKIE: &str = "sessionid";
const LOGIN_PATH: &str = "/account/login/";

pub const CSRF_FIELD: &str = "csrfmiddlewaretoken";

pub struct PortalSession {
    client: Client,
    jar: Arc<Jar>,
    base: Url,
    config: PortalConfig,
    timeouts: Timeouts,
}

impl PortalSession {
    pub fn new(config: PortalConfig, timeouts: Timeouts) -> HarnessResult<Self> {
        let base = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|e| HarnessError::Config(format!("invalid portal base URL: {}", e)))?;

        let jar = Arc::new(Jar::default());
        let client = Client::builder().cookie_provider(jar.clone()).build()?;

        Ok(Self {
            client,
            jar,
            base,
            config,
            timeouts,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Resolve a possibly relative path against the portal base URL.
    pub fn url(&self, path: &str) -> HarnessResult<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Url::parse(path)
                .map_err(|e| HarnessError::Config(format!("invalid URL {}: {}", path, e)));
        }
        self.base
            .join(path)
            .map_err(|e| HarnessError::Config(format!("invalid path {}: {}", path, e)))
    }

    /// Wait for the deployment to start answering at all. Bounded attempts
    /// with a fixed sleep, matching the suite's startup grace period.
    pub async fn await_ready(&self) -> HarnessResult<()> {
        let attempts = self.timeouts.startup_attempts;
        for attempt in 0..attempts {
            sleep(self.timeouts.startup_interval()).await;
            match self.client.get(self.base.clone()).send().await {
                Ok(response) if !response.status().is_server_error() => {
                    tracing::debug!("portal ready after {} attempts", attempt + 1);
                    return Ok(());
                }
                Ok(response) => {
                    tracing::debug!("portal not ready yet: {}", response.status());
                }
                Err(e) => {
                    tracing::debug!("portal not ready yet: {}", e);
                }
            }
        }
        Err(HarnessError::Timeout {
            what: "portal startup".to_string(),
            attempts,
        })
    }

    /// Log in with the configured credentials. Fetches the login page first
    /// to obtain the CSRF cookie, then posts the credentials.
    pub async fn login(&self) -> HarnessResult<()> {
        let login_url = self.url(LOGIN_PATH)?;

        let response = self.client.get(login_url.clone()).send().await?;
        if !response.status().is_success() {
            return Err(HarnessError::from_response(response).await);
        }

        let token = self
            .csrf_token()
            .ok_or_else(|| HarnessError::Auth("no CSRF cookie after login page".to_string()))?;

        let form = [
            ("login", self.config.username.as_str()),
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
            (CSRF_FIELD, token.as_str()),
        ];

        let response = self
            .client
            .post(login_url.clone())
            .header(header::REFERER, login_url.as_str())
            .form(&form)
            .send()
            .await?;

        if response.status().is_client_error() || response.status().is_server_error() {
            return Err(HarnessError::from_response(response).await);
        }

        if self.cookie(SESSION_COOKIE).is_none() {
            return Err(HarnessError::Auth(format!(
                "no session cookie for user {}",
                self.config.username
            )));
        }

        tracing::info!("logged in to portal as {}", self.config.username);
        Ok(())
    }

    /// Current CSRF token, read back out of the cookie jar.
    pub fn csrf_token(&self) -> Option<String> {
        self.cookie(CSRF_COOKIE)
    }

    fn cookie(&self, name: &str) -> Option<String> {
        let header = self.jar.cookies(&self.base)?;
        let raw = header.to_str().ok()?;
        raw.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            (key == name).then(|| value.to_string())
        })
    }

    pub async fn get(&self, path: &str) -> HarnessResult<Response> {
        let url = self.url(path)?;
        Ok(self.client.get(url).send().await?)
    }

    /// GET expecting a 200 with a JSON body.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> HarnessResult<T> {
        let response = self.get(path).await?;
        if response.status() != StatusCode::OK {
            return Err(HarnessError::from_response(response).await);
        }
        Ok(response.json().await?)
    }

    /// Post a CSRF-protected form the way the portal's JavaScript does it,
    /// with the token injected and the AJAX marker header set.
    pub async fn post_form(&self, path: &str, fields: &[(&str, &str)]) -> HarnessResult<Response> {
        let url = self.url(path)?;
        let token = self.csrf_token().unwrap_or_default();

        let mut form: Vec<(&str, &str)> = vec![(CSRF_FIELD, token.as_str())];
        form.extend_from_slice(fields);

        let response = self
            .client
            .post(url.clone())
            .header(header::REFERER, url.as_str())
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&form)
            .send()
            .await?;
        Ok(response)
    }

    /// Post a multipart form with the CSRF token as a text part.
    pub async fn post_multipart(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> HarnessResult<Response> {
        let url = self.url(path)?;
        let token = self.csrf_token().unwrap_or_default();
        let form = form.text(CSRF_FIELD.to_string(), token);

        let response = self
            .client
            .post(url.clone())
            .header(header::REFERER, url.as_str())
            .multipart(form)
            .send()
            .await?;
        Ok(response)
    }

    /// Decode a JSON body after checking for a success status.
    pub async fn expect_json<T: DeserializeOwned>(response: Response) -> HarnessResult<T> {
        if !response.status().is_success() {
            return Err(HarnessError::from_response(response).await);
        }
        Ok(response.json().await?)
    }
}
