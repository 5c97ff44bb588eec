use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Deserialize)]
pub struct Config {
    pub portal: PortalConfig,
    pub mapserver: MapServerConfig,
    /// Optional: when absent, database corroboration checks are skipped.
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default)]
    pub timeouts: Timeouts,
}

// Custom Debug implementation to prevent secrets from being logged
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("portal", &self.portal)
            .field("mapserver", &self.mapserver)
            .field("database", &self.database)
            .field("data_dir", &self.data_dir)
            .field("timeouts", &self.timeouts)
            .finish()
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("test-data")
}

#[derive(Clone, Deserialize)]
pub struct PortalConfig {
    #[serde(default = "default_portal_url")]
    pub base_url: String,
    #[serde(default = "default_username")]
    pub username: String,
    pub password: String,
}

impl fmt::Debug for PortalConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PortalConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

fn default_portal_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_username() -> String {
    "admin".to_string()
}

#[derive(Clone, Deserialize)]
pub struct MapServerConfig {
    #[serde(default = "default_mapserver_url")]
    pub base_url: String,
    #[serde(default = "default_username")]
    pub username: String,
    pub password: String,
    /// Workspace the portal publishes layers into.
    #[serde(default = "default_workspace")]
    pub workspace: String,
}

impl fmt::Debug for MapServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapServerConfig")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("workspace", &self.workspace)
            .finish()
    }
}

fn default_mapserver_url() -> String {
    "http://localhost:8080/geoserver".to_string()
}

fn default_workspace() -> String {
    "geonode".to_string()
}

#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

// Custom Debug implementation to redact database URL (may contain password)
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

fn default_max_connections() -> u32 {
    5
}

/// Bounds for the harness's fixed-interval wait loops. Every remote wait is a
/// bounded number of attempts with a constant sleep in between, never an
/// unbounded poll.
#[derive(Debug, Clone, Deserialize)]
pub struct Timeouts {
    #[serde(default = "default_progress_attempts")]
    pub progress_attempts: u32,
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    #[serde(default = "default_caps_attempts")]
    pub caps_attempts: u32,
    #[serde(default = "default_caps_interval_ms")]
    pub caps_interval_ms: u64,
    #[serde(default = "default_startup_attempts")]
    pub startup_attempts: u32,
    #[serde(default = "default_startup_interval_ms")]
    pub startup_interval_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            progress_attempts: default_progress_attempts(),
            progress_interval_ms: default_progress_interval_ms(),
            caps_attempts: default_caps_attempts(),
            caps_interval_ms: default_caps_interval_ms(),
            startup_attempts: default_startup_attempts(),
            startup_interval_ms: default_startup_interval_ms(),
        }
    }
}

impl Timeouts {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms)
    }

    pub fn caps_interval(&self) -> Duration {
        Duration::from_millis(self.caps_interval_ms)
    }

    pub fn startup_interval(&self) -> Duration {
        Duration::from_millis(self.startup_interval_ms)
    }
}

fn default_progress_attempts() -> u32 {
    100
}

fn default_progress_interval_ms() -> u64 {
    100
}

fn default_caps_attempts() -> u32 {
    10
}

fn default_caps_interval_ms() -> u64 {
    500
}

fn default_startup_attempts() -> u32 {
    10
}

fn default_startup_interval_ms() -> u64 {
    200
}

impl Config {
    pub fn load() -> Result<Arc<Self>, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config").required(false))
            .add_source(
                config::Environment::with_prefix("LAYERPROBE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Config = config.try_deserialize()?;
        Ok(Arc::new(settings))
    }
}
