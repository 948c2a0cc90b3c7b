//! Configuration types for drive115-dl

use crate::credentials::{DriveCredentials, OpenAiCredentials};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{path::Path, path::PathBuf, time::Duration};

/// Endpoint URLs of the 115 web API
///
/// Defaults point at the production service. Overriding them is how tests
/// aim the client at a mock server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveEndpoints {
    /// Directory listing (`GET`, offset/limit paginated)
    #[serde(default = "default_list_url")]
    pub list_files: String,

    /// Directory creation (`POST` form)
    #[serde(default = "default_mkdir_url")]
    pub create_directory: String,

    /// Offline download task submission (`POST` form)
    #[serde(default = "default_lixian_url")]
    pub add_link_tasks: String,

    /// Credential probe
    #[serde(default = "default_unread_url")]
    pub credential_test: String,
}

impl Default for DriveEndpoints {
    fn default() -> Self {
        Self {
            list_files: default_list_url(),
            create_directory: default_mkdir_url(),
            add_link_tasks: default_lixian_url(),
            credential_test: default_unread_url(),
        }
    }
}

impl DriveEndpoints {
    /// Point every endpoint at the same base URL, keeping the production paths
    ///
    /// Useful for mock servers, which serve everything from one origin.
    pub fn with_base(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            list_files: format!("{base}/natsort/files.php"),
            create_directory: format!("{base}/files/add"),
            add_link_tasks: format!("{base}/web/lixian/"),
            credential_test: format!("{base}/api/1.0/web/1.0/user/unread"),
        }
    }
}

/// 115 drive behaviour
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DriveConfig {
    /// Endpoint URLs
    #[serde(default)]
    pub endpoints: DriveEndpoints,

    /// Entries requested per listing page (default: 1150)
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Id of the drive root directory (default: "0")
    #[serde(default = "default_root_id")]
    pub root_id: String,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            endpoints: DriveEndpoints::default(),
            page_size: default_page_size(),
            root_id: default_root_id(),
        }
    }
}

/// Shared HTTP client settings
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Overall request timeout (default: 30 seconds)
    #[serde(default = "default_timeout", with = "duration_serde")]
    pub timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl HttpConfig {
    /// Build a reqwest client from these settings
    pub fn build_client(&self) -> Result<reqwest::Client> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(&self.user_agent)
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))
    }
}

/// Credentials for the services this crate talks to
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    /// 115 cookie session
    #[serde(default)]
    pub drive: Option<DriveCredentials>,

    /// OpenAI-compatible API key and base URL
    #[serde(default)]
    pub openai: Option<OpenAiCredentials>,
}

/// RSS trigger configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RssTriggerConfig {
    /// Key under which the trigger's watermark is stored
    pub node_id: String,

    /// Feed URL (RSS or Atom)
    pub feed_url: String,

    /// Items published before this date are never emitted
    /// (default: 1970-01-01T00:00:00Z)
    #[serde(default = "default_start_date")]
    pub start_date: DateTime<Utc>,

    /// How often to poll the feed (default: 60 seconds)
    #[serde(default = "default_poll_interval", with = "duration_serde")]
    pub poll_interval: Duration,

    /// Whether the trigger is active
    #[serde(default = "default_true")]
    pub enabled: bool,
}

impl RssTriggerConfig {
    /// Trigger with default start date and poll interval
    pub fn new(node_id: impl Into<String>, feed_url: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            feed_url: feed_url.into(),
            start_date: default_start_date(),
            poll_interval: default_poll_interval(),
            enabled: true,
        }
    }
}

/// Data storage
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PersistenceConfig {
    /// SQLite database holding per-node static data (default: "drive115-dl.db")
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Main configuration for drive115-dl
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// 115 drive behaviour
    #[serde(default)]
    pub drive: DriveConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// Service credentials
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// RSS triggers
    #[serde(default)]
    pub triggers: Vec<RssTriggerConfig>,

    /// Data storage
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

impl Config {
    /// Load and validate a JSON configuration file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check settings that serde cannot express
    pub fn validate(&self) -> Result<()> {
        if self.drive.page_size == 0 {
            return Err(Error::config("drive.page_size", "page size must be greater than 0"));
        }

        let mut seen = HashSet::new();
        for trigger in &self.triggers {
            if trigger.feed_url.trim().is_empty() {
                return Err(Error::config(
                    "triggers.feed_url",
                    format!("trigger '{}' has an empty feed URL", trigger.node_id),
                ));
            }
            if !seen.insert(trigger.node_id.as_str()) {
                return Err(Error::config(
                    "triggers.node_id",
                    format!("duplicate trigger node id '{}'", trigger.node_id),
                ));
            }
        }

        Ok(())
    }
}

// Default value functions
fn default_list_url() -> String {
    "https://aps.115.com/natsort/files.php".to_string()
}

fn default_mkdir_url() -> String {
    "https://webapi.115.com/files/add".to_string()
}

fn default_lixian_url() -> String {
    "https://115.com/web/lixian/".to_string()
}

fn default_unread_url() -> String {
    "https://home.115.com/api/1.0/web/1.0/user/unread".to_string()
}

fn default_page_size() -> u32 {
    1150
}

fn default_root_id() -> String {
    "0".to_string()
}

fn default_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("drive115-dl/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_start_date() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(60)
}

fn default_database_path() -> PathBuf {
    PathBuf::from("drive115-dl.db")
}

fn default_true() -> bool {
    true
}

// Duration serialization helper (whole seconds on the wire)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
