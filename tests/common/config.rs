//! Test configuration helpers for loading .env credentials and building clients

use drive115_dl::config::{Config, DriveConfig, DriveEndpoints};
use drive115_dl::{DriveClient, DriveCredentials, HttpCaller};

/// Error type for test configuration
#[derive(Debug)]
pub struct ConfigError(pub String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Config error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

/// Cookies every mock-server test authenticates with
pub fn mock_credentials() -> DriveCredentials {
    DriveCredentials::new("test-cid", "test-seid", "42")
}

/// Cookie header the mock server expects from [`mock_credentials`]
pub const MOCK_COOKIE: &str = "CID=test-cid; SEID=test-seid; UID=42";

/// Drive client aimed at a mock server
pub fn mock_drive_client(base: &str) -> DriveClient<HttpCaller<DriveCredentials>> {
    mock_drive_client_with(base, |_| {})
}

/// Drive client aimed at a mock server, with a hook to adjust drive settings
pub fn mock_drive_client_with(
    base: &str,
    adjust: impl FnOnce(&mut DriveConfig),
) -> DriveClient<HttpCaller<DriveCredentials>> {
    let mut config = Config::default();
    config.drive.endpoints = DriveEndpoints::with_base(base);
    config.credentials.drive = Some(mock_credentials());
    adjust(&mut config.drive);
    DriveClient::from_config(&config).unwrap()
}

/// Load 115 session cookies from environment variables
///
/// Required environment variables:
/// - `DRIVE115_CID` - `CID` cookie
/// - `DRIVE115_SEID` - `SEID` cookie
/// - `DRIVE115_UID` - `UID` cookie
pub fn load_live_credentials() -> Result<DriveCredentials, ConfigError> {
    dotenvy::dotenv().ok();

    let var = |name: &str| {
        std::env::var(name).map_err(|_| ConfigError(format!("{} not set in environment", name)))
    };

    Ok(DriveCredentials::new(
        var("DRIVE115_CID")?,
        var("DRIVE115_SEID")?,
        var("DRIVE115_UID")?,
    ))
}

/// Folder live tests may create entries under (default: "/drive115-dl-test")
pub fn live_test_folder() -> String {
    dotenvy::dotenv().ok();
    std::env::var("DRIVE115_TEST_FOLDER").unwrap_or_else(|_| "/drive115-dl-test".to_string())
}

/// Config pointing at the real service
pub fn live_config() -> Result<Config, ConfigError> {
    let mut config = Config::default();
    config.credentials.drive = Some(load_live_credentials()?);
    Ok(config)
}

/// Check if live credentials are available
pub fn has_live_credentials() -> bool {
    dotenvy::dotenv().ok();
    std::env::var("DRIVE115_CID").is_ok()
        && std::env::var("DRIVE115_SEID").is_ok()
        && std::env::var("DRIVE115_UID").is_ok()
}
