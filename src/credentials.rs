//! Credential definitions and request authentication.
//!
//! Each credential type knows how to inject itself into an outgoing request
//! ([`Authenticate`]) and how to check itself against a cheap probe endpoint.

use crate::config::DriveEndpoints;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

/// Body `code` the 115 probe endpoint returns for a dead session
const DRIVE_INVALID_SESSION_CODE: i64 = 99;

/// Injects credentials into an outgoing request
pub trait Authenticate: Send + Sync {
    /// Decorate `request` with whatever headers the credential requires
    fn authenticate(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder;
}

/// 115 web session cookies
#[derive(Clone, Serialize, Deserialize)]
pub struct DriveCredentials {
    /// `CID` cookie
    pub cid: String,
    /// `SEID` cookie
    pub seid: String,
    /// `UID` cookie
    pub uid: String,
}

impl DriveCredentials {
    /// Create credentials from the three session cookies
    pub fn new(cid: impl Into<String>, seid: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            cid: cid.into(),
            seid: seid.into(),
            uid: uid.into(),
        }
    }

    /// Value of the `Cookie` header
    pub fn cookie_header(&self) -> String {
        format!("CID={}; SEID={}; UID={}", self.cid, self.seid, self.uid)
    }

    /// Probe the unread-messages endpoint with this session
    ///
    /// # Errors
    /// [`Error::InvalidCredentials`] when the service reports an invalid
    /// session, [`Error::Network`] on transport or HTTP status failures.
    pub async fn test(&self, client: &reqwest::Client, endpoints: &DriveEndpoints) -> Result<()> {
        debug!(url = %endpoints.credential_test, "Testing 115 credentials");

        let body: serde_json::Value = self
            .authenticate(client.get(&endpoints.credential_test))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if body.get("code").and_then(|c| c.as_i64()) == Some(DRIVE_INVALID_SESSION_CODE) {
            return Err(Error::InvalidCredentials(format!(
                "115 rejected the session: {}",
                body
            )));
        }

        Ok(())
    }
}

impl Authenticate for DriveCredentials {
    fn authenticate(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.header(reqwest::header::COOKIE, self.cookie_header())
    }
}

impl std::fmt::Debug for DriveCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriveCredentials")
            .field("cid", &"<redacted>")
            .field("seid", &"<redacted>")
            .field("uid", &self.uid)
            .finish()
    }
}

/// OpenAI-compatible API credentials
#[derive(Clone, Serialize, Deserialize)]
pub struct OpenAiCredentials {
    /// API base URL, without the `/v1` suffix (default: "https://api.openai.com")
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,

    /// Bearer token
    pub api_key: String,
}

impl OpenAiCredentials {
    /// Credentials against the default base URL
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: default_openai_base_url(),
            api_key: api_key.into(),
        }
    }

    /// Same key, different base URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Resolve `path` (e.g. "/v1/models") against the base URL
    ///
    /// The base URL may carry its own path prefix; `path` is appended to it.
    pub fn endpoint(&self, path: &str) -> Result<Url> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| {
            Error::config(
                "credentials.openai.base_url",
                format!("invalid base URL '{}': {}", self.base_url, e),
            )
        })
    }

    /// List models to confirm the key is accepted
    pub async fn test(&self, client: &reqwest::Client) -> Result<()> {
        let url = self.endpoint("/v1/models")?;
        debug!(url = %url, "Testing OpenAI-compatible credentials");

        let response = self.authenticate(client.get(url)).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::InvalidCredentials(format!(
                "model listing returned HTTP {}",
                status.as_u16()
            )));
        }

        Ok(())
    }
}

impl Authenticate for OpenAiCredentials {
    fn authenticate(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request.bearer_auth(&self.api_key)
    }
}

impl std::fmt::Debug for OpenAiCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiCredentials")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

fn default_openai_base_url() -> String {
    "https://api.openai.com".to_string()
}
