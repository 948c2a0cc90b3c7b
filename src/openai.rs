//! Pass-through client for OpenAI-compatible APIs.
//!
//! Requests are forwarded as JSON and the response body comes back untouched,
//! whatever the HTTP status: callers see the provider's own error objects.
//! A body that is not JSON at all is an [`Error::Provider`].
//! [`simplify`] strips a response down to its result array.

use crate::config::HttpConfig;
use crate::credentials::{Authenticate, OpenAiCredentials};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::str::FromStr;
use tracing::{debug, warn};

/// Chat completion endpoint, relative to the base URL
pub const CHAT_COMPLETIONS_PATH: &str = "/v1/chat/completions";

/// Image generation endpoint, relative to the base URL
pub const IMAGE_GENERATIONS_PATH: &str = "/v1/images/generations";

/// API resource a response came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    /// Chat completions
    Chat,
    /// Image generations
    Image,
}

impl Resource {
    /// Field holding the result array
    fn result_field(self) -> &'static str {
        match self {
            Resource::Chat => "choices",
            Resource::Image => "data",
        }
    }
}

impl FromStr for Resource {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "chat" => Ok(Resource::Chat),
            "image" => Ok(Resource::Image),
            other => Err(Error::NotSupported(format!("Unknown resource: {}", other))),
        }
    }
}

/// One chat message
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// "system", "user" or "assistant"
    pub role: String,
    /// Message text
    pub content: String,
}

impl ChatMessage {
    /// A message with the given role
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }

    /// A `user` message
    pub fn user(content: impl Into<String>) -> Self {
        Self::new("user", content)
    }

    /// A `system` message
    pub fn system(content: impl Into<String>) -> Self {
        Self::new("system", content)
    }
}

/// Body of a chat completion request
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Model id
    pub model: String,

    /// Conversation so far
    pub messages: Vec<ChatMessage>,

    /// Sampling temperature
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,

    /// Completion length cap
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Nucleus sampling mass
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,

    /// Number of choices
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,

    /// Any other provider-specific fields, sent verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatRequest {
    /// Request with the required fields only
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            ..Default::default()
        }
    }
}

/// Body of an image generation request
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRequest {
    /// Text description of the image
    pub prompt: String,

    /// Number of images
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,

    /// e.g. "1024x1024"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// "url" or "b64_json"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<String>,

    /// Any other provider-specific fields, sent verbatim
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ImageRequest {
    /// Request for a single image from `prompt`
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            ..Default::default()
        }
    }
}

/// Client for an OpenAI-compatible API
pub struct OpenAiClient {
    client: reqwest::Client,
    credentials: OpenAiCredentials,
}

impl OpenAiClient {
    /// Build a client with its own HTTP connection pool
    pub fn new(credentials: OpenAiCredentials, http: &HttpConfig) -> Result<Self> {
        Ok(Self::with_client(http.build_client()?, credentials))
    }

    /// Build a client on top of an existing `reqwest::Client`
    pub fn with_client(client: reqwest::Client, credentials: OpenAiCredentials) -> Self {
        Self {
            client,
            credentials,
        }
    }

    /// Credentials in use
    pub fn credentials(&self) -> &OpenAiCredentials {
        &self.credentials
    }

    /// POST a chat completion request
    pub async fn chat_complete(&self, request: &ChatRequest) -> Result<Value> {
        self.post_json(CHAT_COMPLETIONS_PATH, request).await
    }

    /// POST an image generation request
    pub async fn create_image(&self, request: &ImageRequest) -> Result<Value> {
        self.post_json(IMAGE_GENERATIONS_PATH, request).await
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        let url = self.credentials.endpoint(path)?;
        debug!(url = %url, "POST OpenAI-compatible request");

        let response = self
            .credentials
            .authenticate(self.client.post(url.clone()))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        match serde_json::from_str::<Value>(&text) {
            Ok(value) => {
                if !status.is_success() {
                    warn!(url = %url, status = status.as_u16(), "OpenAI-compatible API returned an error body");
                }
                Ok(value)
            }
            Err(_) => Err(Error::Provider {
                endpoint: url.to_string(),
                body: text,
            }),
        }
    }
}

/// The `choices` (chat) or `data` (image) array of a response
///
/// Returns the body unchanged when the field is missing, e.g. for an error
/// object.
pub fn simplify(resource: Resource, body: Value) -> Value {
    match body {
        Value::Object(mut map) => match map.remove(resource.result_field()) {
            Some(result) => result,
            None => Value::Object(map),
        },
        other => other,
    }
}
