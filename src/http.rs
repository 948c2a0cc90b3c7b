//! The authenticated request primitive every 115 operation is built on.
//!
//! [`AuthenticatedCall`] is the seam: [`DriveClient`](crate::drive::DriveClient)
//! only ever talks to the service through it, so tests substitute a fake and
//! hosts that already own an authenticated transport can plug theirs in.

use crate::credentials::Authenticate;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

/// HTTP verb of an [`ApiRequest`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HttpMethod {
    /// GET, parameters in the query string
    Get,
    /// POST, parameters form-encoded in the body
    Post,
}

/// One request against the 115 web API
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRequest {
    /// Absolute endpoint URL
    pub url: String,
    /// Verb
    pub method: HttpMethod,
    /// Query-string pairs, in order
    pub query: Vec<(String, String)>,
    /// Form pairs, in order (sent urlencoded)
    pub form: Vec<(String, String)>,
}

impl ApiRequest {
    /// A GET request with no parameters
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, HttpMethod::Get)
    }

    /// A POST request with an empty form
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(url, HttpMethod::Post)
    }

    fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            query: Vec::new(),
            form: Vec::new(),
        }
    }

    /// Append a query-string pair
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Append a form pair
    pub fn form(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.form.push((key.into(), value.to_string()));
        self
    }

    /// Value of the first query pair named `key`
    pub fn query_value(&self, key: &str) -> Option<&str> {
        lookup(&self.query, key)
    }

    /// Value of the first form pair named `key`
    pub fn form_value(&self, key: &str) -> Option<&str> {
        lookup(&self.form, key)
    }
}

fn lookup<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

/// Issues one authenticated request and returns the parsed JSON body
///
/// Implementations must fail with [`Error::Api`] when the body reports
/// `state: false` (see [`check_state`]), exactly as they would fail on a
/// transport error.
#[async_trait]
pub trait AuthenticatedCall: Send + Sync {
    /// Perform `request`
    async fn call(&self, request: ApiRequest) -> Result<Value>;
}

#[async_trait]
impl<T: AuthenticatedCall + ?Sized> AuthenticatedCall for &T {
    async fn call(&self, request: ApiRequest) -> Result<Value> {
        (**self).call(request).await
    }
}

#[async_trait]
impl<T: AuthenticatedCall + ?Sized> AuthenticatedCall for std::sync::Arc<T> {
    async fn call(&self, request: ApiRequest) -> Result<Value> {
        (**self).call(request).await
    }
}

/// Reject a body whose `state` marker is missing or not `true`
pub fn check_state(endpoint: &str, body: Value) -> Result<Value> {
    if body.get("state").and_then(Value::as_bool) == Some(true) {
        Ok(body)
    } else {
        Err(Error::api(endpoint, body))
    }
}

/// [`AuthenticatedCall`] over a reqwest client
pub struct HttpCaller<A> {
    client: reqwest::Client,
    credentials: A,
}

impl<A: Authenticate> HttpCaller<A> {
    /// Wrap an existing client; `credentials` is applied to every request
    pub fn new(client: reqwest::Client, credentials: A) -> Self {
        Self {
            client,
            credentials,
        }
    }
}

#[async_trait]
impl<A: Authenticate> AuthenticatedCall for HttpCaller<A> {
    async fn call(&self, request: ApiRequest) -> Result<Value> {
        debug!(method = ?request.method, url = %request.url, "115 API request");

        let builder = match request.method {
            HttpMethod::Get => self.client.get(&request.url),
            HttpMethod::Post => self.client.post(&request.url).form(&request.form),
        };
        let builder = self.credentials.authenticate(builder.query(&request.query));

        let text = builder.send().await?.error_for_status()?.text().await?;

        let body = serde_json::from_str::<Value>(&text)
            .map_err(|_| Error::api(&request.url, Value::String(text)))?;

        check_state(&request.url, body)
    }
}
