//! HTTP client for the Deploy REST API.
//!
//! [`Client`] is the transport: it resolves API paths against the configured
//! base URL, adds the bearer token and JSON content type, and turns any
//! status >= 400 into a [`ProviderError`]. The typed operations for each
//! resource family live in the submodules and are all methods on [`Client`].
//!
//! ```ignore
//! use deploy_provider::{Client, ProviderConfig};
//!
//! let client = Client::new(&ProviderConfig::new("ddp_token"))?;
//! let project = client.create_project("demo", Default::default()).await?;
//! assert!(!project.has_production_deployment);
//! ```

#[allow(missing_docs)]
pub mod models;

mod deployments;
mod domains;
mod github;
mod projects;
mod user;

use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};
use url::Url;

use crate::config::ProviderConfig;
use crate::error::{ProviderError, Result};

pub use reqwest::Method;

/// Query parameters, already stringified.
pub type Query<'a> = [(&'a str, String)];

/// Client for the Deploy API.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("base_url", &self.base_url.as_str())
            .field("authenticated", &!self.token.is_empty())
            .finish()
    }
}

impl Client {
    /// Create a client from a resolved configuration.
    pub fn new(config: &ProviderConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("deploy-provider/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_http_client(http, config))
    }

    /// Create a client that reuses an existing `reqwest` client.
    pub fn with_http_client(http: reqwest::Client, config: &ProviderConfig) -> Self {
        Self {
            http,
            base_url: config.base_url.clone(),
            token: config.api_token.clone(),
        }
    }

    /// The base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path and query against the base URL.
    pub fn endpoint(&self, path: &str, query: &Query<'_>) -> Url {
        let mut url = self.base_url.clone();
        let joined = format!(
            "{}/{}",
            self.base_url.path().trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        url.set_path(&joined);
        url.set_query(None);
        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }
        url
    }

    /// Perform a single round-trip and return the raw response body.
    ///
    /// The body is sent unmodified. Any status >= 400 fails with the status
    /// code and the response body; 404 is reported as [`ProviderError::NotFound`].
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &Query<'_>,
        body: Option<Vec<u8>>,
    ) -> Result<Vec<u8>> {
        let url = self.endpoint(path, query);
        debug!(method = %method, url = %url, "Sending Deploy API request");

        let mut request = self
            .http
            .request(method.clone(), url)
            .header(CONTENT_TYPE, "application/json");
        if !self.token.is_empty() {
            request = request.bearer_auth(&self.token);
        }
        if let Some(body) = body {
            request = request.body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;

        if status.as_u16() >= 400 {
            let body = String::from_utf8_lossy(&bytes).into_owned();
            warn!(method = %method, path, status = status.as_u16(), "Deploy API request failed");
            return Err(ProviderError::from_status(status.as_u16(), body));
        }

        Ok(bytes.to_vec())
    }

    /// Perform a request and decode the JSON response into `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &Query<'_>,
        body: Option<Vec<u8>>,
    ) -> Result<T> {
        let bytes = self.execute(method, path, query, body).await?;
        serde_json::from_slice(&bytes).map_err(ProviderError::Decode)
    }

    /// Perform a request where only success or failure matters.
    pub async fn request_unit(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<()> {
        self.execute(method, path, &[], body).await.map(|_| ())
    }
}

/// Serialize a request payload.
pub(crate) fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>> {
    serde_json::to_vec(body).map_err(ProviderError::Encode)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str) -> Client {
        let config = ProviderConfig::new("t").with_base_url(base).unwrap();
        Client::with_http_client(reqwest::Client::new(), &config)
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let c = client("https://dash.deno.com");
        assert_eq!(
            c.endpoint("/api/projects", &[]).as_str(),
            "https://dash.deno.com/api/projects"
        );

        let c = client("http://localhost:9000/prefix/");
        assert_eq!(
            c.endpoint("/api/user", &[]).as_str(),
            "http://localhost:9000/prefix/api/user"
        );
    }

    #[test]
    fn test_endpoint_encodes_query() {
        let c = client("https://dash.deno.com");
        let url = c.endpoint(
            "/api/projects/p1/deployments",
            &[("page", "2".to_string()), ("q", "a b&c".to_string())],
        );
        assert_eq!(url.query(), Some("page=2&q=a+b%26c"));

        let url = c.endpoint("/api/projects", &[]);
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_debug_hides_token() {
        let c = client("https://dash.deno.com");
        let debug = format!("{:?}", c);
        assert!(debug.contains("authenticated: true"));
        assert!(!debug.contains("\"t\""));
    }
}
