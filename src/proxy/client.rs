// HTTP client for the PuppetDB v4 API

use crate::api::{BackendReply, PuppetDb};
use crate::config::Config;
use crate::core::errors::ProxyError;
use crate::core::params::QueryParams;
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, RequestBuilder};
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// Path prefix of every query endpoint
pub const QUERY_ROOT: [&str; 3] = ["pdb", "query", "v4"];

/// Command submission endpoint
pub const COMMAND_PATH: [&str; 3] = ["pdb", "cmd", "v1"];

/// reqwest-backed PuppetDB client
///
/// One pooled client is shared by all requests; nothing is retried.
pub struct PuppetDbClient {
    http_client: Client,
    base_url: Url,
    timeout: Option<Duration>,
}

impl PuppetDbClient {
    /// Create a client for `base_url`
    ///
    /// # Arguments
    /// * `insecure` - skip TLS certificate verification
    /// * `timeout_secs` - per-request timeout, none when unset
    pub fn new(base_url: &str, insecure: bool, timeout_secs: Option<u64>) -> Result<Self, ProxyError> {
        let base_url = Url::parse(base_url).map_err(|e| {
            ProxyError::ConfigurationError(format!("Invalid PuppetDB URL '{}': {}", base_url, e))
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ProxyError::ConfigurationError(format!(
                "PuppetDB URL '{}' cannot carry a path",
                base_url
            )));
        }

        let timeout = timeout_secs.map(Duration::from_secs);
        let mut builder = Client::builder()
            .danger_accept_invalid_certs(insecure)
            .tcp_nodelay(true)
            .pool_idle_timeout(Duration::from_secs(90));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        let http_client = builder.build().map_err(|e| {
            ProxyError::ConfigurationError(format!("Failed to create HTTP client: {}", e))
        })?;

        Ok(Self {
            http_client,
            base_url,
            timeout,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ProxyError> {
        Self::new(&config.puppetdb_url, config.puppetdb_insecure, config.backend_timeout_secs)
    }

    /// Append percent-encoded `segments` to the base URL
    pub fn endpoint(&self, segments: &[&str]) -> Result<Url, ProxyError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| ProxyError::ConfigurationError("PuppetDB URL cannot carry a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn execute(&self, request: RequestBuilder, url: &Url) -> Result<BackendReply, ProxyError> {
        let response = request.send().await.map_err(|e| {
            let message = if e.is_timeout() {
                format!(
                    "request to {} timed out after {}s",
                    url.path(),
                    self.timeout.map(|t| t.as_secs()).unwrap_or_default()
                )
            } else if e.is_connect() {
                format!("connection to {} failed: {}", url.host_str().unwrap_or_default(), e)
            } else {
                format!("request to {} failed: {}", url.path(), e)
            };
            error!(url = %url, error = %e, "PuppetDB request failed");
            ProxyError::Backend(message)
        })?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(|e| {
            error!(url = %url, error = %e, "Failed to read PuppetDB response body");
            ProxyError::Backend(format!("failed to read response from {}: {}", url.path(), e))
        })?;

        debug!(url = %url, status = status, bytes = body.len(), "PuppetDB answered");

        Ok(BackendReply {
            status,
            body: body.to_vec(),
        })
    }
}

#[async_trait]
impl PuppetDb for PuppetDbClient {
    async fn query(&self, endpoint: &[&str], params: &QueryParams) -> Result<BackendReply, ProxyError> {
        let segments: Vec<&str> = QUERY_ROOT.iter().chain(endpoint.iter()).copied().collect();
        let url = self.endpoint(&segments)?;

        let request = self
            .http_client
            .get(url.clone())
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(params.encode());

        self.execute(request, &url).await
    }

    async fn submit_command(
        &self,
        params: &[(&'static str, String)],
        body: Vec<u8>,
    ) -> Result<BackendReply, ProxyError> {
        let url = self.endpoint(&COMMAND_PATH)?;

        let request = self
            .http_client
            .post(url.clone())
            .query(params)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json")
            .body(body);

        self.execute(request, &url).await
    }

    async fn fetch_raw(&self, path: &[&str]) -> Result<BackendReply, ProxyError> {
        let url = self.endpoint(path)?;
        let request = self.http_client.get(url.clone());

        self.execute(request, &url).await
    }
}
