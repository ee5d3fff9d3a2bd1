//! Redfish transport.
//!
//! [`RedfishSource`] is the seam between threshold resolution and the
//! network: the resolver only asks for JSON documents by path.
//! [`RedfishClient`] is the real implementation over `reqwest`.

use anyhow::{anyhow, Result as AnyResult};
use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde_json::Value;
use tracing::debug;

use crate::error::{Resource, Result, ThresholdError};
use crate::Config;

// ---

/// A source of Redfish JSON documents addressed by absolute path.
#[async_trait]
pub trait RedfishSource {
    /// GET `path` and parse the body as JSON.
    ///
    /// A non-success status is a [`ThresholdError::Status`].
    async fn get_json(&self, path: &str, resource: Resource) -> Result<Value>;
}

/// Basic-auth Redfish client for one iDRAC.
pub struct RedfishClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
}

impl RedfishClient {
    /// Build a client for `host` (address, optionally with `:port`).
    pub fn new(config: &Config, host: &str, username: &str, password: &str) -> AnyResult<Self> {
        // ---
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_tls)
            .timeout(config.timeout)
            .build()
            .map_err(|e| anyhow!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: format!("{}://{}", config.scheme, host),
            username: username.to_string(),
            password: password.to_string(),
        })
    }
}

#[async_trait]
impl RedfishSource for RedfishClient {
    async fn get_json(&self, path: &str, resource: Resource) -> Result<Value> {
        // ---
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let request_error = |source| ThresholdError::Request {
            resource,
            url: url.clone(),
            source,
        };

        let response = self
            .client
            .get(&url)
            .header(CONTENT_TYPE, "application/json")
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ThresholdError::Status {
                resource,
                url,
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(request_error)?;
        debug!("Successfully pulled {} ({} bytes)", resource, body.len());

        serde_json::from_str(&body).map_err(|source| ThresholdError::Json {
            resource,
            url,
            source,
        })
    }
}
