// src/client.rs
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::signing::{SignedRequest, SignedRequestBuilder};

pub const SERVER_RESOURCE: &str = "server";

/// Executes signed GETs against a VRage remote API endpoint.
///
/// One attempt per call; timeouts come from the configured `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct VrageClient {
    http: Client,
    base_url: String,
    signer: SignedRequestBuilder,
}

impl VrageClient {
    pub fn new(base_url: &str, signer: SignedRequestBuilder, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::config(format!("failed to create HTTP client: {e}")))?;
        Ok(Self::with_http_client(base_url, signer, http))
    }

    pub fn with_http_client(base_url: &str, signer: SignedRequestBuilder, http: Client) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            signer,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, req: &SignedRequest) -> String {
        format!("{}{}", self.base_url, req.method_path)
    }

    /// Fetch `resource` (e.g. `server`, `server/ping`) and parse the body as JSON.
    pub async fn get_resource(&self, resource: &str) -> Result<Value> {
        let req = self.sign(resource);
        self.execute(&req).await
    }

    pub async fn get_server(&self) -> Result<Value> {
        self.get_resource(SERVER_RESOURCE).await
    }

    pub fn sign(&self, resource: &str) -> SignedRequest {
        self.signer.build(resource)
    }

    /// Send an already-signed request and parse the body. The request must not be reused.
    pub async fn execute(&self, req: &SignedRequest) -> Result<Value> {
        self.fetch(req).await?.json()
    }

    /// Send an already-signed request; non-2xx statuses are errors.
    pub async fn fetch(&self, req: &SignedRequest) -> Result<RawResponse> {
        let url = self.url_for(req);
        let res = self
            .http
            .get(&url)
            .headers(req.headers()?)
            .send()
            .await
            .map_err(|e| Error::fetch(&url, e))?;

        let status = res.status();
        debug!(%url, %status, nonce = req.nonce, "remote API responded");
        let body = res.text().await.map_err(|e| Error::fetch(&url, e))?;

        if !status.is_success() {
            return Err(Error::ResourceFetch {
                url,
                status: Some(status),
                reason: format!("HTTP {status}: {}", body.trim()),
            });
        }
        Ok(RawResponse { url, status, body })
    }
}

/// A successful response whose body has not been decoded yet.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub url: String,
    pub status: StatusCode,
    pub body: String,
}

impl RawResponse {
    pub fn json(self) -> Result<Value> {
        serde_json::from_str(&self.body).map_err(|e| Error::ResourceFetch {
            url: self.url,
            status: Some(self.status),
            reason: format!("malformed JSON body: {e}"),
        })
    }
}
