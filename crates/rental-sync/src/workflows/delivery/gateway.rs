use serde_json::Value;
use std::fmt::Debug;
use tokio::runtime::Runtime;

const USER_AGENT: &str = concat!("rental-sync/", env!("CARGO_PKG_VERSION"));

/// Status and raw body of a backend response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    pub status: u16,
    pub body: String,
}

impl HttpReply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("http client unavailable: {0}")]
    Client(String),
    #[error("http runtime unavailable: {0}")]
    Runtime(String),
}

/// Outbound seam to the listing backend. Synchronous so the batch can stay
/// strictly sequential.
pub trait ListingGateway: Debug {
    fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, GatewayError>;
}

/// reqwest-backed gateway. Owns the runtime that drives the async client so
/// callers never see async details.
pub struct HttpListingGateway {
    client: reqwest::Client,
    runtime: Runtime,
}

impl HttpListingGateway {
    pub fn new(client: reqwest::Client, runtime: Runtime) -> Self {
        Self { client, runtime }
    }

    pub fn with_runtime() -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| GatewayError::Client(err.to_string()))?;
        let runtime = Runtime::new().map_err(|err| GatewayError::Runtime(err.to_string()))?;
        Ok(Self::new(client, runtime))
    }
}

impl Debug for HttpListingGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpListingGateway").finish_non_exhaustive()
    }
}

impl ListingGateway for HttpListingGateway {
    fn post_json(&self, url: &str, body: &Value) -> Result<HttpReply, GatewayError> {
        let transport = |err: reqwest::Error| GatewayError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        };

        self.runtime.block_on(async {
            let response = self
                .client
                .post(url)
                .json(body)
                .send()
                .await
                .map_err(transport)?;
            let status = response.status().as_u16();
            let body = response.text().await.map_err(transport)?;
            Ok(HttpReply { status, body })
        })
    }
}
