//! # Session Transport
//!
//! The lowest layer of the client: it moves bytes to the server and back, nothing else.
//!
//! [`Transport`] is the seam used by the rest of the crate. The production implementation,
//! [`HttpTransport`], owns a single pooled `reqwest` client bound to the JSON-RPC endpoint,
//! so every call made through the same transport reuses the same keep-alive connections.
//!
//! A transport is exclusively owned by one client and is driven through `&mut self`: calls
//! are strictly sequential. Sharing one across tasks requires external synchronization.
//!
//! There is no retry logic here. Failures to reach the server are reported as
//! [`RpcError::Connection`] and the decision to try again belongs to
//! [`crate::rpc::retry`].
use crate::{config::ConnectionConfig, error::RpcError};
use reqwest::header::{CONTENT_TYPE, HeaderValue};

/// Raw HTTP exchange result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl TransportResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one serialized JSON-RPC envelope and returns the raw response.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Posts `body` to the endpoint, honouring the configured timeout.
    async fn send(&mut self, body: Vec<u8>) -> Result<TransportResponse, RpcError>;

    /// Human readable endpoint, used in logs and error messages.
    fn endpoint(&self) -> &str;
}

/// Pooled HTTP(S) transport posting to `<base_url>/jsonrpc`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// Builds the pooled client from the connection configuration.
    ///
    /// No network traffic happens here, connections are opened lazily on the first call.
    pub fn new(config: &ConnectionConfig) -> Result<Self, RpcError> {
        let endpoint = config.endpoint();

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .danger_accept_invalid_certs(!config.verify_tls())
            .build()
            .map_err(|e| connection_error(&endpoint, &e))?;

        Ok(Self { client, endpoint })
    }
}

impl Transport for HttpTransport {
    async fn send(&mut self, body: Vec<u8>) -> Result<TransportResponse, RpcError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
            .body(body)
            .send()
            .await
            .map_err(|e| connection_error(&self.endpoint, &e))?;

        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| connection_error(&self.endpoint, &e))?;

        Ok(TransportResponse {
            status,
            body: body.to_vec(),
        })
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn connection_error(endpoint: &str, err: &reqwest::Error) -> RpcError {
    // reqwest keeps the interesting part (refused, dns, tls) in the source chain
    let mut reason = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(inner) = source {
        reason = format!("{reason}: {inner}");
        source = inner.source();
    }

    RpcError::Connection {
        endpoint: endpoint.to_string(),
        reason,
        timed_out: err.is_timeout(),
    }
}
