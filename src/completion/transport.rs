//! HTTP transport seam.
//!
//! Backends talk to the network only through [`Transport`], so tests can
//! substitute a scripted body. [`HttpTransport`] is the reqwest
//! implementation used by the CLI.

use std::fmt;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};

use super::context::CallContext;
use crate::constants::ERROR_BODY_LIMIT;
use crate::error::{CompletionError, TransportError};

/// Response body as a stream of raw chunks.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// A JSON POST request.
#[derive(Clone)]
pub struct HttpRequest {
    pub url: String,
    /// Sent as `Authorization: Bearer ...` when present.
    pub bearer: Option<String>,
    pub body: serde_json::Value,
}

impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpRequest")
            .field("url", &self.url)
            .field("bearer", &self.bearer.as_ref().map(|_| "***"))
            .field("body", &self.body)
            .finish()
    }
}

/// Sends a request and exposes the 2xx response body as a byte stream.
///
/// Implementations must turn non-2xx responses into
/// [`TransportError::Status`] and must not impose their own timeout.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn post(&self, request: HttpRequest) -> Result<ByteStream, TransportError>;
}

/// [`Transport`] backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Builds a client with no request timeout; deadlines come from the
    /// [`CallContext`] of each call.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("nuro/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post(&self, request: HttpRequest) -> Result<ByteStream, TransportError> {
        let mut builder = self.client.post(&request.url).json(&request.body);
        if let Some(key) = &request.bearer {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.to_string(),
                body: truncate_body(&body),
            });
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Read(e.to_string())));
        Ok(Box::pin(stream))
    }
}

/// Trims an error body and caps it at [`ERROR_BODY_LIMIT`] characters.
pub fn truncate_body(body: &str) -> String {
    let body = body.trim();
    match body.char_indices().nth(ERROR_BODY_LIMIT) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

/// Sends `request`, racing the exchange against `ctx`.
pub(crate) async fn open(
    transport: &dyn Transport,
    ctx: &CallContext,
    label: &'static str,
    request: HttpRequest,
) -> Result<ByteStream, CompletionError> {
    ctx.guard(transport.post(request))
        .await?
        .map_err(|e| CompletionError::from_transport(label, e))
}

/// Collects a whole body, racing the reads against `ctx`.
pub(crate) async fn read_to_end(
    ctx: &CallContext,
    label: &'static str,
    mut body: ByteStream,
) -> Result<Vec<u8>, CompletionError> {
    let collect = async {
        let mut buf = Vec::new();
        while let Some(chunk) = body.next().await {
            buf.extend_from_slice(&chunk?);
        }
        Ok::<_, TransportError>(buf)
    };
    ctx.guard(collect)
        .await?
        .map_err(|e| CompletionError::from_transport(label, e))
}
