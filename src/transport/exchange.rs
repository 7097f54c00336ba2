use crate::config::BackendConfig;
use crate::error::TransportError;
use crate::transport::http_client::build_http_client;
use futures_util::{Stream, StreamExt, stream};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Vec<u8>, TransportError>> + Send + 'static>>;

pub type TransportFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, TransportError>> + Send + 'a>>;

/// A successful exchange whose body has not been consumed yet.
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: ByteStream,
}

impl std::fmt::Debug for RawResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawResponse")
            .field("status", &self.status)
            .field("content_type", &self.content_type)
            .finish_non_exhaustive()
    }
}

impl RawResponse {
    pub fn from_chunks(status: u16, content_type: Option<&str>, chunks: Vec<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: content_type.map(str::to_string),
            body: Box::pin(stream::iter(chunks.into_iter().map(Ok))),
        }
    }

    pub fn from_bytes(status: u16, content_type: Option<&str>, body: impl Into<Vec<u8>>) -> Self {
        Self::from_chunks(status, content_type, vec![body.into()])
    }

    /// Drain the body into a string. Invalid UTF-8 is replaced, not rejected.
    pub async fn text(mut self, cancel: &CancellationToken) -> Result<String, TransportError> {
        let mut bytes = Vec::new();
        loop {
            let next = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(TransportError::Cancelled),
                next = self.body.next() => next,
            };
            match next {
                Some(chunk) => bytes.extend_from_slice(&chunk?),
                None => break,
            }
        }
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

/// One cancellable request/response exchange per call.
///
/// Implementations must return `TransportError::Cancelled` (and nothing else)
/// once `cancel` fires, and `TransportError::Status` with the untouched body
/// for any non-success status.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        url: &'a str,
        payload: &'a Value,
        cancel: &'a CancellationToken,
    ) -> TransportFuture<'a, RawResponse>;
}

pub struct HttpTransport {
    /// Pre-computed `"Bearer <key>"` header value.
    cached_auth_header: Option<String>,
    client: Client,
}

impl HttpTransport {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            cached_auth_header: config
                .api_key
                .as_deref()
                .filter(|k| !k.is_empty())
                .map(|k| format!("Bearer {k}")),
            client: build_http_client(config),
        }
    }

    pub fn with_client(client: Client, api_key: Option<&str>) -> Self {
        Self {
            cached_auth_header: api_key.map(|k| format!("Bearer {k}")),
            client,
        }
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        url: &'a str,
        payload: &'a Value,
        cancel: &'a CancellationToken,
    ) -> TransportFuture<'a, RawResponse> {
        Box::pin(async move {
            if cancel.is_cancelled() {
                return Err(TransportError::Cancelled);
            }

            let body = serde_json::to_vec(payload)
                .map_err(|e| TransportError::Encode(e.to_string()))?;
            let mut request = self
                .client
                .post(url)
                .header(CONTENT_TYPE, "application/json")
                .body(body);
            if let Some(auth) = &self.cached_auth_header {
                request = request.header(AUTHORIZATION, auth);
            }

            tracing::debug!(url, "sending request");
            let response = tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(TransportError::Cancelled),
                result = request.send() => result.map_err(|e| TransportError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                })?,
            };

            let status = response.status();
            if !status.is_success() {
                let body = tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Err(TransportError::Cancelled),
                    body = response.text() => body.map_err(|e| TransportError::Read(e.to_string()))?,
                };
                tracing::debug!(url, status = status.as_u16(), "request rejected");
                return Err(TransportError::Status {
                    status: status.as_u16(),
                    body,
                });
            }

            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string);
            let body = response.bytes_stream().map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| TransportError::Read(e.to_string()))
            });

            Ok(RawResponse {
                status: status.as_u16(),
                content_type,
                body: Box::pin(body),
            })
        })
    }
}
