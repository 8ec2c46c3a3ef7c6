//! Transport and credential boundaries.
//!
//! The client never talks to the network itself. It hands fully built
//! requests to a [`Transport`] and reads whatever response comes back.
//! [`ReqwestTransport`] is the production implementation; tests and
//! embedders may plug in their own.

use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use base64::Engine;
use http::HeaderValue;

use crate::{FeedError, Result};

/// Request handed to a transport. The body borrows from the document or
/// from a pooled compression buffer.
pub type TransportRequest<'a> = http::Request<&'a [u8]>;

/// Response body. The client drains it completely.
pub type ResponseBody = Box<dyn Read + Send>;

/// Response returned by a transport.
pub type TransportResponse = http::Response<ResponseBody>;

/// Something that can execute an HTTP request within a timeout.
///
/// Implementations are shared between all threads sending through a client.
pub trait Transport: Send + Sync {
    /// Execute `request`, giving up after `timeout`.
    ///
    /// An `Err` means no response was received at all.
    fn execute(&self, request: &TransportRequest<'_>, timeout: Duration) -> Result<TransportResponse>;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn execute(&self, request: &TransportRequest<'_>, timeout: Duration) -> Result<TransportResponse> {
        (**self).execute(request, timeout)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn execute(&self, request: &TransportRequest<'_>, timeout: Duration) -> Result<TransportResponse> {
        (**self).execute(request, timeout)
    }
}

/// Supplier of the `Authorization` header value.
///
/// Token acquisition and refresh live behind this trait; the client asks
/// for a value once per request.
pub trait CredentialProvider: Send + Sync {
    /// Current `Authorization` header value.
    fn authorization(&self) -> Result<HeaderValue>;
}

/// Fixed credential.
#[derive(Debug, Clone)]
pub struct StaticToken {
    value: HeaderValue,
}

impl StaticToken {
    /// Bearer token credential.
    pub fn bearer(token: impl AsRef<str>) -> Result<Self> {
        Self::from_value(format!("Bearer {}", token.as_ref()))
    }

    /// HTTP basic credential.
    pub fn basic(username: impl AsRef<str>, password: impl AsRef<str>) -> Result<Self> {
        let credentials = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", username.as_ref(), password.as_ref()));
        Self::from_value(format!("Basic {}", credentials))
    }

    fn from_value(value: String) -> Result<Self> {
        let mut value = HeaderValue::try_from(value)
            .map_err(|e| FeedError::Credentials(e.to_string()))?;
        value.set_sensitive(true);
        Ok(Self { value })
    }
}

impl CredentialProvider for StaticToken {
    fn authorization(&self) -> Result<HeaderValue> {
        Ok(self.value.clone())
    }
}

/// Blocking transport backed by a `reqwest` client.
///
/// Connection pooling and TLS are handled by reqwest. Give each transport
/// its own client to spread load over separate connection pools.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    inner: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Create a transport with default connection settings.
    pub fn new() -> Result<Self> {
        let inner = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(32)
            .build()?;
        Ok(Self { inner })
    }

    /// Wrap an existing client.
    pub fn from_client(inner: reqwest::blocking::Client) -> Self {
        Self { inner }
    }
}

impl Transport for ReqwestTransport {
    fn execute(&self, request: &TransportRequest<'_>, timeout: Duration) -> Result<TransportResponse> {
        let response = self
            .inner
            .request(request.method().clone(), request.uri().to_string())
            .headers(request.headers().clone())
            .body(request.body().to_vec())
            .timeout(timeout)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    FeedError::Timeout(timeout)
                } else {
                    FeedError::Http(e)
                }
            })?;

        let mut builder = http::Response::builder().status(response.status());
        if let Some(headers) = builder.headers_mut() {
            *headers = response.headers().clone();
        }
        builder
            .body(Box::new(response) as ResponseBody)
            .map_err(|e| FeedError::Transport(e.to_string()))
    }
}
