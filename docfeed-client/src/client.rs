//! Feed client.

use std::fmt;
use std::time::Duration;

use http::{HeaderMap, HeaderValue};
use tracing::{debug, warn};

use crate::balancer::TransportSelector;
use crate::compression::{self, GzipCompressor};
use crate::pool::ObjectPool;
use crate::request::{self, method_and_url};
use crate::transport::Transport;
use crate::{ClientOptions, Compression, Document, FeedError, Result, SendResult};

/// Idle encoders and buffers kept per client.
const POOL_SIZE: usize = 64;

/// Client that sends documents over a set of transports.
///
/// `send` takes `&self` and may be called from any number of threads at
/// once. Every send goes to the least busy transport.
pub struct Client {
    options: ClientOptions,
    headers: HeaderMap,
    selector: TransportSelector,
    compressors: ObjectPool<GzipCompressor>,
    buffers: ObjectPool<Vec<u8>>,
}

impl Client {
    /// Create a client.
    ///
    /// Fails if `transports` is empty, the base URL is not an absolute
    /// http(s) URL, or a configured header is invalid.
    pub fn new<I>(options: ClientOptions, transports: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Transport + 'static,
    {
        validate_base_url(&options.base_url)?;
        let headers = request::base_headers(&options)?;
        let selector = TransportSelector::new(
            transports
                .into_iter()
                .map(|t| Box::new(t) as Box<dyn Transport>)
                .collect(),
        )?;

        debug!(
            base_url = %options.base_url,
            transports = selector.len(),
            compression = %options.compression,
            "Created feed client"
        );

        Ok(Self {
            options,
            headers,
            selector,
            compressors: ObjectPool::new(POOL_SIZE),
            buffers: ObjectPool::new(POOL_SIZE),
        })
    }

    /// Get the client options.
    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Set the server-side timeout. Zero unsets it.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.options.timeout = timeout;
    }

    /// Set or clear the route.
    pub fn set_route(&mut self, route: Option<String>) {
        self.options.route = route;
    }

    /// Set or clear the server trace level.
    pub fn set_trace_level(&mut self, level: Option<u32>) {
        self.options.trace_level = level;
    }

    /// Set the body compression mode.
    pub fn set_compression(&mut self, compression: Compression) {
        self.options.compression = compression;
    }

    /// Number of transports.
    pub fn transport_count(&self) -> usize {
        self.selector.len()
    }

    /// Current inflight count of every transport.
    pub fn inflight_distribution(&self) -> Vec<i64> {
        self.selector.distribution()
    }

    /// Send a document.
    ///
    /// Never fails; every problem is reported through the returned
    /// [`SendResult`].
    pub fn send(&self, document: &Document) -> SendResult {
        let clock = &self.options.clock;
        let start = clock.now();
        let result = SendResult::new(document.id.clone());
        let (method, url) = method_and_url(&self.options, document);

        let payload = match compression::encode(
            &document.body,
            self.options.compression,
            &self.compressors,
            &self.buffers,
        ) {
            Ok(payload) => payload,
            Err(e) => return self.failed(result, e),
        };
        let request = match self.authorization().and_then(|authorization| {
            request::build(
                method,
                &url,
                &self.headers,
                authorization,
                payload.is_gzipped(),
                payload.as_bytes(),
            )
        }) {
            Ok(request) => request,
            Err(e) => return self.failed(result, e),
        };

        let result = {
            let handle = self.selector.acquire();
            debug!(
                id = %document.id,
                method = %request.method(),
                url = %url,
                transport = handle.index(),
                gzip = payload.is_gzipped(),
                "Dispatching document"
            );
            match handle.transport().execute(&request, self.options.client_timeout()) {
                Ok(response) => {
                    let mut buf = self.buffers.acquire();
                    result.with_response(response, &mut buf)
                }
                Err(e) => {
                    warn!(id = %document.id, transport = handle.index(), error = %e, "Transport failure");
                    result.with_error(e)
                }
            }
        };

        let latency = clock.now().saturating_duration_since(start);
        result.finish(document.body.len(), latency)
    }

    fn authorization(&self) -> Result<Option<HeaderValue>> {
        self.options
            .credentials
            .as_ref()
            .map(|provider| provider.authorization())
            .transpose()
    }

    fn failed(&self, result: SendResult, error: FeedError) -> SendResult {
        warn!(id = %result.id, error = %error, "Could not prepare request");
        result.with_error(error)
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("options", &self.options)
            .field("selector", &self.selector)
            .finish()
    }
}

fn validate_base_url(base_url: &str) -> Result<()> {
    let url = url::Url::parse(base_url)
        .map_err(|e| FeedError::InvalidUrl(format!("{:?}: {}", base_url, e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(FeedError::InvalidUrl(format!(
            "{:?}: unsupported scheme {:?}",
            base_url, scheme
        ))),
    }
}
