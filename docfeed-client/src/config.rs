//! Feed client configuration.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::transport::CredentialProvider;
use crate::{FeedError, Result};

/// Local timeout used when no server-side timeout is configured.
pub const DEFAULT_CLIENT_TIMEOUT: Duration = Duration::from_secs(190);

/// Environment variable prefix used by [`ClientOptions::from_env`].
pub const ENV_PREFIX: &str = "DOCFEED";

/// When to gzip request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    /// Compress bodies larger than [`AUTO_COMPRESS_THRESHOLD`](crate::AUTO_COMPRESS_THRESHOLD).
    #[default]
    Auto,
    /// Never compress.
    None,
    /// Always compress.
    Gzip,
}

impl FromStr for Compression {
    type Err = FeedError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "none" => Ok(Self::None),
            "gzip" => Ok(Self::Gzip),
            other => Err(FeedError::Config(format!(
                "unknown compression {:?}, want auto, none or gzip",
                other
            ))),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Auto => write!(f, "auto"),
            Self::None => write!(f, "none"),
            Self::Gzip => write!(f, "gzip"),
        }
    }
}

/// Source of the current time, used for latency measurements.
pub trait Clock: Send + Sync {
    /// Current instant.
    fn now(&self) -> Instant;
}

/// Monotonic system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Feed client configuration.
///
/// `timeout`, `route`, `trace_level` and `compression` may be changed
/// between sends through the setters on [`Client`](crate::Client).
#[derive(Clone)]
pub struct ClientOptions {
    /// Base URL of the document API, e.g. `https://feed.example.com:8080`.
    pub base_url: String,
    /// Server-side timeout. Zero means unset.
    pub timeout: Duration,
    /// Route to send documents through.
    pub route: Option<String>,
    /// Server trace level, only sent when above zero.
    pub trace_level: Option<u32>,
    /// Request body compression.
    pub compression: Compression,
    /// Time source for latency measurement.
    pub clock: Arc<dyn Clock>,
    /// User agent string.
    pub user_agent: String,
    /// Extra headers added to every request.
    pub default_headers: Vec<(String, String)>,
    /// Supplier of the `Authorization` header.
    pub credentials: Option<Arc<dyn CredentialProvider>>,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            timeout: Duration::ZERO,
            route: None,
            trace_level: None,
            compression: Compression::Auto,
            clock: Arc::new(SystemClock),
            user_agent: format!("docfeed-client/{}", env!("CARGO_PKG_VERSION")),
            default_headers: Vec::new(),
            credentials: None,
        }
    }
}

impl fmt::Debug for ClientOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientOptions")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .field("route", &self.route)
            .field("trace_level", &self.trace_level)
            .field("compression", &self.compression)
            .field("user_agent", &self.user_agent)
            .field("default_headers", &self.default_headers)
            .field("credentials", &self.credentials.is_some())
            .finish()
    }
}

impl ClientOptions {
    /// Create a new configuration builder.
    pub fn builder() -> ClientOptionsBuilder {
        ClientOptionsBuilder::default()
    }

    /// Load options from `DOCFEED_*` environment variables.
    ///
    /// A `.env` file in the working directory is read first if it exists.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    /// Load options from `<prefix>_*` environment variables.
    ///
    /// Recognized keys are `BASE_URL`, `TIMEOUT_MS`, `ROUTE`, `TRACE_LEVEL`
    /// and `COMPRESSION`. Missing keys keep their defaults.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self> {
        let var = |key: &str| env::var(format!("{}_{}", prefix, key)).ok();
        let mut options = Self::default();

        if let Some(base_url) = var("BASE_URL") {
            options.base_url = base_url;
        }
        if let Some(timeout) = var("TIMEOUT_MS") {
            let millis: u64 = timeout.trim().parse().map_err(|_| {
                FeedError::Config(format!("{}_TIMEOUT_MS: not a number: {:?}", prefix, timeout))
            })?;
            options.timeout = Duration::from_millis(millis);
        }
        if let Some(route) = var("ROUTE") {
            options.route = Some(route).filter(|r| !r.is_empty());
        }
        if let Some(level) = var("TRACE_LEVEL") {
            let level: u32 = level.trim().parse().map_err(|_| {
                FeedError::Config(format!("{}_TRACE_LEVEL: not a number: {:?}", prefix, level))
            })?;
            options.trace_level = Some(level);
        }
        if let Some(compression) = var("COMPRESSION") {
            options.compression = compression.parse()?;
        }

        Ok(options)
    }

    /// Local timeout for a single call.
    ///
    /// Kept slightly above the server-side timeout so the server gets to fail
    /// the request first.
    pub fn client_timeout(&self) -> Duration {
        if self.timeout.is_zero() {
            return DEFAULT_CLIENT_TIMEOUT;
        }
        self.timeout
            .checked_mul(11)
            .map(|t| t / 10)
            .and_then(|t| t.checked_add(Duration::from_millis(1000)))
            .unwrap_or(Duration::MAX)
    }
}

/// Builder for [`ClientOptions`].
#[derive(Default)]
pub struct ClientOptionsBuilder {
    options: ClientOptions,
}

impl ClientOptionsBuilder {
    /// Set the base URL of the document API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.options.base_url = url.into();
        self
    }

    /// Set the server-side timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = timeout;
        self
    }

    /// Set the route.
    pub fn route(mut self, route: impl Into<String>) -> Self {
        self.options.route = Some(route.into());
        self
    }

    /// Set the server trace level.
    pub fn trace_level(mut self, level: u32) -> Self {
        self.options.trace_level = Some(level);
        self
    }

    /// Set the compression mode.
    pub fn compression(mut self, compression: Compression) -> Self {
        self.options.compression = compression;
        self
    }

    /// Set the time source.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.options.clock = clock;
        self
    }

    /// Set the user agent string.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.options.user_agent = user_agent.into();
        self
    }

    /// Add a header sent with every request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.default_headers.push((name.into(), value.into()));
        self
    }

    /// Set the credential provider.
    pub fn credentials(mut self, provider: Arc<dyn CredentialProvider>) -> Self {
        self.options.credentials = Some(provider);
        self
    }

    /// Build the options.
    pub fn build(self) -> ClientOptions {
        self.options
    }
}
