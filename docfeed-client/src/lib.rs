//! # Docfeed Client
//!
//! A concurrent HTTP client for feeding documents to a `document/v1` style
//! document API at high throughput.
//!
//! ## Features
//!
//! - **Request Building**: Put, update and remove operations mapped to method, path and query
//! - **Least-Busy Dispatch**: Requests spread over several transports by inflight count
//! - **Compression**: Gzip request bodies with pooled encoders
//! - **Classification**: Responses turned into a semantic status with mergeable statistics
//! - **Pluggable Transports**: Blocking `reqwest` transport included, bring your own for tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docfeed_client::{Client, ClientOptions, Document, DocumentId, ReqwestTransport};
//! use std::time::Duration;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = ClientOptions::builder()
//!         .base_url("https://feed.example.com:8080")
//!         .timeout(Duration::from_secs(5))
//!         .build();
//!     let transports = vec![ReqwestTransport::new()?, ReqwestTransport::new()?];
//!     let client = Client::new(options, transports)?;
//!
//!     let id: DocumentId = "id:music:album::bad".parse()?;
//!     let result = client.send(&Document::put(id, r#"{"fields":{"title":"Bad"}}"#));
//!     println!("{}: {}", result.status, result.message);
//!     Ok(())
//! }
//! ```
//!
//! ## Aggregating Statistics
//!
//! ```rust,no_run
//! use docfeed_client::prelude::*;
//!
//! fn feed(client: &Client, docs: &[Document]) -> Stats {
//!     docs.iter().map(|doc| client.send(doc).stats).sum()
//! }
//! ```

mod balancer;
mod client;
mod compression;
mod config;
mod document;
mod error;
mod pool;
mod request;
mod response;
mod stats;
mod transport;

#[cfg(test)]
mod testing;

pub use balancer::{InflightGuard, TransportHandle, TransportSelector};
pub use client::Client;
pub use compression::{AUTO_COMPRESS_THRESHOLD, GzipCompressor};
pub use config::{
    Clock, ClientOptions, ClientOptionsBuilder, Compression, DEFAULT_CLIENT_TIMEOUT, ENV_PREFIX,
    SystemClock,
};
pub use document::{Document, DocumentId, Operation};
pub use error::{FeedError, Result};
pub use pool::{MAX_POOLED_BUFFER_CAPACITY, ObjectPool, PoolStats, Poolable, Pooled};
pub use request::method_and_url;
pub use response::{SendResult, Status};
pub use stats::Stats;
pub use transport::{
    CredentialProvider, ReqwestTransport, ResponseBody, StaticToken, Transport, TransportRequest,
    TransportResponse,
};

// Re-export common types
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use docfeed_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::client::Client;
    pub use crate::config::{ClientOptions, ClientOptionsBuilder, Compression};
    pub use crate::document::{Document, DocumentId, Operation};
    pub use crate::error::{FeedError, Result};
    pub use crate::response::{SendResult, Status};
    pub use crate::stats::Stats;
    pub use crate::transport::{CredentialProvider, ReqwestTransport, StaticToken, Transport};
}
