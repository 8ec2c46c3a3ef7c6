// Docfeed - high-throughput document feeding over HTTP
//
// This library turns document operations into document API requests and
// spreads them over a set of transports, with gzip compression and
// per-request statistics.

// Re-export the client crate
pub use docfeed_client::*;

/// Prelude for common imports.
///
/// ```
/// use docfeed::prelude::*;
/// ```
pub mod prelude {
    pub use docfeed_client::prelude::*;
}
