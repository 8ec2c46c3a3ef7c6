//! Response classification.

use std::fmt;
use std::io::Read;
use std::time::Duration;

use serde::Deserialize;
use serde_json::value::RawValue;
use tracing::warn;

use crate::transport::TransportResponse;
use crate::{DocumentId, FeedError, Stats};

/// Outcome of a send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// The operation was applied.
    Success,
    /// The test-and-set condition did not match. Not an error.
    ConditionNotMet,
    /// The document API is overloaded, unavailable, or answered garbage.
    VespaFailure,
    /// No response, or a status code with no known meaning.
    TransportFailure,
}

/// Status codes with a specific meaning. Anything else is a transport failure.
const STATUS_CODES: &[(u16, Status)] = &[
    (200, Status::Success),
    (412, Status::ConditionNotMet),
    (502, Status::VespaFailure),
    (504, Status::VespaFailure),
    (507, Status::VespaFailure),
];

impl Status {
    /// Classify an HTTP status code.
    pub fn from_code(code: u16) -> Self {
        STATUS_CODES
            .iter()
            .find(|(c, _)| *c == code)
            .map(|(_, status)| *status)
            .unwrap_or(Status::TransportFailure)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Success => "success",
            Self::ConditionNotMet => "condition-not-met",
            Self::VespaFailure => "vespa-failure",
            Self::TransportFailure => "transport-failure",
        };
        f.write_str(name)
    }
}

#[derive(Deserialize)]
struct ResponseBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    trace: Option<Box<RawValue>>,
}

/// Everything known about one send.
///
/// Always fully populated, including on transport failure.
#[derive(Debug)]
pub struct SendResult {
    /// Id of the document sent.
    pub id: DocumentId,
    /// Status code, if a response was received.
    pub http_status: Option<u16>,
    /// Classified outcome.
    pub status: Status,
    /// `message` field of the response body.
    pub message: String,
    /// Raw JSON `trace` field of the response body, empty if absent.
    pub trace: String,
    /// Underlying error, if the send failed with one.
    pub error: Option<FeedError>,
    /// Counters for this send alone.
    pub stats: Stats,
}

impl SendResult {
    pub(crate) fn new(id: DocumentId) -> Self {
        Self {
            id,
            http_status: None,
            status: Status::TransportFailure,
            message: String::new(),
            trace: String::new(),
            error: None,
            stats: Stats {
                requests: 1,
                ..Stats::default()
            },
        }
    }

    /// Check if the operation was applied.
    pub fn is_success(&self) -> bool {
        self.status == Status::Success
    }

    /// Record a failure before any response was received.
    pub(crate) fn with_error(mut self, error: FeedError) -> Self {
        self.stats.errors += 1;
        self.status = Status::TransportFailure;
        self.error = Some(error);
        self
    }

    /// Drain and classify a response. `buf` receives the body.
    pub(crate) fn with_response(mut self, response: TransportResponse, buf: &mut Vec<u8>) -> Self {
        let code = response.status().as_u16();
        self.http_status = Some(code);
        self.status = Status::from_code(code);
        self.stats.responses += 1;
        self.stats.responses_by_code.insert(code, 1);

        let read = response.into_body().read_to_end(buf);
        self.stats.bytes_recv = buf.len() as u64;

        let decoded = read
            .map_err(FeedError::from)
            .and_then(|_| serde_json::from_slice::<ResponseBody>(buf).map_err(FeedError::from));
        match decoded {
            Ok(body) => {
                self.message = body.message.unwrap_or_default();
                self.trace = body.trace.map(|t| t.get().to_string()).unwrap_or_default();
            }
            Err(e) => {
                warn!(id = %self.id, status = code, error = %e, "Unreadable response body");
                self.status = Status::VespaFailure;
                self.error = Some(e);
            }
        }
        self
    }

    /// Record sizes and latency once the send is complete.
    pub(crate) fn finish(mut self, bytes_sent: usize, latency: Duration) -> Self {
        if self.http_status.is_some() {
            self.stats.bytes_sent = bytes_sent as u64;
            self.stats.total_latency = latency;
            self.stats.min_latency = latency;
            self.stats.max_latency = latency;
            if !self.is_success() {
                self.stats.errors += 1;
            }
        }
        self
    }
}
