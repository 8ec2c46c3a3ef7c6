//! Test doubles for transports and clocks.

use std::collections::VecDeque;
use std::io::{self, Cursor, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use http::{HeaderMap, Method};
use parking_lot::Mutex;

use crate::config::Clock;
use crate::transport::{ResponseBody, Transport, TransportRequest, TransportResponse};
use crate::{FeedError, Result};

/// Copy of a request seen by [`MockTransport`].
#[derive(Debug, Clone)]
pub(crate) struct RecordedRequest {
    pub(crate) method: Method,
    pub(crate) uri: String,
    pub(crate) headers: HeaderMap,
    pub(crate) body: Vec<u8>,
}

enum Reply {
    Response(u16, Vec<u8>),
    BrokenBody(u16),
    Error(FeedError),
}

struct BrokenReader;

impl Read for BrokenReader {
    fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::ConnectionReset, "connection reset"))
    }
}

/// Transport that answers from a script.
///
/// Replies are consumed in order. Once the script is empty every request
/// gets `200 {"message":"ok"}`.
pub(crate) struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<RecordedRequest>>,
    requests: AtomicUsize,
    delay: Duration,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            requests: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Sleep this long in every `execute`.
    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn next_response(&self, status: u16, body: &str) {
        self.replies
            .lock()
            .push_back(Reply::Response(status, body.as_bytes().to_vec()));
    }

    /// Respond with `status` and a body that fails on the first read.
    pub(crate) fn next_broken_body(&self, status: u16) {
        self.replies.lock().push_back(Reply::BrokenBody(status));
    }

    pub(crate) fn next_error(&self, error: FeedError) {
        self.replies.lock().push_back(Reply::Error(error));
    }

    pub(crate) fn last_request(&self) -> Option<RecordedRequest> {
        self.last.lock().clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl Transport for MockTransport {
    fn execute(&self, request: &TransportRequest<'_>, _timeout: Duration) -> Result<TransportResponse> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        *self.last.lock() = Some(RecordedRequest {
            method: request.method().clone(),
            uri: request.uri().to_string(),
            headers: request.headers().clone(),
            body: request.body().to_vec(),
        });
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        let reply = self
            .replies
            .lock()
            .pop_front()
            .unwrap_or_else(|| Reply::Response(200, br#"{"message":"ok"}"#.to_vec()));

        let (status, body): (u16, ResponseBody) = match reply {
            Reply::Response(status, body) => (status, Box::new(Cursor::new(body))),
            Reply::BrokenBody(status) => (status, Box::new(BrokenReader)),
            Reply::Error(error) => return Err(error),
        };
        http::Response::builder()
            .status(status)
            .body(body)
            .map_err(|e| FeedError::Transport(e.to_string()))
    }
}

/// Clock that advances by a fixed tick on every reading.
pub(crate) struct ManualClock {
    now: Mutex<Instant>,
    tick: Duration,
}

impl ManualClock {
    pub(crate) fn new(tick: Duration) -> Self {
        Self {
            now: Mutex::new(Instant::now()),
            tick,
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        let mut now = self.now.lock();
        *now += self.tick;
        *now
    }
}
