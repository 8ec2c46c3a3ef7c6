//! Least-busy transport selection.
//!
//! Every transport carries an inflight counter. A selection scans all
//! transports for the smallest counter, starting the scan at a rotating
//! offset so that ties are spread evenly instead of always landing on the
//! first transport.
//!
//! Selection is O(n) in the number of transports with atomic reads only;
//! there is no lock around the whole set.

use std::ops::Deref;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

use crate::transport::Transport;
use crate::{FeedError, Result};

/// A transport together with its inflight request count.
pub struct TransportHandle {
    index: usize,
    transport: Box<dyn Transport>,
    inflight: AtomicI64,
}

impl TransportHandle {
    fn new(index: usize, transport: Box<dyn Transport>) -> Self {
        Self {
            index,
            transport,
            inflight: AtomicI64::new(0),
        }
    }

    /// Position of this transport in the selector.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// The wrapped transport.
    #[inline]
    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    /// Requests currently dispatched on this transport.
    #[inline]
    pub fn inflight(&self) -> i64 {
        self.inflight.load(Ordering::Relaxed)
    }

    #[inline]
    pub(crate) fn add_inflight(&self, n: i64) {
        self.inflight.fetch_add(n, Ordering::Relaxed);
    }
}

impl std::fmt::Debug for TransportHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransportHandle")
            .field("index", &self.index)
            .field("inflight", &self.inflight())
            .finish()
    }
}

/// Chooses the least busy of a fixed set of transports.
#[derive(Debug)]
pub struct TransportSelector {
    handles: Vec<TransportHandle>,
    rotation: AtomicUsize,
}

impl TransportSelector {
    /// Create a selector. Fails if `transports` is empty.
    pub fn new(transports: Vec<Box<dyn Transport>>) -> Result<Self> {
        if transports.is_empty() {
            return Err(FeedError::NoTransports);
        }
        let handles = transports
            .into_iter()
            .enumerate()
            .map(|(index, transport)| TransportHandle::new(index, transport))
            .collect();

        Ok(Self {
            handles,
            rotation: AtomicUsize::new(0),
        })
    }

    /// Number of transports.
    #[inline]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    /// Always false; a selector holds at least one transport.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Get a handle by index.
    #[inline]
    pub fn handle(&self, index: usize) -> Option<&TransportHandle> {
        self.handles.get(index)
    }

    /// Current inflight count of every transport, by index.
    pub fn distribution(&self) -> Vec<i64> {
        self.handles.iter().map(TransportHandle::inflight).collect()
    }

    /// Reserve the least busy transport.
    ///
    /// The reservation is released when the returned guard is dropped.
    pub fn acquire(&self) -> InflightGuard<'_> {
        let n = self.handles.len();
        let start = self.rotation.fetch_add(1, Ordering::Relaxed).wrapping_add(1) % n;

        let mut selected = &self.handles[start];
        let mut min = i64::MAX;
        for i in 0..n {
            let handle = &self.handles[(start + i) % n];
            let inflight = handle.inflight();
            if inflight < min {
                min = inflight;
                selected = handle;
            }
        }

        selected.add_inflight(1);
        InflightGuard { handle: selected }
    }
}

/// RAII reservation of a transport.
///
/// Decrements the transport's inflight count exactly once, when dropped.
pub struct InflightGuard<'a> {
    handle: &'a TransportHandle,
}

impl Deref for InflightGuard<'_> {
    type Target = TransportHandle;

    fn deref(&self) -> &TransportHandle {
        self.handle
    }
}

impl Drop for InflightGuard<'_> {
    fn drop(&mut self) {
        self.handle.add_inflight(-1);
    }
}
