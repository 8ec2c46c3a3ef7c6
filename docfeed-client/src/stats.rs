//! Mergeable send statistics.

use serde::Serialize;
use std::collections::BTreeMap;
use std::iter::Sum;
use std::ops::AddAssign;
use std::time::Duration;

/// Counters for one or more sends.
///
/// A single send produces one `Stats`; totals for a feed are built by
/// merging them with [`Stats::add`]. Merging is associative and commutative,
/// and `Stats::default()` is its identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Requests attempted.
    pub requests: u64,
    /// Responses received.
    pub responses: u64,
    /// Sends that did not end in success.
    pub errors: u64,
    /// Requests in flight, maintained by callers that track dispatch.
    pub inflight: u64,
    /// Responses received per HTTP status code.
    pub responses_by_code: BTreeMap<u16, u64>,
    /// Sum of all latencies.
    pub total_latency: Duration,
    /// Smallest latency seen. Zero means none recorded.
    pub min_latency: Duration,
    /// Largest latency seen.
    pub max_latency: Duration,
    /// Uncompressed body bytes sent.
    pub bytes_sent: u64,
    /// Response body bytes read.
    pub bytes_recv: u64,
}

impl Stats {
    /// Merge `other` into `self`.
    pub fn add(&mut self, other: &Stats) {
        self.requests += other.requests;
        self.responses += other.responses;
        self.errors += other.errors;
        self.inflight += other.inflight;
        for (code, count) in &other.responses_by_code {
            *self.responses_by_code.entry(*code).or_insert(0) += count;
        }
        self.total_latency += other.total_latency;
        if self.min_latency.is_zero()
            || (!other.min_latency.is_zero() && other.min_latency < self.min_latency)
        {
            self.min_latency = other.min_latency;
        }
        self.max_latency = self.max_latency.max(other.max_latency);
        self.bytes_sent += other.bytes_sent;
        self.bytes_recv += other.bytes_recv;
    }

    /// Number of `200 OK` responses.
    pub fn successful(&self) -> u64 {
        self.responses_by_code.get(&200).copied().unwrap_or(0)
    }

    /// Requests that did not get a `200 OK`.
    pub fn unsuccessful(&self) -> u64 {
        self.requests.saturating_sub(self.successful())
    }

    /// Mean latency over all responses, if any.
    pub fn average_latency(&self) -> Option<Duration> {
        if self.responses == 0 {
            return None;
        }
        let nanos = self.total_latency.as_nanos() / u128::from(self.responses);
        Some(Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX)))
    }
}

impl AddAssign<&Stats> for Stats {
    fn add_assign(&mut self, other: &Stats) {
        Stats::add(self, other);
    }
}

impl AddAssign for Stats {
    fn add_assign(&mut self, other: Stats) {
        Stats::add(self, &other);
    }
}

impl Sum for Stats {
    fn sum<I: Iterator<Item = Stats>>(iter: I) -> Stats {
        iter.fold(Stats::default(), |mut total, stats| {
            total += &stats;
            total
        })
    }
}

impl<'a> Sum<&'a Stats> for Stats {
    fn sum<I: Iterator<Item = &'a Stats>>(iter: I) -> Stats {
        iter.fold(Stats::default(), |mut total, stats| {
            total += stats;
            total
        })
    }
}
