use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Duration;

const LATENCY_WINDOW: usize = 10_000;

pub struct Observability {
    connections_total: AtomicU64,
    requests_total: AtomicU64,
    request_errors_total: AtomicU64,
    metadata_reads_total: AtomicU64,
    metadata_read_failures_total: AtomicU64,
    orphaned_partitions_total: AtomicU64,
    request_latency_us: Mutex<VecDeque<u64>>,
}

/// Point-in-time copy of the counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservabilitySnapshot {
    pub connections_total: u64,
    pub requests_total: u64,
    pub request_errors_total: u64,
    pub metadata_reads_total: u64,
    pub metadata_read_failures_total: u64,
    pub orphaned_partitions_total: u64,
    pub request_latency_p99_us: u64,
}

impl Observability {
    fn new() -> Self {
        Self {
            connections_total: AtomicU64::new(0),
            requests_total: AtomicU64::new(0),
            request_errors_total: AtomicU64::new(0),
            metadata_reads_total: AtomicU64::new(0),
            metadata_read_failures_total: AtomicU64::new(0),
            orphaned_partitions_total: AtomicU64::new(0),
            request_latency_us: Mutex::new(VecDeque::with_capacity(LATENCY_WINDOW)),
        }
    }

    pub fn record_connection(&self) {
        self.connections_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_request(&self, latency: Duration, ok: bool) {
        self.requests_total.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.request_errors_total.fetch_add(1, Ordering::Relaxed);
        }
        let us = latency.as_micros() as u64;
        let mut window = self.request_latency_us.lock();
        if window.len() >= LATENCY_WINDOW {
            window.pop_front();
        }
        window.push_back(us);
    }

    pub fn record_metadata_read(&self, ok: bool, orphaned_partitions: usize) {
        self.metadata_reads_total.fetch_add(1, Ordering::Relaxed);
        if !ok {
            self.metadata_read_failures_total
                .fetch_add(1, Ordering::Relaxed);
        }
        self.orphaned_partitions_total
            .fetch_add(orphaned_partitions as u64, Ordering::Relaxed);
    }

    fn p99_latency_us(&self) -> u64 {
        let window = self.request_latency_us.lock();
        if window.is_empty() {
            return 0;
        }
        let mut v: Vec<u64> = window.iter().copied().collect();
        v.sort_unstable();
        let idx = ((v.len() as f64) * 0.99).floor() as usize;
        v[idx.min(v.len() - 1)]
    }

    pub fn snapshot(&self) -> ObservabilitySnapshot {
        ObservabilitySnapshot {
            connections_total: self.connections_total.load(Ordering::Relaxed),
            requests_total: self.requests_total.load(Ordering::Relaxed),
            request_errors_total: self.request_errors_total.load(Ordering::Relaxed),
            metadata_reads_total: self.metadata_reads_total.load(Ordering::Relaxed),
            metadata_read_failures_total: self
                .metadata_read_failures_total
                .load(Ordering::Relaxed),
            orphaned_partitions_total: self.orphaned_partitions_total.load(Ordering::Relaxed),
            request_latency_p99_us: self.p99_latency_us(),
        }
    }
}

static OBS: OnceLock<Observability> = OnceLock::new();

/// Process-wide counters. Only ever incremented; nothing in the request path
/// reads them back.
pub fn observability() -> &'static Observability {
    OBS.get_or_init(Observability::new)
}
