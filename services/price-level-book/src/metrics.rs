//! Book processing metrics
//!
//! Counters for processed cycles, records and emitted level changes, plus a
//! sliding window of per-cycle processing latencies.

use std::collections::{BTreeMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::changes::ChangeSet;

/// Core metrics for one price level book.
pub struct BookMetrics {
    // Cycles
    pub cycles_processed: AtomicU64,
    pub snapshots_applied: AtomicU64,
    pub cycle_processing_ns: Mutex<LatencyWindow>,

    // Records
    pub records_processed: AtomicU64,
    pub records_ignored: AtomicU64,

    // Emitted level changes
    pub levels_added: AtomicU64,
    pub levels_updated: AtomicU64,
    pub levels_removed: AtomicU64,
}

impl BookMetrics {
    pub fn new() -> Self {
        Self {
            cycles_processed: AtomicU64::new(0),
            snapshots_applied: AtomicU64::new(0),
            cycle_processing_ns: Mutex::new(LatencyWindow::new(1000)),
            records_processed: AtomicU64::new(0),
            records_ignored: AtomicU64::new(0),
            levels_added: AtomicU64::new(0),
            levels_updated: AtomicU64::new(0),
            levels_removed: AtomicU64::new(0),
        }
    }

    /// Record a processed cycle.
    pub fn record_cycle(&self, records: usize, ignored: usize, latency_ns: u64) {
        self.cycles_processed.fetch_add(1, Ordering::Relaxed);
        self.records_processed.fetch_add(records as u64, Ordering::Relaxed);
        self.records_ignored.fetch_add(ignored as u64, Ordering::Relaxed);
        if let Ok(mut window) = self.cycle_processing_ns.lock() {
            window.record(latency_ns);
        }
    }

    /// Record a full-snapshot reset.
    pub fn record_snapshot(&self) {
        self.snapshots_applied.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the level changes emitted by an incremental cycle.
    pub fn record_changes(&self, changes: &ChangeSet) {
        self.levels_added.fetch_add(changes.additions.len() as u64, Ordering::Relaxed);
        self.levels_updated.fetch_add(changes.updates.len() as u64, Ordering::Relaxed);
        self.levels_removed.fetch_add(changes.removals.len() as u64, Ordering::Relaxed);
    }

    /// p99 cycle processing latency, if any cycle was recorded.
    pub fn processing_p99_ns(&self) -> Option<u64> {
        self.cycle_processing_ns
            .lock()
            .ok()
            .and_then(|window| window.percentile(99))
    }

    /// Export metrics as a BTreeMap for Prometheus-style exposition.
    pub fn export(&self) -> BTreeMap<String, u64> {
        let mut m = BTreeMap::new();
        m.insert("cycles_processed".to_string(), self.cycles_processed.load(Ordering::Relaxed));
        m.insert("snapshots_applied".to_string(), self.snapshots_applied.load(Ordering::Relaxed));
        m.insert("records_processed".to_string(), self.records_processed.load(Ordering::Relaxed));
        m.insert("records_ignored".to_string(), self.records_ignored.load(Ordering::Relaxed));
        m.insert("levels_added".to_string(), self.levels_added.load(Ordering::Relaxed));
        m.insert("levels_updated".to_string(), self.levels_updated.load(Ordering::Relaxed));
        m.insert("levels_removed".to_string(), self.levels_removed.load(Ordering::Relaxed));

        if let Ok(window) = self.cycle_processing_ns.lock() {
            m.insert("cycle_latency_samples".to_string(), window.len() as u64);
            if let (Some(p50), Some(p99), Some(mean)) = (window.percentile(50), window.percentile(99), window.mean()) {
                m.insert("cycle_latency_p50_ns".to_string(), p50);
                m.insert("cycle_latency_p99_ns".to_string(), p99);
                m.insert("cycle_latency_mean_ns".to_string(), mean);
            }
        }
        m
    }
}

impl Default for BookMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Sliding window of the most recent cycle latencies.
pub struct LatencyWindow {
    samples: VecDeque<u64>,
    capacity: usize,
}

impl LatencyWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn record(&mut self, ns: u64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(ns);
    }

    /// Nearest-rank percentile (0-100) of the window.
    pub fn percentile(&self, p: u8) -> Option<u64> {
        if self.samples.is_empty() {
            return None;
        }
        let mut sorted: Vec<u64> = self.samples.iter().copied().collect();
        sorted.sort_unstable();

        let n = sorted.len();
        let rank = (usize::from(p.min(100)) * n).div_ceil(100);
        Some(sorted[rank.clamp(1, n) - 1])
    }

    pub fn mean(&self) -> Option<u64> {
        let n = self.samples.len() as u64;
        (n > 0).then(|| self.samples.iter().sum::<u64>() / n)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
