//! Metrics registry for rosterdb
//!
//! - Counters only, monotonic, reset on process start
//! - Lock-free atomic increments

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Operational counters for the record store.
///
/// Relaxed ordering is sufficient; counters are never used for
/// synchronization.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    inserts: AtomicU64,
    duplicate_rejections: AtomicU64,
    validation_rejections: AtomicU64,
    gets: AtomicU64,
    lists: AtomicU64,
    updates_matched: AtomicU64,
    updates_modified: AtomicU64,
    deletes: AtomicU64,
    write_failures: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new metrics registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_inserts(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_duplicate_rejections(&self) {
        self.duplicate_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_validation_rejections(&self) {
        self.validation_rejections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_gets(&self) {
        self.gets.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_lists(&self) {
        self.lists.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an update outcome
    pub fn record_update(&self, matched: u64, modified: u64) {
        self.updates_matched.fetch_add(matched, Ordering::Relaxed);
        self.updates_modified.fetch_add(modified, Ordering::Relaxed);
    }

    pub fn add_deletes(&self, deleted: u64) {
        self.deletes.fetch_add(deleted, Ordering::Relaxed);
    }

    pub fn increment_write_failures(&self) {
        self.write_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all counters as a point-in-time snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            duplicate_rejections: self.duplicate_rejections.load(Ordering::Relaxed),
            validation_rejections: self.validation_rejections.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            lists: self.lists.load(Ordering::Relaxed),
            updates_matched: self.updates_matched.load(Ordering::Relaxed),
            updates_modified: self.updates_modified.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            write_failures: self.write_failures.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all metrics
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub inserts: u64,
    pub duplicate_rejections: u64,
    pub validation_rejections: u64,
    pub gets: u64,
    pub lists: u64,
    pub updates_matched: u64,
    pub updates_modified: u64,
    pub deletes: u64,
    pub write_failures: u64,
}
