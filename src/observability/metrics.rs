//! Index counters
//!
//! - Counters only, monotonic
//! - Thread-safe, Relaxed ordering
//! - Shared by every cursor bound to the same index

use std::sync::atomic::{AtomicU64, Ordering};

/// Operational counters for one attribute index and its cursors.
#[derive(Debug, Default)]
pub struct IndexMetrics {
    inserts: AtomicU64,
    removals: AtomicU64,
    seeks: AtomicU64,
    seek_misses: AtomicU64,
    positions_captured: AtomicU64,
    positions_restored: AtomicU64,
    positions_rejected: AtomicU64,
}

impl IndexMetrics {
    /// Create a registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_inserts(&self) {
        self.inserts.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_removals(&self) {
        self.removals.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a seek and whether it found a position.
    pub fn record_seek(&self, found: bool) {
        self.seeks.fetch_add(1, Ordering::Relaxed);
        if !found {
            self.seek_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn increment_positions_captured(&self) {
        self.positions_captured.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_positions_restored(&self) {
        self.positions_restored.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_positions_rejected(&self) {
        self.positions_rejected.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            inserts: self.inserts.load(Ordering::Relaxed),
            removals: self.removals.load(Ordering::Relaxed),
            seeks: self.seeks.load(Ordering::Relaxed),
            seek_misses: self.seek_misses.load(Ordering::Relaxed),
            positions_captured: self.positions_captured.load(Ordering::Relaxed),
            positions_restored: self.positions_restored.load(Ordering::Relaxed),
            positions_rejected: self.positions_rejected.load(Ordering::Relaxed),
        }
    }

    /// All counters as a JSON object
    pub fn to_json(&self) -> String {
        let snap = self.snapshot();
        serde_json::json!({
            "inserts": snap.inserts,
            "removals": snap.removals,
            "seeks": snap.seeks,
            "seek_misses": snap.seek_misses,
            "positions_captured": snap.positions_captured,
            "positions_restored": snap.positions_restored,
            "positions_rejected": snap.positions_rejected,
        })
        .to_string()
    }
}

/// A point-in-time snapshot of the index counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub inserts: u64,
    pub removals: u64,
    pub seeks: u64,
    pub seek_misses: u64,
    pub positions_captured: u64,
    pub positions_restored: u64,
    pub positions_rejected: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_at_zero() {
        let metrics = IndexMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_seek_misses_counted_separately() {
        let metrics = IndexMetrics::new();
        metrics.record_seek(true);
        metrics.record_seek(false);
        metrics.record_seek(false);

        let snap = metrics.snapshot();
        assert_eq!(snap.seeks, 3);
        assert_eq!(snap.seek_misses, 2);
    }

    #[test]
    fn test_to_json() {
        let metrics = IndexMetrics::new();
        metrics.increment_inserts();
        metrics.increment_positions_rejected();

        let parsed: serde_json::Value = serde_json::from_str(&metrics.to_json()).unwrap();
        assert_eq!(parsed["inserts"], 1);
        assert_eq!(parsed["positions_rejected"], 1);
        assert_eq!(parsed["removals"], 0);
    }
}
