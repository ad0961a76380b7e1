//! Engine statistics: atomic counters updated on the matching path,
//! readable from any thread.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters the engine updates as it runs.
///
/// Shared via `Arc` between the engine thread and observers; every update
/// is a relaxed atomic, so reading a snapshot never perturbs matching.
#[derive(Debug, Default)]
pub struct EngineStats {
    /// Orders taken off the intake ring and matched.
    orders_processed: AtomicU64,
    /// Trades committed to the trade ring.
    trades_emitted: AtomicU64,
    /// Intake slots discarded for failing the validity predicate.
    corrupt_slots: AtomicU64,
    /// Orders dropped because their fingerprint was not registered.
    unknown_symbol_drops: AtomicU64,
    /// Times the trade ring refused a fill (before retries succeeded or
    /// the engine halted).
    trade_ring_full_events: AtomicU64,
    /// Latency of the most recent engine iteration, in nanoseconds.
    last_latency_ns: AtomicU64,
    /// Worst iteration latency observed, in nanoseconds.
    max_latency_ns: AtomicU64,
    /// Sum of all iteration latencies, in nanoseconds.
    total_latency_ns: AtomicU64,
}

/// A point-in-time copy of [`EngineStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Orders taken off the intake ring and matched.
    pub orders_processed: u64,
    /// Trades committed to the trade ring.
    pub trades_emitted: u64,
    /// Intake slots discarded for failing the validity predicate.
    pub corrupt_slots: u64,
    /// Orders dropped because their fingerprint was not registered.
    pub unknown_symbol_drops: u64,
    /// Times the trade ring refused a fill.
    pub trade_ring_full_events: u64,
    /// Latency of the most recent engine iteration, in nanoseconds.
    pub last_latency_ns: u64,
    /// Worst iteration latency observed, in nanoseconds.
    pub max_latency_ns: u64,
    /// Mean iteration latency, in nanoseconds.
    pub avg_latency_ns: u64,
}

impl EngineStats {
    /// Fresh zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_order(&self) {
        self.orders_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_trades(&self, count: u64) {
        self.trades_emitted.fetch_add(count, Ordering::Relaxed);
    }

    pub(crate) fn record_corrupt_slots(&self, total: u64) {
        // The ring reports a running total, not a delta.
        self.corrupt_slots.store(total, Ordering::Relaxed);
    }

    pub(crate) fn record_unknown_symbol(&self) {
        self.unknown_symbol_drops.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_trade_ring_full(&self) {
        self.trade_ring_full_events.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_latency(&self, nanos: u64) {
        self.last_latency_ns.store(nanos, Ordering::Relaxed);
        self.max_latency_ns.fetch_max(nanos, Ordering::Relaxed);
        self.total_latency_ns.fetch_add(nanos, Ordering::Relaxed);
    }

    /// Orders processed so far.
    pub fn orders_processed(&self) -> u64 {
        self.orders_processed.load(Ordering::Relaxed)
    }

    /// Trades emitted so far.
    pub fn trades_emitted(&self) -> u64 {
        self.trades_emitted.load(Ordering::Relaxed)
    }

    /// Orders dropped for an unregistered fingerprint.
    pub fn unknown_symbol_drops(&self) -> u64 {
        self.unknown_symbol_drops.load(Ordering::Relaxed)
    }

    /// Capture a coherent-enough copy of all counters.
    pub fn snapshot(&self) -> StatsSnapshot {
        let orders = self.orders_processed.load(Ordering::Relaxed);
        let total_latency = self.total_latency_ns.load(Ordering::Relaxed);
        StatsSnapshot {
            orders_processed: orders,
            trades_emitted: self.trades_emitted.load(Ordering::Relaxed),
            corrupt_slots: self.corrupt_slots.load(Ordering::Relaxed),
            unknown_symbol_drops: self.unknown_symbol_drops.load(Ordering::Relaxed),
            trade_ring_full_events: self.trade_ring_full_events.load(Ordering::Relaxed),
            last_latency_ns: self.last_latency_ns.load(Ordering::Relaxed),
            max_latency_ns: self.max_latency_ns.load(Ordering::Relaxed),
            avg_latency_ns: if orders > 0 { total_latency / orders } else { 0 },
        }
    }
}
