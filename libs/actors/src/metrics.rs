//! System Metrics
//!
//! Lock-free counters updated from every processing loop.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// System-wide counters
#[derive(Debug, Default)]
pub struct SystemMetrics {
    pub actors_created: AtomicU64,
    pub actors_terminated: AtomicU64,
    pub actors_orphaned: AtomicU64,
    pub messages_processed: AtomicU64,
    pub total_processing_time_ns: AtomicU64,
    pub actor_restarts: AtomicU64,
    pub restart_failures: AtomicU64,
    pub asks_sent: AtomicU64,
    pub ask_timeouts: AtomicU64,
}

impl SystemMetrics {
    pub fn record_message_handled(&self, duration: Duration) {
        self.messages_processed.fetch_add(1, Ordering::Relaxed);
        self.total_processing_time_ns
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    pub fn avg_processing_time_ns(&self) -> f64 {
        let count = self.messages_processed.load(Ordering::Relaxed);
        if count == 0 {
            return 0.0;
        }
        let total = self.total_processing_time_ns.load(Ordering::Relaxed);
        total as f64 / count as f64
    }

    /// Record actor restart event
    pub fn record_actor_restart(&self, success: bool) {
        self.actor_restarts.fetch_add(1, Ordering::Relaxed);
        if !success {
            self.restart_failures.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of the system counters
#[derive(Debug, Clone, PartialEq)]
pub struct SystemStats {
    pub live_actors: usize,
    pub actors_created: u64,
    pub actors_terminated: u64,
    pub actors_orphaned: u64,
    pub messages_processed: u64,
    pub avg_processing_time_ns: f64,
    pub actor_restarts: u64,
    pub restart_failures: u64,
    pub asks_sent: u64,
    pub ask_timeouts: u64,
    pub pending_asks: usize,
    pub undeliverable_messages: u64,
    pub faults: u64,
}
