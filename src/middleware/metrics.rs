use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use super::Middleware;
use crate::dispatcher::Dispatch;
use crate::server::RequestContext;

/// Dispatch counters.
///
/// Totals are plain atomics; per-route hit counts live in a `DashMap` keyed
/// by route name, so concurrent dispatches never share a lock.
#[derive(Default)]
pub struct MetricsMiddleware {
    request_count: AtomicUsize,
    handled: AtomicUsize,
    declined: AtomicUsize,
    withheld: AtomicUsize,
    not_found: AtomicUsize,
    total_latency_ns: AtomicU64,
    route_hits: DashMap<String, u64>,
}

impl MetricsMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of dispatches observed
    pub fn request_count(&self) -> usize {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn handled_count(&self) -> usize {
        self.handled.load(Ordering::Relaxed)
    }

    pub fn declined_count(&self) -> usize {
        self.declined.load(Ordering::Relaxed)
    }

    pub fn withheld_count(&self) -> usize {
        self.withheld.load(Ordering::Relaxed)
    }

    pub fn not_found_count(&self) -> usize {
        self.not_found.load(Ordering::Relaxed)
    }

    /// Mean dispatch latency, zero before the first request.
    pub fn average_latency(&self) -> Duration {
        let count = self.request_count.load(Ordering::Relaxed) as u64;
        if count == 0 {
            Duration::from_nanos(0)
        } else {
            Duration::from_nanos(self.total_latency_ns.load(Ordering::Relaxed) / count)
        }
    }

    /// Number of dispatches that selected the route named `name`
    pub fn route_hits(&self, name: &str) -> u64 {
        self.route_hits.get(name).map(|v| *v).unwrap_or(0)
    }
}

impl Middleware for MetricsMiddleware {
    fn before(&self, _ctx: &dyn RequestContext) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }

    fn after(&self, _ctx: &dyn RequestContext, outcome: &Dispatch, latency: Duration) {
        self.total_latency_ns
            .fetch_add(latency.as_nanos() as u64, Ordering::Relaxed);
        let counter = match outcome {
            Dispatch::Handled { .. } => &self.handled,
            Dispatch::Declined { .. } => &self.declined,
            Dispatch::Withheld { .. } => &self.withheld,
            Dispatch::NotFound => &self.not_found,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        if let Some(name) = outcome.route_name() {
            *self.route_hits.entry(name.to_string()).or_insert(0) += 1;
        }
    }
}
