use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouterMetricsSnapshot {
    pub requests: u64,
    pub served: u64,
    pub provider_failures: u64,
    pub failovers: u64,
    pub exhausted: u64,
    pub budget_rejected: u64,
}

/// Counters shared across concurrent requests; the router hands out an
/// owned snapshot so readers never hold a reference into the atomics.
#[derive(Debug, Default)]
pub(crate) struct RouterMetrics {
    requests: AtomicU64,
    served: AtomicU64,
    provider_failures: AtomicU64,
    failovers: AtomicU64,
    exhausted: AtomicU64,
    budget_rejected: AtomicU64,
}

impl RouterMetrics {
    pub(crate) fn record_request(&self) {
        self.requests.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_served(&self) {
        self.served.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_provider_failure(&self) {
        self.provider_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failover(&self) {
        self.failovers.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_exhausted(&self) {
        self.exhausted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_budget_rejected(&self) {
        self.budget_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> RouterMetricsSnapshot {
        RouterMetricsSnapshot {
            requests: self.requests.load(Ordering::Relaxed),
            served: self.served.load(Ordering::Relaxed),
            provider_failures: self.provider_failures.load(Ordering::Relaxed),
            failovers: self.failovers.load(Ordering::Relaxed),
            exhausted: self.exhausted.load(Ordering::Relaxed),
            budget_rejected: self.budget_rejected.load(Ordering::Relaxed),
        }
    }
}
