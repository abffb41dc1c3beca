//! Metrics Collection for the Paywall Service
//!
//! Lightweight, thread-safe counters over the domain's state transitions,
//! with a Prometheus-compatible text export surfaced on `/metrics` and a
//! JSON snapshot embedded in `/status`.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Atomic counters for every observable transition
#[derive(Debug, Default)]
pub struct PaywallMetrics {
    /// Preview readings created
    pub previews_total: AtomicU64,
    /// Checkout upserts handled (created + reused)
    pub checkouts_total: AtomicU64,
    /// Checkout upserts that reused an existing order
    pub checkouts_reused_total: AtomicU64,
    /// Payment sessions created with the provider
    pub sessions_created_total: AtomicU64,
    /// Webhook deliveries that transitioned an order to paid
    pub webhooks_processed_total: AtomicU64,
    /// Webhook deliveries ignored as replays
    pub webhooks_replayed_total: AtomicU64,
    /// Webhook deliveries for event types we don't handle
    pub webhooks_ignored_total: AtomicU64,
    /// Webhook deliveries that failed during processing
    pub webhook_failures_total: AtomicU64,
}

/// Point-in-time view of the counters, for the `/status` payload
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    /// Preview readings created
    pub previews_total: u64,
    /// Checkout upserts handled
    pub checkouts_total: u64,
    /// Checkout upserts that reused an existing order
    pub checkouts_reused_total: u64,
    /// Payment sessions created
    pub sessions_created_total: u64,
    /// Webhooks that marked an order paid
    pub webhooks_processed_total: u64,
    /// Webhook replays ignored
    pub webhooks_replayed_total: u64,
    /// Webhooks for unhandled event types
    pub webhooks_ignored_total: u64,
    /// Webhook processing failures
    pub webhook_failures_total: u64,
}

impl PaywallMetrics {
    /// Create a zeroed registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a created preview reading
    pub fn record_preview(&self) {
        self.previews_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a checkout upsert
    pub fn record_checkout(&self, reused: bool) {
        self.checkouts_total.fetch_add(1, Ordering::Relaxed);
        if reused {
            self.checkouts_reused_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Record a provider session creation
    pub fn record_session_created(&self) {
        self.sessions_created_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a webhook that marked an order paid
    pub fn record_webhook_processed(&self) {
        self.webhooks_processed_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a webhook replay
    pub fn record_webhook_replayed(&self) {
        self.webhooks_replayed_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a webhook for an event type we don't handle
    pub fn record_webhook_ignored(&self) {
        self.webhooks_ignored_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a webhook processing failure
    pub fn record_webhook_failure(&self) {
        self.webhook_failures_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time snapshot of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            previews_total: self.previews_total.load(Ordering::Relaxed),
            checkouts_total: self.checkouts_total.load(Ordering::Relaxed),
            checkouts_reused_total: self.checkouts_reused_total.load(Ordering::Relaxed),
            sessions_created_total: self.sessions_created_total.load(Ordering::Relaxed),
            webhooks_processed_total: self.webhooks_processed_total.load(Ordering::Relaxed),
            webhooks_replayed_total: self.webhooks_replayed_total.load(Ordering::Relaxed),
            webhooks_ignored_total: self.webhooks_ignored_total.load(Ordering::Relaxed),
            webhook_failures_total: self.webhook_failures_total.load(Ordering::Relaxed),
        }
    }

    /// Render counters in Prometheus text exposition format
    pub fn to_prometheus_format(&self) -> String {
        let s = self.snapshot();
        let mut out = String::new();

        let counters = [
            (
                "paywall_previews_total",
                "Preview readings created",
                s.previews_total,
            ),
            (
                "paywall_checkouts_total",
                "Checkout upserts handled",
                s.checkouts_total,
            ),
            (
                "paywall_checkouts_reused_total",
                "Checkouts deduplicated onto an existing order",
                s.checkouts_reused_total,
            ),
            (
                "paywall_sessions_created_total",
                "Payment sessions created",
                s.sessions_created_total,
            ),
            (
                "paywall_webhooks_processed_total",
                "Webhooks that marked an order paid",
                s.webhooks_processed_total,
            ),
            (
                "paywall_webhooks_replayed_total",
                "Webhook replays ignored",
                s.webhooks_replayed_total,
            ),
            (
                "paywall_webhooks_ignored_total",
                "Webhooks for unhandled event types",
                s.webhooks_ignored_total,
            ),
            (
                "paywall_webhook_failures_total",
                "Webhook processing failures",
                s.webhook_failures_total,
            ),
        ];

        for (name, help, value) in counters {
            out.push_str(&format!(
                "# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n"
            ));
        }
        out
    }
}
