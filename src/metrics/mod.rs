mod server;

use prometheus::{
    Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
};

pub use server::{start_metrics_server, HealthTargets};

use crate::domain::order::OrderStatus;
use crate::utils::CircuitState;

// ============================================================================
// Metrics Module - Prometheus metrics for the checkout service
// ============================================================================
//
// - Checkout outcomes and latency
// - Best-effort step failures (event publish, cart clear)
// - Order status changes
// - Broker circuit breaker state
//
// Scraped via /metrics on the metrics server.
// ============================================================================

pub struct Metrics {
    registry: Registry,

    pub checkouts_total: IntCounterVec,
    pub checkout_duration: Histogram,

    pub order_events_published: IntCounterVec,
    pub cart_clear_failures: IntCounter,

    pub order_status_changes: IntCounterVec,

    pub broker_circuit_state: IntGauge,
}

/// Checkout outcome label values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckoutOutcome {
    Created,
    Rejected,
    Failed,
}

impl CheckoutOutcome {
    fn as_label(&self) -> &'static str {
        match self {
            CheckoutOutcome::Created => "created",
            CheckoutOutcome::Rejected => "rejected",
            CheckoutOutcome::Failed => "failed",
        }
    }
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();

        let checkouts_total = IntCounterVec::new(
            Opts::new("checkouts_total", "Checkout attempts by outcome"),
            &["outcome"],
        )?;
        registry.register(Box::new(checkouts_total.clone()))?;

        let checkout_duration = Histogram::with_opts(
            HistogramOpts::new("checkout_duration_seconds", "Checkout latency")
                .buckets(vec![0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        )?;
        registry.register(Box::new(checkout_duration.clone()))?;

        let order_events_published = IntCounterVec::new(
            Opts::new("order_events_published_total", "order.created publish attempts"),
            &["outcome"],
        )?;
        registry.register(Box::new(order_events_published.clone()))?;

        let cart_clear_failures = IntCounter::new(
            "cart_clear_failures_total",
            "Carts left uncleared after a successful checkout",
        )?;
        registry.register(Box::new(cart_clear_failures.clone()))?;

        let order_status_changes = IntCounterVec::new(
            Opts::new("order_status_changes_total", "Order status changes by target status"),
            &["status"],
        )?;
        registry.register(Box::new(order_status_changes.clone()))?;

        let broker_circuit_state = IntGauge::new(
            "broker_circuit_state",
            "Broker circuit breaker state (0=Closed, 1=HalfOpen, 2=Open)",
        )?;
        registry.register(Box::new(broker_circuit_state.clone()))?;

        Ok(Self {
            registry,
            checkouts_total,
            checkout_duration,
            order_events_published,
            cart_clear_failures,
            order_status_changes,
            broker_circuit_state,
        })
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn record_checkout(&self, outcome: CheckoutOutcome, duration_secs: f64) {
        self.checkouts_total.with_label_values(&[outcome.as_label()]).inc();
        self.checkout_duration.observe(duration_secs);
    }

    pub fn record_event_publish(&self, success: bool) {
        let outcome = if success { "ok" } else { "failed" };
        self.order_events_published.with_label_values(&[outcome]).inc();
    }

    pub fn record_cart_clear_failure(&self) {
        self.cart_clear_failures.inc();
    }

    pub fn record_status_change(&self, status: OrderStatus) {
        self.order_status_changes.with_label_values(&[status.as_str()]).inc();
    }

    pub fn set_broker_circuit_state(&self, state: CircuitState) {
        self.broker_circuit_state.set(state.as_gauge());
    }
}
