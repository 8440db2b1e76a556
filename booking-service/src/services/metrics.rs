use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prometheus::{IntCounterVec, Opts, Registry};
use std::sync::OnceLock;

pub static METRICS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();
pub static PROMETHEUS_REGISTRY: OnceLock<Registry> = OnceLock::new();
pub static BOOKING_ORDERS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();
pub static PAYMENT_VERIFICATIONS_TOTAL: OnceLock<IntCounterVec> = OnceLock::new();

pub fn init_metrics() {
    // Startup-only; a second call (tests spawning several apps) is a no-op.
    if METRICS_HANDLE.get().is_some() {
        return;
    }

    let builder = PrometheusBuilder::new();
    let handle = builder
        .install_recorder()
        .expect("failed to install Prometheus recorder");

    if METRICS_HANDLE.set(handle).is_err() {
        return;
    }

    let registry = Registry::new();

    let orders_counter = IntCounterVec::new(
        Opts::new(
            "booking_orders_total",
            "Total order initiations by outcome",
        ),
        &["status"],
    )
    .expect("Failed to create booking_orders_total metric");

    let verifications_counter = IntCounterVec::new(
        Opts::new(
            "payment_verifications_total",
            "Total payment verifications by outcome",
        ),
        &["outcome"],
    )
    .expect("Failed to create payment_verifications_total metric");

    registry
        .register(Box::new(orders_counter.clone()))
        .expect("Failed to register booking_orders_total");
    registry
        .register(Box::new(verifications_counter.clone()))
        .expect("Failed to register payment_verifications_total");

    PROMETHEUS_REGISTRY
        .set(registry)
        .expect("Failed to set prometheus registry");
    BOOKING_ORDERS_TOTAL
        .set(orders_counter)
        .expect("Failed to set booking_orders_total");
    PAYMENT_VERIFICATIONS_TOTAL
        .set(verifications_counter)
        .expect("Failed to set payment_verifications_total");
}

pub fn get_metrics() -> String {
    let mut output = METRICS_HANDLE
        .get()
        .map(|handle| handle.render())
        .unwrap_or_else(|| "# Metrics recorder not initialized\n".to_string());

    if let Some(registry) = PROMETHEUS_REGISTRY.get() {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer).ok();
        if let Ok(custom_metrics) = String::from_utf8(buffer) {
            output.push_str(&custom_metrics);
        }
    }

    output
}

/// Record an order initiation outcome ("created", "gateway_error", ...).
pub fn record_order(status: &str) {
    if let Some(counter) = BOOKING_ORDERS_TOTAL.get() {
        counter.with_label_values(&[status]).inc();
    }
}

/// Record a verification outcome ("verified", "signature_mismatch", ...).
pub fn record_verification(outcome: &str) {
    if let Some(counter) = PAYMENT_VERIFICATIONS_TOTAL.get() {
        counter.with_label_values(&[outcome]).inc();
    }
}
