//! Prometheus metrics for request latency and marketplace activity.
//!
//! This module provides metrics for:
//! - HTTP request latency per matched route
//! - Payment API and document store latency
//! - Rejected authentications by reason
//! - Business events (users registered, duplicate orders refused, intents created)

use std::time::Instant;

use axum::extract::{MatchedPath, Request};
use axum::middleware::Next;
use axum::response::Response;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tracing::debug;

// === Metric Name Constants ===

/// HTTP request latency metric name.
pub const METRIC_HTTP_REQUEST_LATENCY: &str = "http_request_latency_ms";
/// Payment API latency metric name.
pub const METRIC_PAYMENT_API_LATENCY: &str = "payment_api_latency_ms";
/// Store operation latency metric name.
pub const METRIC_STORE_LATENCY: &str = "store_operation_latency_ms";
/// HTTP requests counter metric name.
pub const METRIC_HTTP_REQUESTS: &str = "http_requests_total";
/// Rejected authentications counter metric name.
pub const METRIC_AUTH_REJECTED: &str = "auth_rejected_total";
/// Users registered counter metric name.
pub const METRIC_USERS_REGISTERED: &str = "users_registered_total";
/// Duplicate orders refused counter metric name.
pub const METRIC_ORDERS_REFUSED: &str = "orders_refused_total";
/// Payment intents counter metric name.
pub const METRIC_PAYMENT_INTENTS: &str = "payment_intents_created_total";
/// Payments recorded counter metric name.
pub const METRIC_PAYMENTS_RECORDED: &str = "payments_recorded_total";

/// Initialize all metric descriptions.
/// Call this once at startup to register metrics with descriptions.
pub fn init_metrics() {
    describe_histogram!(
        METRIC_HTTP_REQUEST_LATENCY,
        "HTTP request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_PAYMENT_API_LATENCY,
        "Payment provider request latency in milliseconds"
    );
    describe_histogram!(
        METRIC_STORE_LATENCY,
        "Document store operation latency in milliseconds"
    );

    describe_counter!(METRIC_HTTP_REQUESTS, "Total number of HTTP requests served");
    describe_counter!(
        METRIC_AUTH_REJECTED,
        "Total number of requests refused by the auth guards"
    );
    describe_counter!(METRIC_USERS_REGISTERED, "Total number of users registered");
    describe_counter!(
        METRIC_ORDERS_REFUSED,
        "Total number of orders refused by the one-per-day rule"
    );
    describe_counter!(METRIC_PAYMENT_INTENTS, "Total number of payment intents created");
    describe_counter!(METRIC_PAYMENTS_RECORDED, "Total number of payments recorded");

    debug!("Metrics initialized");
}

/// Install the Prometheus recorder and return its render handle.
pub fn install_recorder() -> anyhow::Result<PrometheusHandle> {
    let handle = PrometheusBuilder::new().install_recorder()?;
    init_metrics();
    Ok(handle)
}

/// Record HTTP request latency.
pub fn record_http_latency(start: Instant, endpoint: &str, method: &str, status: u16) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_HTTP_REQUEST_LATENCY, "endpoint" => endpoint.to_string()).record(latency_ms);
    counter!(
        METRIC_HTTP_REQUESTS,
        "endpoint" => endpoint.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record payment API latency.
pub fn record_payment_api_latency(start: Instant) {
    let latency_ms = start.elapsed().as_secs_f64() * 1000.0;
    histogram!(METRIC_PAYMENT_API_LATENCY).record(latency_ms);
}

/// Increment rejected authentications counter.
pub fn inc_auth_rejected(reason: &'static str) {
    counter!(METRIC_AUTH_REJECTED, "reason" => reason).increment(1);
}

/// Increment users registered counter.
pub fn inc_users_registered() {
    counter!(METRIC_USERS_REGISTERED).increment(1);
}

/// Increment refused orders counter.
pub fn inc_orders_refused() {
    counter!(METRIC_ORDERS_REFUSED).increment(1);
}

/// Increment payment intents counter.
pub fn inc_payment_intents() {
    counter!(METRIC_PAYMENT_INTENTS).increment(1);
}

/// Increment payments recorded counter.
pub fn inc_payments_recorded() {
    counter!(METRIC_PAYMENTS_RECORDED).increment(1);
}

/// Middleware timing every request against its matched route.
pub async fn track_http(request: Request, next: Next) -> Response {
    let start = Instant::now();
    let endpoint = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_string(), |path| path.as_str().to_string());
    let method = request.method().to_string();

    let response = next.run(request).await;
    record_http_latency(start, &endpoint, &method, response.status().as_u16());
    response
}

/// RAII guard for timing operations.
/// Automatically records latency when dropped.
pub struct LatencyTimer {
    start: Instant,
    metric_name: &'static str,
}

impl LatencyTimer {
    /// Create a new latency timer for the given metric.
    pub fn new(metric_name: &'static str) -> Self {
        Self {
            start: Instant::now(),
            metric_name,
        }
    }

    /// Get elapsed time in milliseconds (without recording).
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }
}

impl Drop for LatencyTimer {
    fn drop(&mut self) {
        let latency_ms = self.start.elapsed().as_secs_f64() * 1000.0;
        histogram!(self.metric_name).record(latency_ms);
    }
}

/// Create a latency timer for a document store operation.
pub fn timer_store_operation() -> LatencyTimer {
    LatencyTimer::new(METRIC_STORE_LATENCY)
}
