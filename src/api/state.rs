//! Application state shared with handlers and guards.

use std::sync::Arc;

use metrics_exporter_prometheus::PrometheusHandle;

use crate::auth::TokenService;
use crate::payment::PaymentGateway;
use crate::store::Store;

/// Application state shared with handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document store.
    pub store: Arc<dyn Store>,
    /// Payment provider.
    pub payments: Arc<dyn PaymentGateway>,
    /// Access token signer/verifier.
    pub tokens: Arc<TokenService>,
    /// Prometheus render handle, when a recorder is installed.
    pub metrics: Option<PrometheusHandle>,
}

impl AppState {
    /// Create new app state.
    pub fn new(
        store: Arc<dyn Store>,
        payments: Arc<dyn PaymentGateway>,
        tokens: TokenService,
    ) -> Self {
        Self {
            store,
            payments,
            tokens: Arc::new(tokens),
            metrics: None,
        }
    }

    /// Attach a Prometheus handle for the `/metrics` endpoint.
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }
}
