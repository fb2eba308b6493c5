//! Stripe payment intent client.

use std::time::Instant;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::config::Config;
use crate::error::PaymentError;
use crate::metrics;

use super::{PaymentGateway, PaymentIntent};

/// Stripe REST API client.
#[derive(Clone)]
pub struct StripeClient {
    /// HTTP client for API requests.
    http: reqwest::Client,
    /// API base URL (no trailing slash).
    api_url: String,
    /// Secret API key.
    secret_key: String,
    /// Currency for every intent.
    currency: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_url", &self.api_url)
            .field("currency", &self.currency)
            .finish_non_exhaustive()
    }
}

/// Payment intent as returned by the API (subset).
#[derive(Debug, Clone, Deserialize)]
struct IntentResponse {
    id: String,
    client_secret: Option<String>,
    amount: i64,
    currency: String,
    status: Option<String>,
}

/// Error envelope returned by the API.
#[derive(Debug, Clone, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Clone, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl IntentResponse {
    /// Convert to a [`PaymentIntent`]; an intent without a client secret is unusable.
    fn into_intent(self, status: u16) -> Result<PaymentIntent, PaymentError> {
        let client_secret = self.client_secret.ok_or_else(|| PaymentError::Rejected {
            status,
            message: "response carried no client_secret".to_string(),
        })?;

        Ok(PaymentIntent {
            id: self.id,
            client_secret,
            amount: self.amount,
            currency: self.currency,
        })
    }
}

/// Error for a non-success response, using the API error envelope when present.
fn rejection(status: u16, body: &str) -> PaymentError {
    let message = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let kind = envelope.error.kind.unwrap_or_else(|| "api_error".to_string());
            let message = envelope.error.message.unwrap_or_default();
            format!("{kind}: {message}")
        }
        Err(_) => format!("HTTP {status}"),
    };
    PaymentError::Rejected { status, message }
}

impl StripeClient {
    /// Create a client from config and secret key.
    pub fn new(config: &Config, secret_key: &str) -> Result<Self, PaymentError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(config.http_timeout_ms))
            .connect_timeout(std::time::Duration::from_secs(5))
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            http,
            api_url: config.stripe_api_url.trim_end_matches('/').to_string(),
            secret_key: secret_key.to_string(),
            currency: config.payment_currency.clone(),
        })
    }

    /// API base URL.
    pub fn api_url(&self) -> &str {
        &self.api_url
    }
}

#[async_trait]
impl PaymentGateway for StripeClient {
    #[instrument(skip(self))]
    async fn create_intent(&self, amount: i64) -> Result<PaymentIntent, PaymentError> {
        if amount < 1 {
            return Err(PaymentError::InvalidAmount(amount.to_string()));
        }

        let url = format!("{}/v1/payment_intents", self.api_url);
        let start = Instant::now();

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.secret_key)
            .form(&[
                ("amount", amount.to_string()),
                ("currency", self.currency.clone()),
                ("payment_method_types[]", "card".to_string()),
            ])
            .send()
            .await?;

        metrics::record_payment_api_latency(start);

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(rejection(status.as_u16(), &body));
        }

        let intent: IntentResponse = response.json().await?;
        debug!(status = ?intent.status, "Intent created");
        let intent = intent.into_intent(status.as_u16())?;

        info!("Created payment intent {} for {} {}", intent.id, intent.amount, intent.currency);
        Ok(intent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Form, Json, Router};
    use serde_json::json;

    fn test_config(api_url: &str) -> Config {
        envy::from_iter([
            ("ACCESS_TOKEN_SECRET".to_string(), "secret".to_string()),
            ("STRIPE_API_URL".to_string(), api_url.to_string()),
            ("PAYMENT_CURRENCY".to_string(), "eur".to_string()),
        ])
        .unwrap()
    }

    /// Serve `router` on a local port and return its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[test]
    fn client_creation_trims_trailing_slash() {
        let config = test_config("https://api.stripe.com/");
        let client = StripeClient::new(&config, "sk_test_123").unwrap();
        assert_eq!(client.api_url(), "https://api.stripe.com");
        assert_eq!(client.currency, "eur");
    }

    #[test]
    fn error_envelope_becomes_rejection() {
        let body = r#"{"error":{"type":"card_error","message":"Your card was declined."}}"#;
        match rejection(402, body) {
            PaymentError::Rejected { status, message } => {
                assert_eq!(status, 402);
                assert_eq!(message, "card_error: Your card was declined.");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn unparseable_error_body_keeps_status() {
        match rejection(503, "<html>unavailable</html>") {
            PaymentError::Rejected { status, message } => {
                assert_eq!(status, 503);
                assert_eq!(message, "HTTP 503");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn intent_without_client_secret_is_rejected() {
        let response: IntentResponse = serde_json::from_value(json!({
            "id": "pi_1",
            "amount": 1250,
            "currency": "eur",
            "status": "requires_payment_method"
        }))
        .unwrap();
        assert!(matches!(
            response.into_intent(200),
            Err(PaymentError::Rejected { status: 200, .. })
        ));
    }

    #[tokio::test]
    async fn creates_intent_with_form_body() {
        let router = Router::new().route(
            "/v1/payment_intents",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                let amount: i64 = form["amount"].parse().unwrap_or_default();
                Json(json!({
                    "id": "pi_42",
                    "client_secret": "pi_42_secret_abc",
                    "amount": amount,
                    "currency": form["currency"],
                    "status": "requires_payment_method"
                }))
            }),
        );
        let base = serve(router).await;
        let client = StripeClient::new(&test_config(&base), "sk_test_123").unwrap();

        let intent = client.create_intent(1999).await.unwrap();
        assert_eq!(intent.id, "pi_42");
        assert_eq!(intent.client_secret, "pi_42_secret_abc");
        assert_eq!(intent.amount, 1999);
        assert_eq!(intent.currency, "eur");
    }

    #[tokio::test]
    async fn declined_request_is_rejected() {
        let router = Router::new().route(
            "/v1/payment_intents",
            post(|| async {
                (
                    StatusCode::PAYMENT_REQUIRED,
                    Json(json!({ "error": { "type": "card_error", "message": "declined" } })),
                )
            }),
        );
        let base = serve(router).await;
        let client = StripeClient::new(&test_config(&base), "sk_test_123").unwrap();

        match client.create_intent(500).await {
            Err(PaymentError::Rejected { status, message }) => {
                assert_eq!(status, 402);
                assert_eq!(message, "card_error: declined");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_positive_amount_is_not_sent() {
        let client = StripeClient::new(&test_config("http://127.0.0.1:9"), "sk_test_123").unwrap();
        assert!(matches!(
            client.create_intent(0).await,
            Err(PaymentError::InvalidAmount(_))
        ));
    }
}
