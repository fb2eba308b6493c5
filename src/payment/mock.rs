//! Offline payment gateway.
//!
//! Used when no Stripe key is configured and by tests. Intents are never
//! sent anywhere; requested amounts are recorded for inspection.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::PaymentError;

use super::{PaymentGateway, PaymentIntent};

/// Mock payment gateway.
#[derive(Debug, Clone)]
pub struct MockPaymentGateway {
    /// Currency stamped on created intents.
    currency: String,
    /// Amounts of every intent created, in order.
    amounts: Arc<Mutex<Vec<i64>>>,
    /// Whether to fail every request.
    fail: bool,
}

impl MockPaymentGateway {
    /// Create a gateway that accepts every positive amount.
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
            amounts: Arc::new(Mutex::new(Vec::new())),
            fail: false,
        }
    }

    /// Create a gateway that rejects every request as the provider would.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new("usd")
        }
    }

    /// Amounts requested so far.
    pub fn amounts(&self) -> Vec<i64> {
        self.amounts.lock().map(|a| a.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn create_intent(&self, amount: i64) -> Result<PaymentIntent, PaymentError> {
        if amount < 1 {
            return Err(PaymentError::InvalidAmount(amount.to_string()));
        }

        if self.fail {
            return Err(PaymentError::Rejected {
                status: 402,
                message: "card_error: mock failure".to_string(),
            });
        }

        let count = match self.amounts.lock() {
            Ok(mut amounts) => {
                amounts.push(amount);
                amounts.len()
            }
            Err(_) => 0,
        };

        let id = format!("pi_mock_{count}");
        Ok(PaymentIntent {
            client_secret: format!("{id}_secret_mock"),
            id,
            amount,
            currency: self.currency.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_amounts() {
        let gateway = MockPaymentGateway::new("usd");
        let intent = gateway.create_intent(1250).await.unwrap();
        assert_eq!(intent.amount, 1250);
        assert_eq!(intent.client_secret, "pi_mock_1_secret_mock");
        assert_eq!(gateway.amounts(), vec![1250]);
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let gateway = MockPaymentGateway::new("usd");
        assert!(matches!(
            gateway.create_intent(0).await,
            Err(PaymentError::InvalidAmount(_))
        ));
        assert!(gateway.amounts().is_empty());
    }

    #[tokio::test]
    async fn failing_gateway_rejects() {
        let gateway = MockPaymentGateway::failing();
        assert!(matches!(
            gateway.create_intent(100).await,
            Err(PaymentError::Rejected { status: 402, .. })
        ));
    }
}
