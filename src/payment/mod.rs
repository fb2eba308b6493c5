//! Payment intent creation.

pub mod mock;
pub mod stripe;

use async_trait::async_trait;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::error::PaymentError;

pub use mock::MockPaymentGateway;
pub use stripe::StripeClient;

/// A created payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    /// Provider id (`pi_...`).
    pub id: String,
    /// Secret handed to the browser to confirm the payment.
    pub client_secret: String,
    /// Amount in minor units.
    pub amount: i64,
    /// ISO currency code.
    pub currency: String,
}

/// Creates card payment intents with a payment provider.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create an intent for `amount` minor units.
    async fn create_intent(&self, amount: i64) -> Result<PaymentIntent, PaymentError>;
}

/// Convert a fee in major units to minor units, truncating fractions of a cent.
pub fn fee_to_minor_units(fee: Decimal) -> Result<i64, PaymentError> {
    (fee * Decimal::ONE_HUNDRED)
        .trunc()
        .to_i64()
        .ok_or_else(|| PaymentError::InvalidAmount(fee.to_string()))
}
