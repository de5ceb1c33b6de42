//! Payment provider integration.
//!
//! The order page asks for a Stripe payment intent only while an order is
//! unpaid and set to pay by card; every other order renders without one.

mod stripe;

pub use stripe::StripeClient;

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;
use tracing::instrument;

use prostore_core::types::money::CURRENCY_CODE;
use prostore_core::{OrderId, to_minor_units};

use crate::models::order::Order;

/// Errors from payment providers.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The provider is not configured.
    #[error("payment provider not configured: {0}")]
    NotConfigured(&'static str),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an error response.
    #[error("provider error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The amount cannot be expressed in minor units.
    #[error("amount out of range: {0}")]
    InvalidAmount(String),
}

/// What gets sent to the provider when opening a payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntentRequest {
    /// Amount in cents.
    pub amount: i64,
    pub currency: &'static str,
    pub order_id: OrderId,
}

impl PaymentIntentRequest {
    /// Build the request for an order's total.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::InvalidAmount` if the total does not fit in cents.
    pub fn for_order(order: &Order) -> Result<Self, PaymentError> {
        let amount = to_minor_units(order.total_price)
            .ok_or_else(|| PaymentError::InvalidAmount(order.total_price.to_string()))?;
        Ok(Self {
            amount,
            currency: CURRENCY_CODE,
            order_id: order.id,
        })
    }

    #[must_use]
    pub fn description(&self) -> String {
        format!("Paying for order {}", self.order_id)
    }
}

/// A provider-side payment intent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    pub client_secret: String,
}

/// Creates payment intents.
pub trait PaymentIntentProvider: Send + Sync {
    fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> impl Future<Output = Result<PaymentIntent, PaymentError>> + Send;
}

/// Client secret for the order page, if the order needs one.
///
/// Issues exactly one provider call for an unpaid Stripe order and none
/// otherwise. There is no retry; every view of an unpaid order opens a new
/// intent.
///
/// # Errors
///
/// Propagates provider failures.
#[instrument(skip(order, provider), fields(order_id = %order.id))]
pub async fn stripe_client_secret_for<P: PaymentIntentProvider>(
    order: &Order,
    provider: &P,
) -> Result<Option<String>, PaymentError> {
    if !order.awaits_stripe_payment() {
        return Ok(None);
    }

    let request = PaymentIntentRequest::for_order(order)?;
    let intent = provider.create_payment_intent(&request).await?;
    tracing::info!(payment_intent = %intent.id, amount = request.amount, "Created payment intent");
    Ok(Some(intent.client_secret))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use prostore_core::PaymentMethod;

    use super::*;
    use crate::models::order::fixtures::unpaid_stripe_order;

    #[derive(Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<PaymentIntentRequest>>,
    }

    impl PaymentIntentProvider for RecordingProvider {
        async fn create_payment_intent(
            &self,
            request: &PaymentIntentRequest,
        ) -> Result<PaymentIntent, PaymentError> {
            self.calls.lock().unwrap().push(request.clone());
            Ok(PaymentIntent {
                id: "pi_123".to_string(),
                client_secret: "pi_123_secret_abc".to_string(),
            })
        }
    }

    struct FailingProvider;

    impl PaymentIntentProvider for FailingProvider {
        async fn create_payment_intent(
            &self,
            _request: &PaymentIntentRequest,
        ) -> Result<PaymentIntent, PaymentError> {
            Err(PaymentError::Api {
                status: 402,
                message: "card_declined".to_string(),
            })
        }
    }

    #[tokio::test]
    async fn test_unpaid_stripe_order_gets_client_secret() {
        let order = unpaid_stripe_order();
        let provider = RecordingProvider::default();

        let secret = stripe_client_secret_for(&order, &provider).await.unwrap();
        assert_eq!(secret.as_deref(), Some("pi_123_secret_abc"));

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let call = calls.first().unwrap();
        assert_eq!(call.amount, 2000);
        assert_eq!(call.currency, "USD");
        assert_eq!(call.order_id, order.id);
    }

    #[tokio::test]
    async fn test_no_call_for_paid_or_other_methods() {
        let provider = RecordingProvider::default();

        let mut paid = unpaid_stripe_order();
        paid.is_paid = true;
        assert_eq!(stripe_client_secret_for(&paid, &provider).await.unwrap(), None);

        for method in [PaymentMethod::PayPal, PaymentMethod::CashOnDelivery] {
            let mut order = unpaid_stripe_order();
            order.payment_method = method;
            assert_eq!(stripe_client_secret_for(&order, &provider).await.unwrap(), None);
        }

        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure_propagates() {
        let result = stripe_client_secret_for(&unpaid_stripe_order(), &FailingProvider).await;
        assert!(matches!(result, Err(PaymentError::Api { status: 402, .. })));
    }

    #[test]
    fn test_request_description_names_order() {
        let order = unpaid_stripe_order();
        let request = PaymentIntentRequest::for_order(&order).unwrap();
        assert_eq!(request.description(), format!("Paying for order {}", order.id));
    }
}
