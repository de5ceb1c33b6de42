//! Stripe payment intents over the REST API.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::{PaymentError, PaymentIntent, PaymentIntentProvider, PaymentIntentRequest};
use crate::config::PaymentsConfig;

/// Stripe API client.
///
/// Without a secret key the client still constructs, and every call fails
/// with `PaymentError::NotConfigured`. Only Stripe orders ever reach it.
#[derive(Clone)]
pub struct StripeClient {
    client: reqwest::Client,
    api_url: String,
    secret_key: Option<SecretString>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    error: StripeErrorDetail,
}

#[derive(Debug, Deserialize)]
struct StripeErrorDetail {
    message: Option<String>,
}

impl StripeClient {
    /// Create a client from payment settings.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &PaymentsConfig) -> Result<Self, PaymentError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_url: config.stripe_api_url.trim_end_matches('/').to_string(),
            secret_key: config.stripe_secret_key.clone(),
        })
    }

    fn form(request: &PaymentIntentRequest) -> Vec<(&'static str, String)> {
        vec![
            ("amount", request.amount.to_string()),
            ("currency", request.currency.to_string()),
            ("metadata[orderId]", request.order_id.to_string()),
            ("description", request.description()),
        ]
    }
}

impl PaymentIntentProvider for StripeClient {
    async fn create_payment_intent(
        &self,
        request: &PaymentIntentRequest,
    ) -> Result<PaymentIntent, PaymentError> {
        let key = self
            .secret_key
            .as_ref()
            .ok_or(PaymentError::NotConfigured("STRIPE_SECRET_KEY is not set"))?;

        let response = self
            .client
            .post(format!("{}/v1/payment_intents", self.api_url))
            .bearer_auth(key.expose_secret())
            .form(&Self::form(request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<StripeErrorBody>(&body)
                .ok()
                .and_then(|b| b.error.message)
                .unwrap_or(body);
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(response.json::<PaymentIntent>().await?)
    }
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("api_url", &self.api_url)
            .field("configured", &self.secret_key.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use prostore_core::OrderId;

    use super::*;

    fn config(key: Option<&str>) -> PaymentsConfig {
        PaymentsConfig {
            stripe_secret_key: key.map(|k| SecretString::from(k.to_string())),
            stripe_api_url: "http://127.0.0.1:9/".to_string(),
            paypal_client_id: "sb".to_string(),
        }
    }

    #[test]
    fn test_form_fields() {
        let order_id = OrderId::new();
        let request = PaymentIntentRequest {
            amount: 2000,
            currency: "USD",
            order_id,
        };
        let form = StripeClient::form(&request);
        assert!(form.contains(&("amount", "2000".to_string())));
        assert!(form.contains(&("currency", "USD".to_string())));
        assert!(form.contains(&("metadata[orderId]", order_id.to_string())));
    }

    #[tokio::test]
    async fn test_missing_key_is_not_configured() {
        let client = StripeClient::new(&config(None)).unwrap();
        let request = PaymentIntentRequest {
            amount: 100,
            currency: "USD",
            order_id: OrderId::new(),
        };
        let result = client.create_payment_intent(&request).await;
        assert!(matches!(result, Err(PaymentError::NotConfigured(_))));
    }

    #[test]
    fn test_debug_hides_key() {
        let client = StripeClient::new(&config(Some("sk_test_abc123"))).unwrap();
        let output = format!("{client:?}");
        assert!(!output.contains("sk_test"));
        assert!(output.contains("127.0.0.1:9\""));
    }
}
