//! Payment methods offered at checkout.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error returned when a payment method string is not recognized.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unsupported payment method: {0}")]
pub struct PaymentMethodError(pub String);

/// How the customer chose to pay for an order.
///
/// The string forms (`PayPal`, `Stripe`, `CashOnDelivery`) are what the
/// checkout form submits and what the `payment_method` column stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentMethod {
    PayPal,
    Stripe,
    CashOnDelivery,
}

impl PaymentMethod {
    pub const ALL: [Self; 3] = [Self::PayPal, Self::Stripe, Self::CashOnDelivery];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PayPal => "PayPal",
            Self::Stripe => "Stripe",
            Self::CashOnDelivery => "CashOnDelivery",
        }
    }
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = PaymentMethodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str() == s)
            .ok_or_else(|| PaymentMethodError(s.to_owned()))
    }
}
