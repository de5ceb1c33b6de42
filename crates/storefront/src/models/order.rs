//! Order domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use prostore_core::{OrderId, PaymentMethod, UserId, format_currency};

/// Shipping address captured at checkout (stored as JSON on the order).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub full_name: String,
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
}

/// A line on an order, frozen at checkout time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: uuid::Uuid,
    pub slug: String,
    pub name: String,
    pub image: String,
    pub quantity: i32,
    pub price: Decimal,
}

/// A placed order with its lines and the purchasing user's contact details.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
    pub shipping_address: ShippingAddress,
    pub payment_method: PaymentMethod,
    pub items_price: Decimal,
    pub shipping_price: Decimal,
    pub tax_price: Decimal,
    pub total_price: Decimal,
    pub is_paid: bool,
    pub paid_at: Option<DateTime<Utc>>,
    pub is_delivered: bool,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Whether the order still needs a Stripe payment intent.
    #[must_use]
    pub fn awaits_stripe_payment(&self) -> bool {
        self.payment_method == PaymentMethod::Stripe && !self.is_paid
    }

    /// Whether `user_id` placed this order.
    #[must_use]
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Short id shown to customers (last six characters).
    #[must_use]
    pub fn short_id(&self) -> String {
        let id = self.id.to_string();
        let start = id.len().saturating_sub(6);
        id.get(start..).unwrap_or(&id).to_string()
    }

    #[must_use]
    pub fn formatted_total(&self) -> String {
        format_currency(self.total_price)
    }
}
