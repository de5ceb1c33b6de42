//! Order repository (read side).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use prostore_core::{OrderId, PaymentMethod, UserId};

use super::RepositoryError;
use crate::models::order::{Order, OrderItem, ShippingAddress};

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    user_name: String,
    user_email: String,
    shipping_address: Json<ShippingAddress>,
    payment_method: String,
    items_price: Decimal,
    shipping_price: Decimal,
    tax_price: Decimal,
    total_price: Decimal,
    is_paid: bool,
    paid_at: Option<DateTime<Utc>>,
    is_delivered: bool,
    delivered_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct OrderItemRow {
    product_id: Uuid,
    slug: String,
    name: String,
    image: String,
    quantity: i32,
    price: Decimal,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        Self {
            product_id: row.product_id,
            slug: row.slug,
            name: row.name,
            image: row.image,
            quantity: row.quantity,
            price: row.price,
        }
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let payment_method = self
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(|e| RepositoryError::DataCorruption(e.to_string()))?;

        Ok(Order {
            id: OrderId::from_uuid(self.id),
            user_id: UserId::from_uuid(self.user_id),
            user_name: self.user_name,
            user_email: self.user_email,
            shipping_address: self.shipping_address.0,
            payment_method,
            items_price: self.items_price,
            shipping_price: self.shipping_price,
            tax_price: self.tax_price,
            total_price: self.total_price,
            is_paid: self.is_paid,
            paid_at: self.paid_at,
            is_delivered: self.is_delivered,
            delivered_at: self.delivered_at,
            created_at: self.created_at,
            items,
        })
    }
}

/// Repository for order queries.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load an order with its items and the buyer's name and email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored payment method is unknown.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let Some(row) = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT o.id, o.user_id, u.name AS user_name, u.email AS user_email,
                   o.shipping_address, o.payment_method,
                   o.items_price, o.shipping_price, o.tax_price, o.total_price,
                   o.is_paid, o.paid_at, o.is_delivered, o.delivered_at, o.created_at
            FROM storefront.orders o
            JOIN storefront.users u ON u.id = o.user_id
            WHERE o.id = $1
            ",
        )
        .bind(id.as_uuid())
        .fetch_optional(self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, OrderItemRow>(
            r"
            SELECT product_id, slug, name, image, quantity, price
            FROM storefront.order_items
            WHERE order_id = $1
            ORDER BY name
            ",
        )
        .bind(id.as_uuid())
        .fetch_all(self.pool)
        .await?
        .into_iter()
        .map(OrderItem::from)
        .collect();

        row.into_order(items).map(Some)
    }
}
