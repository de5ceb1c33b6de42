//! Order detail page.

use askama::Template;
use askama_web::WebTemplate;
use axum::extract::{Path, State};
use tracing::instrument;

use prostore_core::OrderId;

use crate::config::PaymentsConfig;
use crate::db::orders::OrderRepository;
use crate::error::{AppError, Result, add_breadcrumb};
use crate::filters;
use crate::middleware::RequireSession;
use crate::models::order::Order;
use crate::models::session::SessionView;
use crate::services::payments::stripe_client_secret_for;
use crate::state::AppState;

/// Everything the order page renders from.
#[derive(Debug)]
pub struct OrderPageData {
    pub order: Order,
    pub paypal_client_id: String,
    /// Present only for unpaid Stripe orders.
    pub stripe_client_secret: Option<String>,
    pub is_admin: bool,
}

impl OrderPageData {
    /// Page data for `session` looking at `order`.
    ///
    /// Returns `None` unless the viewer bought the order or is an admin. The
    /// Stripe client secret starts out empty; the handler fills it in.
    #[must_use]
    pub fn for_viewer(
        order: Order,
        session: &SessionView,
        payments: &PaymentsConfig,
    ) -> Option<Self> {
        let is_admin = session.is_admin();
        if !is_admin && !order.is_owned_by(session.user.id) {
            return None;
        }

        Some(Self {
            order,
            paypal_client_id: payments.paypal_client_id.clone(),
            stripe_client_secret: None,
            is_admin,
        })
    }
}

/// Order detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "orders/show.html")]
pub struct OrderTemplate {
    pub session: Option<SessionView>,
    pub page: OrderPageData,
}

/// Display one order.
///
/// The buyer and admins may view it; anyone else gets the same 404 as for a
/// missing order. Unpaid Stripe orders open a payment intent on every view.
#[instrument(skip(state, session), fields(user_id = %session.user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireSession(session): RequireSession,
    Path(id): Path<String>,
) -> Result<OrderTemplate> {
    let not_found = || AppError::NotFound(format!("order {id}"));

    let order_id = id.parse::<OrderId>().map_err(|_| not_found())?;
    let order = OrderRepository::new(state.pool())
        .get_by_id(order_id)
        .await?
        .ok_or_else(not_found)?;

    let Some(mut page) = OrderPageData::for_viewer(order, &session, &state.config().payments)
    else {
        tracing::warn!(order_id = %order_id, "Order requested by non-owner");
        return Err(not_found());
    };

    page.stripe_client_secret = stripe_client_secret_for(&page.order, state.stripe()).await?;

    let order_ref = order_id.to_string();
    add_breadcrumb("orders", "Viewed order", Some(&[("order_id", order_ref.as_str())][..]));

    Ok(OrderTemplate {
        session: Some(session),
        page,
    })
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use prostore_core::{UserId, UserRole};

    use super::*;
    use crate::config::{DEFAULT_STRIPE_API_URL, paypal_client_id_or_sandbox};
    use crate::models::order::fixtures::unpaid_stripe_order;
    use crate::models::session::SessionUser;

    fn session_for(id: UserId, role: UserRole) -> SessionView {
        SessionView {
            user: SessionUser {
                id,
                name: "Viewer".to_string(),
                email: Some("viewer@x.com".to_string()),
                role,
            },
            expires: Utc::now(),
        }
    }

    fn payments(paypal: Option<&str>) -> PaymentsConfig {
        PaymentsConfig {
            stripe_secret_key: None,
            stripe_api_url: DEFAULT_STRIPE_API_URL.to_string(),
            paypal_client_id: paypal_client_id_or_sandbox(paypal.map(ToString::to_string)),
        }
    }

    #[test]
    fn test_owner_sees_order() {
        let order = unpaid_stripe_order();
        let session = session_for(order.user_id, UserRole::User);

        let page = OrderPageData::for_viewer(order, &session, &payments(Some("live-id")));
        let page = page.unwrap_or_else(|| panic!("owner was refused"));
        assert!(!page.is_admin);
        assert_eq!(page.paypal_client_id, "live-id");
        assert!(page.stripe_client_secret.is_none());
    }

    #[test]
    fn test_admin_sees_any_order() {
        let order = unpaid_stripe_order();
        let session = session_for(UserId::new(), UserRole::Admin);

        let page = OrderPageData::for_viewer(order, &session, &payments(None));
        let page = page.unwrap_or_else(|| panic!("admin was refused"));
        assert!(page.is_admin);
    }

    #[test]
    fn test_stranger_is_refused() {
        let order = unpaid_stripe_order();
        let session = session_for(UserId::new(), UserRole::User);

        assert!(OrderPageData::for_viewer(order, &session, &payments(None)).is_none());
    }

    #[test]
    fn test_paypal_id_falls_back_to_sandbox() {
        let order = unpaid_stripe_order();
        let session = session_for(order.user_id, UserRole::User);

        for configured in [None, Some(""), Some("  ")] {
            let page = OrderPageData::for_viewer(order.clone(), &session, &payments(configured));
            assert_eq!(page.map(|p| p.paypal_client_id).as_deref(), Some("sb"));
        }
    }
}
