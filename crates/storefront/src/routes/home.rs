//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;

use crate::filters;
use crate::middleware::{GuestCart, OptionalSession};
use crate::models::session::SessionView;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub session: Option<SessionView>,
    /// Guest cart key, handed to the cart script on the page.
    pub cart_id: String,
}

/// Display the home page.
pub async fn home(
    OptionalSession(session): OptionalSession,
    GuestCart(cart_id): GuestCart,
) -> HomeTemplate {
    HomeTemplate {
        session,
        cart_id: cart_id.unwrap_or_default(),
    }
}
