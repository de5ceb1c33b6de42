//! Domain models for storefront.
//!
//! - [`user`] - Accounts held by the credential store
//! - [`order`] - Orders and the read-only order page projection
//! - [`session`] - The session view exposed to handlers and templates

pub mod order;
pub mod session;
pub mod user;

pub use order::{Order, OrderItem, ShippingAddress};
pub use session::{SessionUser, SessionView, cookie_names};
pub use user::{AuthenticatedUser, NO_NAME, UserRecord};
