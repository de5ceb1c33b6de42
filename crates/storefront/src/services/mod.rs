//! Business logic services for the storefront.
//!
//! - [`auth`] - Password sign-in, sign-up and session tokens
//! - [`payments`] - Stripe payment intents for the order page

pub mod auth;
pub mod payments;
