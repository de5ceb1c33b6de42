//! Core types for ProStore.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod payment;
pub mod role;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{Amount, format_currency, format_number_with_decimal, round2, to_minor_units};
pub use payment::{PaymentMethod, PaymentMethodError};
pub use role::{RoleError, UserRole};
