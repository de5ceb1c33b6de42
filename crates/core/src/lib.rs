//! ProStore Core - Shared domain types.
//!
//! This crate provides the types used across all ProStore components:
//! - `storefront` - Public-facing e-commerce site
//! - `cli` - Command-line tools for migrations and user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Money formatting lives here so templates, services
//! and the CLI all round and print amounts the same way.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, roles, payment methods and money helpers

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
