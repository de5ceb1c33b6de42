//! ProStore storefront library.
//!
//! Session handling, guest carts, the order page and their supporting
//! services, exposed as a library so the binary and the router tests share
//! one [`routes::app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod filters;
pub mod forms;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
