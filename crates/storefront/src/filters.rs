//! Custom Askama template filters.

#![allow(clippy::unnecessary_wraps)]

use std::fmt::Display;

use prostore_core::{format_currency, format_number_with_decimal};

/// Formats an amount as US dollars.
///
/// Usage in templates: `{{ order.total_price|currency }}`
#[askama::filter_fn]
pub fn currency(amount: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    Ok(format_currency(amount.to_string()))
}

/// Formats a number with at least two decimal places, e.g. `4.5` as `4.50`.
///
/// Non-numeric input renders unchanged.
///
/// Usage in templates: `{{ item.price|decimal }}`
#[askama::filter_fn]
pub fn decimal(value: impl Display, _env: &dyn askama::Values) -> askama::Result<String> {
    let text = value.to_string();
    Ok(text
        .parse::<f64>()
        .map_or(text, format_number_with_decimal))
}

/// Returns the current year.
///
/// Usage in templates: `{{ ""|current_year }}`
#[askama::filter_fn]
pub fn current_year(_value: impl Display, _env: &dyn askama::Values) -> askama::Result<i32> {
    use chrono::Datelike;
    Ok(chrono::Utc::now().year())
}
