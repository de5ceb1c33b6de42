//! Money helpers: parsing, rounding and USD display.
//!
//! All arithmetic is done on [`Decimal`]. Binary floats are converted through
//! their shortest round-trip decimal form (`10.005_f64` becomes `10.005`, not
//! `10.00499999...`), and rounding always uses midpoint-away-from-zero, so
//! results do not depend on platform float behavior.

use std::str::FromStr;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Currency code used for every price in the store.
pub const CURRENCY_CODE: &str = "USD";

const ROUNDING: RoundingStrategy = RoundingStrategy::MidpointAwayFromZero;

/// A possibly-invalid monetary input.
///
/// Prices arrive as decimals from the database, as strings from forms and
/// as floats from computed totals. Anything that does not parse becomes
/// [`Amount::NotANumber`] instead of an error, mirroring how the page layer
/// prints `NaN` for garbage input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Amount {
    Value(Decimal),
    NotANumber,
}

impl Amount {
    /// Returns the decimal value, if any.
    #[must_use]
    pub const fn value(self) -> Option<Decimal> {
        match self {
            Self::Value(d) => Some(d),
            Self::NotANumber => None,
        }
    }

    /// Round to two decimal places.
    #[must_use]
    pub fn round2(self) -> Self {
        match self {
            Self::Value(d) => Self::Value(d.round_dp_with_strategy(2, ROUNDING)),
            Self::NotANumber => Self::NotANumber,
        }
    }
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Self::Value(value)
    }
}

impl From<f64> for Amount {
    fn from(value: f64) -> Self {
        decimal_from_f64(value).map_or(Self::NotANumber, Self::Value)
    }
}

impl From<&str> for Amount {
    fn from(value: &str) -> Self {
        let trimmed = value.trim();
        // An empty field counts as zero, like a blank numeric input.
        if trimmed.is_empty() {
            return Self::Value(Decimal::ZERO);
        }
        Decimal::from_str(trimmed)
            .or_else(|_| Decimal::from_scientific(trimmed))
            .map_or(Self::NotANumber, Self::Value)
    }
}

impl From<&String> for Amount {
    fn from(value: &String) -> Self {
        Self::from(value.as_str())
    }
}

impl From<String> for Amount {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl<T: Into<Self>> From<Option<T>> for Amount {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::NotANumber, Into::into)
    }
}

fn decimal_from_f64(value: f64) -> Option<Decimal> {
    if !value.is_finite() {
        return None;
    }
    Decimal::from_str(&value.to_string()).ok()
}

/// Round a float to two decimal places, ties away from zero.
///
/// `round2(round2(x)) == round2(x)` for every finite `x`. Values too large
/// for a [`Decimal`] have no fractional precision left and are returned as-is.
///
/// ```
/// use prostore_core::round2;
///
/// assert_eq!(round2(10.005), 10.01);
/// assert_eq!(round2(-1.005), -1.01);
/// assert_eq!(round2(2.0), 2.0);
/// ```
#[must_use]
pub fn round2(value: f64) -> f64 {
    match decimal_from_f64(value) {
        Some(d) => d
            .round_dp_with_strategy(2, ROUNDING)
            .to_f64()
            .unwrap_or(value),
        None => value,
    }
}

/// Convert an amount in dollars to integer cents.
///
/// Returns `None` for values that do not fit in an `i64`.
///
/// ```
/// use prostore_core::to_minor_units;
/// use rust_decimal::Decimal;
///
/// let total: Decimal = "19.999".parse().unwrap();
/// assert_eq!(to_minor_units(total), Some(2000));
/// ```
#[must_use]
pub fn to_minor_units(amount: Decimal) -> Option<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)?
        .round_dp_with_strategy(0, ROUNDING)
        .to_i64()
}

/// Format an amount as US dollars, e.g. `$1,234.50`.
///
/// Inputs that are not numbers (unparseable strings, `None`, NaN) format as
/// `"NaN"`. A negative input keeps its sign even when it rounds to zero, so
/// `-0.001` formats as `-$0.00`.
///
/// ```
/// use prostore_core::format_currency;
///
/// assert_eq!(format_currency(19.5), "$19.50");
/// assert_eq!(format_currency("abc"), "NaN");
/// assert_eq!(format_currency(None::<f64>), "NaN");
/// ```
#[must_use]
pub fn format_currency(amount: impl Into<Amount>) -> String {
    let amount = amount.into();
    let (Amount::Value(raw), Amount::Value(rounded)) = (amount, amount.round2()) else {
        return "NaN".to_owned();
    };

    let mut abs = rounded.abs();
    abs.rescale(2);
    let digits = abs.to_string();
    let (whole, cents) = digits.split_once('.').unwrap_or((digits.as_str(), "00"));

    let sign = if raw.is_sign_negative() && !raw.is_zero() {
        "-"
    } else {
        ""
    };
    format!("{sign}${}.{cents}", group_thousands(whole))
}

fn group_thousands(whole: &str) -> String {
    let len = whole.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Render a number with at least two decimal places.
///
/// Existing decimals are padded, never truncated: `1.5` → `1.50`,
/// `1.234` → `1.234`, `7` → `7.00`.
#[must_use]
pub fn format_number_with_decimal(num: f64) -> String {
    let text = num.to_string();
    match text.split_once('.') {
        Some((whole, fraction)) => format!("{whole}.{fraction:0<2}"),
        None => format!("{text}.00"),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn test_format_currency_basic() {
        assert_eq!(format_currency(19.5), "$19.50");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency("12"), "$12.00");
        assert_eq!(format_currency(dec("5.005")), "$5.01");
    }

    #[test]
    fn test_format_currency_groups_thousands() {
        assert_eq!(format_currency(1_234_567.891), "$1,234,567.89");
        assert_eq!(format_currency(999.0), "$999.00");
        assert_eq!(format_currency(1000.0), "$1,000.00");
    }

    #[test]
    fn test_format_currency_negative() {
        assert_eq!(format_currency(-5.0), "-$5.00");
        assert_eq!(format_currency(-0.001), "-$0.00");
        assert_eq!(format_currency("-0.004"), "-$0.00");
        assert_eq!(format_currency(0.0), "$0.00");
    }

    #[test]
    fn test_format_currency_not_a_number() {
        assert_eq!(format_currency("abc"), "NaN");
        assert_eq!(format_currency(f64::NAN), "NaN");
        assert_eq!(format_currency(None::<&str>), "NaN");
    }

    #[test]
    fn test_round2_midpoints() {
        assert_eq!(round2(10.005), 10.01);
        assert_eq!(round2(1.005), 1.01);
        assert_eq!(round2(2.675), 2.68);
        assert_eq!(round2(-2.675), -2.68);
        assert_eq!(round2(7.14159), 7.14);
    }

    #[test]
    fn test_round2_is_idempotent() {
        let samples = [
            0.0, 0.1, 0.125, 1.005, 10.005, 19.999, 123.456_789, -7.335, 1e-9,
            f64::MAX, f64::MIN_POSITIVE,
        ];
        for x in samples {
            let once = round2(x);
            assert_eq!(round2(once), once, "not idempotent for {x}");
        }
    }

    #[test]
    fn test_round2_non_finite_passthrough() {
        assert!(round2(f64::NAN).is_nan());
        assert_eq!(round2(f64::INFINITY), f64::INFINITY);
    }

    #[test]
    fn test_amount_from_str() {
        assert_eq!(Amount::from("19.999"), Amount::Value(dec("19.999")));
        assert_eq!(Amount::from(" 1e2 "), Amount::Value(dec("100")));
        assert_eq!(Amount::from(""), Amount::Value(Decimal::ZERO));
        assert_eq!(Amount::from("12abc"), Amount::NotANumber);
    }

    #[test]
    fn test_to_minor_units() {
        assert_eq!(to_minor_units(dec("19.999")), Some(2000));
        assert_eq!(to_minor_units(dec("19.994")), Some(1999));
        assert_eq!(to_minor_units(dec("0.005")), Some(1));
        assert_eq!(to_minor_units(dec("120")), Some(12000));
        assert_eq!(to_minor_units(Decimal::MAX), None);
    }

    #[test]
    fn test_format_number_with_decimal() {
        assert_eq!(format_number_with_decimal(7.0), "7.00");
        assert_eq!(format_number_with_decimal(1.5), "1.50");
        assert_eq!(format_number_with_decimal(1.234), "1.234");
    }
}
