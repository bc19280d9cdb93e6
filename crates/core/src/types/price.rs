//! Type-safe item price using decimal arithmetic.
//!
//! Prices are stored as [`Decimal`] to avoid float rounding, and are
//! guaranteed non-negative with at most [`MAX_SCALE`] decimal places once
//! constructed. Input that `Decimal` could only hold by rounding is rejected
//! rather than silently truncated.

use core::fmt;

use rust_decimal::Decimal;
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, Visitor},
};

/// Maximum number of decimal places a price may carry.
pub const MAX_SCALE: u32 = 4;

/// Errors that can occur when constructing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The amount is below zero.
    #[error("price must not be negative (got {0})")]
    Negative(Decimal),

    /// The amount has more decimal places than a price may carry.
    #[error("price must have at most {max} decimal places", max = MAX_SCALE)]
    TooPrecise,

    /// The input is not a decimal number in range.
    #[error("price is not a valid amount: {0}")]
    Invalid(String),
}

/// A non-negative item price in the store's currency.
///
/// ## Examples
///
/// ```
/// use rust_decimal::Decimal;
/// use storekeep_core::Price;
///
/// assert!(Price::new(Decimal::new(25, 1)).is_ok());   // 2.5
/// assert!(Price::new(Decimal::ZERO).is_ok());
/// assert!(Price::new(Decimal::new(-1, 0)).is_err());
/// assert!(Price::new(Decimal::new(1, 5)).is_err());   // 0.00001
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Create a price, rejecting negative or over-precise amounts.
    ///
    /// # Errors
    ///
    /// Returns [`PriceError::Negative`] if `amount` is below zero and
    /// [`PriceError::TooPrecise`] if it has more than [`MAX_SCALE`] decimal
    /// places after trailing zeros are dropped.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount < Decimal::ZERO {
            return Err(PriceError::Negative(amount));
        }
        let amount = amount.normalize();
        if amount.scale() > MAX_SCALE {
            return Err(PriceError::TooPrecise);
        }
        Ok(Self(amount))
    }

    /// The amount as a decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl<'de> Deserialize<'de> for Price {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let amount = exact::deserialize(deserializer)?;
        Self::new(amount).map_err(de::Error::custom)
    }
}

/// Parse a decimal amount without rounding.
///
/// Accepts plain (`"19.99"`) and scientific (`"1.5e2"`) notation. Sign is not
/// checked here; [`Price::new`] does that.
///
/// # Errors
///
/// Returns [`PriceError::TooPrecise`] if the text has more than [`MAX_SCALE`]
/// significant decimal places, and [`PriceError::Invalid`] if it is not a
/// number or is out of range for [`Decimal`].
pub fn parse_amount(text: &str) -> Result<Decimal, PriceError> {
    let text = text.trim();
    let parsed = if text.contains(['e', 'E']) {
        Decimal::from_scientific(text)
    } else {
        Decimal::from_str_exact(text)
    };

    let amount = parsed
        .map_err(|err| match err {
            rust_decimal::Error::Underflow | rust_decimal::Error::ScaleExceedsMaximumPrecision(_) => {
                PriceError::TooPrecise
            }
            _ => PriceError::Invalid(text.to_string()),
        })?
        .normalize();

    if amount.scale() > MAX_SCALE {
        return Err(PriceError::TooPrecise);
    }
    Ok(amount)
}

/// Serde helpers that read a [`Decimal`] through [`parse_amount`].
///
/// Used on request bodies so a JSON number like `1e-30` fails instead of
/// arriving as zero:
///
/// ```
/// use rust_decimal::Decimal;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Body {
///     #[serde(deserialize_with = "storekeep_core::price::exact::deserialize")]
///     price: Decimal,
/// }
///
/// assert!(serde_json::from_str::<Body>(r#"{"price": 2.5}"#).is_ok());
/// assert!(serde_json::from_str::<Body>(r#"{"price": 1e-30}"#).is_err());
/// ```
pub mod exact {
    use super::{Decimal, Deserializer, MAX_SCALE, Visitor, de, fmt, parse_amount};

    struct ExactDecimal;

    impl Visitor<'_> for ExactDecimal {
        type Value = Decimal;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "a decimal amount with at most {MAX_SCALE} decimal places")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<Decimal, E> {
            Ok(Decimal::from(value))
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<Decimal, E> {
            Ok(Decimal::from(value))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<Decimal, E> {
            if !value.is_finite() {
                return Err(E::invalid_value(de::Unexpected::Float(value), &self));
            }
            // f64 Display is the shortest round-trip form, never exponential.
            parse_amount(&value.to_string()).map_err(E::custom)
        }

        fn visit_str<E: de::Error>(self, value: &str) -> Result<Decimal, E> {
            parse_amount(value).map_err(E::custom)
        }
    }

    /// Deserialize a required amount.
    ///
    /// # Errors
    ///
    /// Fails on non-numeric input or precision loss.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ExactDecimal)
    }

    /// Deserialize an optional amount; `null` yields `None`.
    ///
    /// Pair with `#[serde(default)]` so an absent field is also `None`.
    ///
    /// # Errors
    ///
    /// Fails on non-numeric input or precision loss.
    pub fn option<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct OptionalExact;

        impl<'de> Visitor<'de> for OptionalExact {
            type Value = Option<Decimal>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a decimal amount or null")
            }

            fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
                Ok(None)
            }

            fn visit_some<D2: Deserializer<'de>>(self, inner: D2) -> Result<Self::Value, D2::Error> {
                deserialize(inner).map(Some)
            }
        }

        deserializer.deserialize_option(OptionalExact)
    }
}
