//! Discounts

use std::fmt;

use decimal_percentage::Percentage;
use rust_decimal::{
    Decimal, RoundingStrategy,
    prelude::{FromPrimitive, ToPrimitive},
};
use thiserror::Error;

/// Errors from constructing a discount code.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountCodeError {
    /// The submitted code was blank.
    #[error("Please enter a discount code.")]
    Empty,
}

/// Errors from applying a discount rate to an amount.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DiscountError {
    /// The rate could not be applied without leaving the minor-unit range.
    #[error("rate application overflowed or was not representable")]
    RateConversion,
}

/// A normalized promotion code.
///
/// Construction trims surrounding whitespace, rejects blank input, and folds
/// to upper-case, so code comparison is case-insensitive everywhere without a
/// second normalization site.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DiscountCode(String);

impl DiscountCode {
    /// Normalize a submitted code.
    ///
    /// # Errors
    ///
    /// Returns `DiscountCodeError::Empty` if the input is blank after
    /// trimming.
    pub fn new(raw: &str) -> Result<Self, DiscountCodeError> {
        let trimmed = raw.trim();

        if trimmed.is_empty() {
            return Err(DiscountCodeError::Empty);
        }

        Ok(Self(trimmed.to_uppercase()))
    }

    /// The normalized code as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DiscountCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for DiscountCode {
    type Err = DiscountCodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

/// Resolution state of the most recent code submission.
///
/// The cycle is `Idle -> Pending -> {Applied | Rejected}` and back to `Idle`
/// when the discount is removed; there are no terminal states.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DiscountStatus {
    /// Nothing submitted since the last reset.
    #[default]
    Idle,

    /// A submission is waiting on the validator.
    Pending,

    /// The most recent submission resolved to a discount.
    Applied,

    /// The most recent submission was turned down.
    Rejected {
        /// Display-ready reason.
        reason: String,
    },
}

impl fmt::Display for DiscountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscountStatus::Idle => f.write_str("idle"),
            DiscountStatus::Pending => f.write_str("pending"),
            DiscountStatus::Applied => f.write_str("applied"),
            DiscountStatus::Rejected { reason } => write!(f, "rejected: {reason}"),
        }
    }
}

/// A percentage price reduction unlocked by a code, applied to the cart
/// subtotal.
#[derive(Debug, Clone, PartialEq)]
pub struct Discount {
    code: DiscountCode,
    rate: Percentage,
    description: Option<String>,
}

impl Discount {
    /// Create a discount with the given code and fractional rate.
    ///
    /// The rate is a fraction (0.2 means 20% off). Validators guarantee rates
    /// below 1, which keeps totals non-negative.
    #[must_use]
    pub fn new(code: DiscountCode, rate: Percentage) -> Self {
        Self {
            code,
            rate,
            description: None,
        }
    }

    /// Attach a display description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// The normalized code.
    #[must_use]
    pub fn code(&self) -> &DiscountCode {
        &self.code
    }

    /// The fractional rate.
    #[must_use]
    pub fn rate(&self) -> Percentage {
        self.rate
    }

    /// The display description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// The discount amount for a subtotal given in minor units.
    ///
    /// # Errors
    ///
    /// Returns `DiscountError::RateConversion` if the amount cannot be
    /// represented in minor units.
    pub fn amount_of_minor(&self, subtotal_minor: i64) -> Result<i64, DiscountError> {
        percent_of_minor(self.rate, subtotal_minor)
    }
}

/// Apply a fractional rate to an amount in minor units.
///
/// Rounds half-away-from-zero exactly once, here, so every total derived from
/// the result agrees with the others to the minor unit.
///
/// # Errors
///
/// Returns `DiscountError::RateConversion` if the multiplication overflows or
/// the result does not fit in minor units.
pub fn percent_of_minor(rate: Percentage, minor: i64) -> Result<i64, DiscountError> {
    let minor = Decimal::from_i64(minor).ok_or(DiscountError::RateConversion)?;

    (rate * Decimal::ONE)
        .checked_mul(minor)
        .ok_or(DiscountError::RateConversion)?
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
        .ok_or(DiscountError::RateConversion)
}

/// Convert a fractional rate to percent points for display (0.2 -> 20).
#[must_use]
pub fn percent_points(rate: Percentage) -> Decimal {
    (rate * Decimal::ONE_HUNDRED).normalize()
}
