//! Discount code validation

use std::time::Duration;

use async_trait::async_trait;
use mockall::automock;
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::discounts::{Discount, DiscountCode};

/// Errors from resolving a discount code.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidateError {
    /// The code is not a known promotion.
    #[error("Invalid discount code.")]
    UnknownCode,
}

/// A validator backed by a fixed table of known discounts.
///
/// Lookup happens entirely in memory; an optional artificial latency stands
/// in for the round trip a remote validation service would take.
#[derive(Debug, Default, Clone)]
pub struct TableValidator {
    discounts: FxHashMap<DiscountCode, Discount>,
    latency: Option<Duration>,
}

impl TableValidator {
    /// Create a validator that knows the given discounts.
    #[must_use]
    pub fn new(discounts: impl IntoIterator<Item = Discount>) -> Self {
        Self {
            discounts: discounts
                .into_iter()
                .map(|discount| (discount.code().clone(), discount))
                .collect(),
            latency: None,
        }
    }

    /// Delay each validation by the given duration.
    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }
}

#[async_trait]
impl DiscountValidator for TableValidator {
    async fn validate(&self, code: &DiscountCode) -> Result<Discount, ValidateError> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        self.discounts
            .get(code)
            .cloned()
            .ok_or(ValidateError::UnknownCode)
    }
}

/// Resolves a discount code to the discount it unlocks.
///
/// Implementations may take arbitrarily long and may be backed by anything
/// from an in-memory table to a remote service.
#[automock]
#[async_trait]
pub trait DiscountValidator: Send + Sync {
    /// Resolve a code to its discount.
    ///
    /// # Errors
    ///
    /// Returns `ValidateError::UnknownCode` if the code does not unlock a
    /// discount.
    async fn validate(&self, code: &DiscountCode) -> Result<Discount, ValidateError>;
}
