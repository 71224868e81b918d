//! Cart ledger

use rusty_money::{Money, iso::Currency};
use thiserror::Error;

use crate::{
    discounts::{Discount, DiscountError, DiscountStatus},
    products::{Product, ProductId},
};

/// Errors related to cart construction or mutation.
#[derive(Debug, Error)]
pub enum CartError {
    /// A product's currency differs from the cart currency (product id,
    /// product currency, cart currency).
    #[error("Product {0} has currency {1}, but the cart has currency {2}")]
    CurrencyMismatch(ProductId, &'static str, &'static str),

    /// Two lines share the same product id.
    #[error("Duplicate line for product {0}")]
    DuplicateLine(ProductId),
}

/// Errors from deriving cart totals.
#[derive(Debug, Error)]
pub enum TotalsError {
    /// Minor-unit arithmetic left the representable range.
    #[error("cart amount overflowed minor units")]
    AmountOverflow,

    /// The active discount rate could not be applied.
    #[error(transparent)]
    Discount(#[from] DiscountError),
}

/// One catalog product plus the quantity of it currently in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    product: Product,
    quantity: u32,
}

impl LineItem {
    /// Create a line holding a single unit.
    #[must_use]
    pub fn new(product: Product) -> Self {
        Self {
            product,
            quantity: 1,
        }
    }

    /// Create a line with an explicit quantity.
    ///
    /// Returns `None` for a quantity of 0; a line never exists without at
    /// least one unit.
    #[must_use]
    pub fn with_quantity(product: Product, quantity: u32) -> Option<Self> {
        if quantity == 0 {
            return None;
        }

        Some(Self { product, quantity })
    }

    /// The product this line holds.
    #[must_use]
    pub fn product(&self) -> &Product {
        &self.product
    }

    /// Units of the product in the cart, always at least 1.
    #[must_use]
    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    /// The line total in minor units (unit price times quantity).
    ///
    /// # Errors
    ///
    /// Returns `TotalsError::AmountOverflow` if the multiplication overflows.
    pub fn line_total_minor(&self) -> Result<i64, TotalsError> {
        self.product
            .price
            .to_minor_units()
            .checked_mul(i64::from(self.quantity))
            .ok_or(TotalsError::AmountOverflow)
    }

    /// The line total as money in the product currency.
    ///
    /// # Errors
    ///
    /// Returns `TotalsError::AmountOverflow` if the multiplication overflows.
    pub fn line_total(&self) -> Result<Money<'static, Currency>, TotalsError> {
        Ok(Money::from_minor(
            self.line_total_minor()?,
            self.product.price.currency(),
        ))
    }

    fn increment(&mut self) {
        self.quantity = self.quantity.saturating_add(1);
    }

    fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
    }
}

/// Derived money values for a cart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CartTotals {
    /// Sum of line totals before any discount.
    pub subtotal: Money<'static, Currency>,

    /// Amount taken off the subtotal by the active discount.
    pub discount_amount: Money<'static, Currency>,

    /// Subtotal minus the discount amount.
    pub total: Money<'static, Currency>,

    /// Sum of line quantities.
    pub item_count: u64,
}

/// The cart ledger: an insertion-ordered mapping from product id to line
/// item, plus the active discount and its resolution status.
///
/// The ledger holds exactly one currency, fixed at construction; adding a
/// product priced in another currency is an error rather than a conversion.
/// All mutations take `&mut self`, so a single owner serializes them.
#[derive(Debug)]
pub struct CartLedger {
    lines: Vec<LineItem>,
    discount: Option<Discount>,
    status: DiscountStatus,
    currency: &'static Currency,
}

impl CartLedger {
    /// Create an empty cart in the given currency.
    #[must_use]
    pub fn new(currency: &'static Currency) -> Self {
        Self {
            lines: Vec::new(),
            discount: None,
            status: DiscountStatus::Idle,
            currency,
        }
    }

    /// Create a cart holding the given lines, preserving their order.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CurrencyMismatch` if any line is priced in a
    /// different currency, or `CartError::DuplicateLine` if two lines share a
    /// product id.
    pub fn with_lines(
        lines: impl Into<Vec<LineItem>>,
        currency: &'static Currency,
    ) -> Result<Self, CartError> {
        let lines = lines.into();

        lines.iter().enumerate().try_for_each(|(i, line)| {
            let line_currency = line.product().price.currency();

            if line_currency != currency {
                return Err(CartError::CurrencyMismatch(
                    line.product().id.clone(),
                    line_currency.iso_alpha_code,
                    currency.iso_alpha_code,
                ));
            }

            let duplicate = lines
                .iter()
                .take(i)
                .any(|earlier| earlier.product().id == line.product().id);

            if duplicate {
                return Err(CartError::DuplicateLine(line.product().id.clone()));
            }

            Ok(())
        })?;

        Ok(Self {
            lines,
            discount: None,
            status: DiscountStatus::Idle,
            currency,
        })
    }

    /// Add one unit of a product.
    ///
    /// An existing line for the same id gains a unit; otherwise a new line is
    /// appended, preserving first-insertion order for display.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CurrencyMismatch` if the product is priced in a
    /// different currency than the cart.
    pub fn add_item(&mut self, product: Product) -> Result<(), CartError> {
        let product_currency = product.price.currency();

        if product_currency != self.currency {
            return Err(CartError::CurrencyMismatch(
                product.id.clone(),
                product_currency.iso_alpha_code,
                self.currency.iso_alpha_code,
            ));
        }

        match self.lines.iter_mut().find(|line| line.product.id == product.id) {
            Some(line) => line.increment(),
            None => self.lines.push(LineItem::new(product)),
        }

        Ok(())
    }

    /// Delete the line for an id. Absent ids are a no-op, not an error.
    pub fn remove_item(&mut self, id: &ProductId) {
        self.lines.retain(|line| line.product.id != *id);
    }

    /// Set the quantity of an existing line.
    ///
    /// A requested quantity of 0 or below removes the line entirely. Absent
    /// ids are a no-op; this never creates a line.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) {
        if quantity <= 0 {
            self.remove_item(id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);

        if let Some(line) = self.lines.iter_mut().find(|line| line.product.id == *id) {
            line.set_quantity(quantity);
        }
    }

    /// Mark a code submission as in flight.
    ///
    /// The previously applied discount, if any, stays active until the
    /// submission resolves in its favor.
    pub fn begin_discount_request(&mut self) {
        self.status = DiscountStatus::Pending;
    }

    /// Store a resolved discount, replacing any previous one.
    pub fn accept_discount(&mut self, discount: Discount) {
        self.discount = Some(discount);
        self.status = DiscountStatus::Applied;
    }

    /// Record a rejected submission.
    ///
    /// Only the status changes; a previously applied valid discount is never
    /// cleared by a failed attempt.
    pub fn reject_discount(&mut self, reason: impl Into<String>) {
        self.status = DiscountStatus::Rejected {
            reason: reason.into(),
        };
    }

    /// Clear the active discount and reset the status to idle.
    pub fn remove_discount(&mut self) {
        self.discount = None;
        self.status = DiscountStatus::Idle;
    }

    /// Empty the cart and clear the discount and its status.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.remove_discount();
    }

    /// Derive subtotal, discount amount, total, and item count.
    ///
    /// All arithmetic happens in minor units; the discount amount is rounded
    /// half-away-from-zero exactly once, so
    /// `discount_amount + total == subtotal` holds to the minor unit.
    ///
    /// # Errors
    ///
    /// Returns a `TotalsError` if minor-unit arithmetic overflows.
    pub fn totals(&self) -> Result<CartTotals, TotalsError> {
        let subtotal_minor = self.lines.iter().try_fold(0_i64, |acc, line| {
            acc.checked_add(line.line_total_minor()?)
                .ok_or(TotalsError::AmountOverflow)
        })?;

        let discount_minor = match self.discount.as_ref() {
            Some(discount) => discount.amount_of_minor(subtotal_minor)?,
            None => 0,
        };

        let total_minor = subtotal_minor
            .checked_sub(discount_minor)
            .ok_or(TotalsError::AmountOverflow)?;

        let item_count = self
            .lines
            .iter()
            .map(|line| u64::from(line.quantity))
            .sum();

        Ok(CartTotals {
            subtotal: Money::from_minor(subtotal_minor, self.currency),
            discount_amount: Money::from_minor(discount_minor, self.currency),
            total: Money::from_minor(total_minor, self.currency),
            item_count,
        })
    }

    /// Look up the line for an id.
    #[must_use]
    pub fn line(&self, id: &ProductId) -> Option<&LineItem> {
        self.lines.iter().find(|line| line.product.id == *id)
    }

    /// All lines in first-insertion order.
    #[must_use]
    pub fn lines(&self) -> &[LineItem] {
        &self.lines
    }

    /// Iterate over the lines in first-insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &LineItem> {
        self.lines.iter()
    }

    /// The active discount, if one has been applied.
    #[must_use]
    pub fn discount(&self) -> Option<&Discount> {
        self.discount.as_ref()
    }

    /// Resolution state of the most recent code submission.
    #[must_use]
    pub fn status(&self) -> &DiscountStatus {
        &self.status
    }

    /// The cart currency.
    #[must_use]
    pub fn currency(&self) -> &'static Currency {
        self.currency
    }

    /// Number of distinct lines (not units) in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart holds no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
