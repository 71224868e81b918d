//! Products

use std::fmt;

use rusty_money::{Money, iso::Currency};

/// Identifier of a catalog product.
///
/// Ids are opaque strings chosen by the catalog; the cart compares them
/// byte-for-byte and never inspects their contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductId(String);

impl ProductId {
    /// Create an id from any string-like value.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProductId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for ProductId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// A purchasable catalog record.
///
/// Immutable once fetched from the catalog source. The cart stores whole
/// records, so totals and rendering never reach back into the catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    /// Unique id within the catalog.
    pub id: ProductId,

    /// Display title.
    pub title: String,

    /// Unit price.
    pub price: Money<'static, Currency>,

    /// Optional marketing copy for display surfaces.
    pub description: Option<String>,
}

impl Product {
    /// Create a product with no description.
    #[must_use]
    pub fn new(
        id: impl Into<ProductId>,
        title: impl Into<String>,
        price: Money<'static, Currency>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            price,
            description: None,
        }
    }

    /// Attach a description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
