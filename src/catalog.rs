//! Product catalog

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::products::{Product, ProductId};

/// Errors related to catalog construction.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Two products share the same id.
    #[error("Duplicate product id {0}")]
    DuplicateProduct(ProductId),
}

/// An ordered collection of products with id lookup.
///
/// Products keep the order they were inserted in, which is the order a
/// storefront lists them in.
#[derive(Debug, Default, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    index: FxHashMap<ProductId, usize>,
}

impl Catalog {
    /// Create an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a catalog from an ordered list of products.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateProduct` if two products share an id.
    pub fn with_products(
        products: impl IntoIterator<Item = Product>,
    ) -> Result<Self, CatalogError> {
        let mut catalog = Self::new();

        for product in products {
            catalog.insert(product)?;
        }

        Ok(catalog)
    }

    /// Append a product to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateProduct` if the id is already present.
    pub fn insert(&mut self, product: Product) -> Result<(), CatalogError> {
        if self.index.contains_key(&product.id) {
            return Err(CatalogError::DuplicateProduct(product.id));
        }

        self.index.insert(product.id.clone(), self.products.len());
        self.products.push(product);

        Ok(())
    }

    /// Look up a product by id.
    #[must_use]
    pub fn get(&self, id: &ProductId) -> Option<&Product> {
        self.index.get(id).and_then(|&i| self.products.get(i))
    }

    /// Iterate over the products in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Product> {
        self.products.iter()
    }

    /// Number of products in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Whether the catalog holds no products.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rusty_money::{Money, iso::USD};
    use testresult::TestResult;

    use super::*;

    fn course(id: &str, minor: i64) -> Product {
        Product::new(id, format!("Course {id}"), Money::from_minor(minor, USD))
    }

    #[test]
    fn with_products_preserves_insertion_order() -> TestResult {
        let catalog =
            Catalog::with_products([course("b", 200), course("a", 100), course("c", 300)])?;

        let ids: Vec<&str> = catalog.iter().map(|product| product.id.as_str()).collect();

        assert_eq!(ids, vec!["b", "a", "c"]);

        Ok(())
    }

    #[test]
    fn insert_rejects_duplicate_ids() -> TestResult {
        let mut catalog = Catalog::with_products([course("a", 100)])?;

        let result = catalog.insert(course("a", 100));

        assert!(matches!(
            result,
            Err(CatalogError::DuplicateProduct(id)) if id.as_str() == "a"
        ));

        Ok(())
    }

    #[test]
    fn get_finds_products_by_id() -> TestResult {
        let catalog = Catalog::with_products([course("a", 100), course("b", 200)])?;

        assert!(matches!(
            catalog.get(&ProductId::new("b")),
            Some(product) if product.price == Money::from_minor(200, USD)
        ));
        assert!(catalog.get(&ProductId::new("missing")).is_none());

        Ok(())
    }
}
