//! Trellis prelude.
//!
//! Convenience exports for common library consumers.

pub use crate::{
    catalog::{Catalog, CatalogError},
    discounts::{Discount, DiscountCode, DiscountCodeError, DiscountError, DiscountStatus},
    fixtures::{Fixture, FixtureError},
    ledger::{CartError, CartLedger, CartTotals, LineItem, TotalsError},
    products::{Product, ProductId},
    receipt::{Receipt, ReceiptError},
    session::{CartObserver, CartSession, NoopObserver},
    snapshot::{CartSnapshot, JsonFileStore, MemoryStore, SnapshotError, SnapshotStore},
    validate::{DiscountValidator, TableValidator, ValidateError},
};
