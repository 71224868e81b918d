//! Trellis
//!
//! Trellis is a client-side shopping cart ledger: insertion-ordered line items,
//! an optional percentage discount unlocked by a promotion code, derived totals,
//! snapshot persistence and change notification.

pub mod catalog;
pub mod discounts;
pub mod fixtures;
pub mod ledger;
pub mod prelude;
pub mod products;
pub mod receipt;
pub mod session;
pub mod snapshot;
pub mod utils;
pub mod validate;
