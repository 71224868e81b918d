//! Snapshot persistence
//!
//! A snapshot is the serialized form of a cart, written after every committed
//! mutation and read once at startup. It is a best-effort cache with no
//! versioning: anything unreadable hydrates an empty cart instead.

use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, Mutex, PoisonError},
};

use decimal_percentage::Percentage;
use mockall::automock;
use rust_decimal::Decimal;
use rusty_money::{
    Money,
    iso::{self, Currency},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    discounts::{Discount, DiscountCode, DiscountCodeError},
    ledger::{CartError, CartLedger, LineItem},
    products::{Product, ProductId},
};

/// Errors related to writing, reading, or hydrating snapshots.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// IO error
    #[error(transparent)]
    IO(#[from] io::Error),

    /// Error serializing or deserializing the snapshot document
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// The snapshot names a currency the crate does not know.
    #[error("Unknown currency: {0}")]
    UnknownCurrency(String),

    /// A snapshot line carries a quantity of 0.
    #[error("Snapshot line {0} has a quantity of 0")]
    InvalidQuantity(ProductId),

    /// The discount rate is not a decimal fraction.
    #[error("Snapshot discount rate {0:?} is not a decimal")]
    InvalidRate(String),

    /// The snapshot lines do not form a valid cart.
    #[error(transparent)]
    Cart(#[from] CartError),

    /// The snapshot discount code is blank.
    #[error(transparent)]
    DiscountCode(#[from] DiscountCodeError),
}

/// One cart line as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineSnapshot {
    /// Product id.
    pub id: String,

    /// Product title.
    pub title: String,

    /// Unit price in minor units of the snapshot currency.
    pub price_minor: i64,

    /// Product description, if the catalog had one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Units in the cart.
    pub quantity: u32,
}

/// The applied discount as persisted.
///
/// Only durable state is written: the resolution status is derived on
/// hydration (a stored discount hydrates as applied).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscountSnapshot {
    /// Canonical discount code.
    pub code: String,

    /// Rate as a decimal fraction string, e.g. `"0.2"`.
    pub rate: String,

    /// Promotion description, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The serialized form of a whole cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSnapshot {
    /// ISO alpha code of the cart currency.
    pub currency: String,

    /// Lines in first-insertion order.
    pub lines: Vec<LineSnapshot>,

    /// The applied discount, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub discount: Option<DiscountSnapshot>,
}

impl CartSnapshot {
    /// Capture the durable state of a ledger.
    #[must_use]
    pub fn from_ledger(ledger: &CartLedger) -> Self {
        let lines = ledger
            .iter()
            .map(|line| LineSnapshot {
                id: line.product().id.to_string(),
                title: line.product().title.clone(),
                price_minor: line.product().price.to_minor_units(),
                description: line.product().description.clone(),
                quantity: line.quantity(),
            })
            .collect();

        let discount = ledger.discount().map(|discount| DiscountSnapshot {
            code: discount.code().to_string(),
            rate: (discount.rate() * Decimal::ONE).normalize().to_string(),
            description: discount.description().map(ToOwned::to_owned),
        });

        Self {
            currency: ledger.currency().iso_alpha_code.to_string(),
            lines,
            discount,
        }
    }

    /// Rebuild a ledger from this snapshot.
    ///
    /// A stored discount hydrates with an applied status; a snapshot without
    /// one hydrates idle.
    ///
    /// # Errors
    ///
    /// Returns a `SnapshotError` if the currency is unknown, a line carries a
    /// quantity of 0, the lines do not form a valid cart, or the discount
    /// fields do not parse.
    pub fn into_ledger(self) -> Result<CartLedger, SnapshotError> {
        let currency = currency_from_code(&self.currency)?;

        let lines = self
            .lines
            .into_iter()
            .map(|line| {
                let product = Product {
                    id: ProductId::new(&line.id),
                    title: line.title,
                    price: Money::from_minor(line.price_minor, currency),
                    description: line.description,
                };

                LineItem::with_quantity(product, line.quantity)
                    .ok_or_else(|| SnapshotError::InvalidQuantity(ProductId::new(&line.id)))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut ledger = CartLedger::with_lines(lines, currency)?;

        if let Some(snapshot) = self.discount {
            let code = DiscountCode::new(&snapshot.code)?;

            let rate = Percentage::try_from(snapshot.rate.as_str())
                .map_err(|_err| SnapshotError::InvalidRate(snapshot.rate.clone()))?;

            let mut discount = Discount::new(code, rate);

            if let Some(description) = snapshot.description {
                discount = discount.with_description(description);
            }

            ledger.accept_discount(discount);
        }

        Ok(ledger)
    }
}

fn currency_from_code(code: &str) -> Result<&'static Currency, SnapshotError> {
    match code {
        "GBP" => Ok(iso::GBP),
        "USD" => Ok(iso::USD),
        "EUR" => Ok(iso::EUR),
        _ => Err(SnapshotError::UnknownCurrency(code.to_string())),
    }
}

/// A store that keeps the snapshot as a JSON document on disk.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// Create a store writing to the given file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file the snapshot is written to.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for JsonFileStore {
    fn save(&self, snapshot: &CartSnapshot) -> Result<(), SnapshotError> {
        let json = serde_json::to_string_pretty(snapshot)?;

        fs::write(&self.path, json)?;

        Ok(())
    }

    fn load(&self) -> Result<Option<CartSnapshot>, SnapshotError> {
        if !self.path.is_file() {
            return Ok(None);
        }

        let json = fs::read_to_string(&self.path)?;

        Ok(Some(serde_json::from_str(&json)?))
    }

    fn clear(&self) -> Result<(), SnapshotError> {
        if self.path.is_file() {
            fs::remove_file(&self.path)?;
        }

        Ok(())
    }
}

/// An in-memory store for tests and demos.
///
/// Clones are handles onto the same storage, so one clone can be moved into
/// a session while another inspects what the session wrote.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    snapshot: Arc<Mutex<Option<CartSnapshot>>>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemoryStore {
    fn save(&self, snapshot: &CartSnapshot) -> Result<(), SnapshotError> {
        let mut guard = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);

        *guard = Some(snapshot.clone());

        Ok(())
    }

    fn load(&self) -> Result<Option<CartSnapshot>, SnapshotError> {
        let guard = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);

        Ok(guard.clone())
    }

    fn clear(&self) -> Result<(), SnapshotError> {
        let mut guard = self.snapshot.lock().unwrap_or_else(PoisonError::into_inner);

        *guard = None;

        Ok(())
    }
}

/// Where snapshots are kept between sessions.
#[automock]
pub trait SnapshotStore: Send + Sync {
    /// Persist a snapshot, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns a `SnapshotError` if the snapshot cannot be written.
    fn save(&self, snapshot: &CartSnapshot) -> Result<(), SnapshotError>;

    /// Load the most recent snapshot, or `None` if none has been saved.
    ///
    /// # Errors
    ///
    /// Returns a `SnapshotError` if a stored snapshot cannot be read.
    fn load(&self) -> Result<Option<CartSnapshot>, SnapshotError>;

    /// Forget the stored snapshot.
    ///
    /// # Errors
    ///
    /// Returns a `SnapshotError` if the stored snapshot cannot be removed.
    fn clear(&self) -> Result<(), SnapshotError>;
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rusty_money::iso::USD;
    use tempfile::tempdir;
    use testresult::TestResult;

    use crate::discounts::DiscountStatus;

    use super::*;

    fn ledger_with_discount() -> TestResult<CartLedger> {
        let mut ledger = CartLedger::new(USD);

        ledger.add_item(
            Product::new("ai001", "AI Fundamentals", Money::from_minor(14999, USD))
                .with_description("An introduction to artificial intelligence"),
        )?;
        ledger.add_item(Product::new(
            "ml205",
            "Machine Learning",
            Money::from_minor(18999, USD),
        ))?;
        ledger.add_item(Product::new(
            "ml205",
            "Machine Learning",
            Money::from_minor(18999, USD),
        ))?;

        ledger.accept_discount(
            Discount::new(DiscountCode::new("SUMMER20")?, Percentage::from(0.2))
                .with_description("20% off Summer Sale"),
        );

        Ok(ledger)
    }

    #[test]
    fn snapshot_roundtrip_preserves_the_cart() -> TestResult {
        let ledger = ledger_with_discount()?;

        let restored = CartSnapshot::from_ledger(&ledger).into_ledger()?;

        let ids: Vec<&str> = restored
            .iter()
            .map(|line| line.product().id.as_str())
            .collect();

        assert_eq!(ids, vec!["ai001", "ml205"]);
        assert!(matches!(
            restored.line(&ProductId::new("ml205")),
            Some(line) if line.quantity() == 2
        ));
        assert!(matches!(
            restored.line(&ProductId::new("ai001")),
            Some(line) if line.product().description.as_deref()
                == Some("An introduction to artificial intelligence")
        ));
        assert_eq!(restored.status(), &DiscountStatus::Applied);
        assert!(matches!(
            restored.discount(),
            Some(discount) if discount.code().as_str() == "SUMMER20"
                && discount.rate() == Percentage::from(0.2)
        ));

        Ok(())
    }

    #[test]
    fn snapshot_without_discount_hydrates_idle() -> TestResult {
        let mut ledger = CartLedger::new(USD);

        ledger.add_item(Product::new("a", "A", Money::from_minor(100, USD)))?;

        let restored = CartSnapshot::from_ledger(&ledger).into_ledger()?;

        assert!(restored.discount().is_none());
        assert_eq!(restored.status(), &DiscountStatus::Idle);

        Ok(())
    }

    #[test]
    fn unknown_currency_fails_hydration() {
        let snapshot = CartSnapshot {
            currency: String::from("XYZ"),
            lines: vec![],
            discount: None,
        };

        let result = snapshot.into_ledger();

        assert!(
            matches!(result, Err(SnapshotError::UnknownCurrency(ref code)) if code == "XYZ"),
            "expected UnknownCurrency, got {result:?}"
        );
    }

    #[test]
    fn zero_quantity_line_fails_hydration() {
        let snapshot = CartSnapshot {
            currency: String::from("USD"),
            lines: vec![LineSnapshot {
                id: String::from("a"),
                title: String::from("A"),
                price_minor: 100,
                description: None,
                quantity: 0,
            }],
            discount: None,
        };

        let result = snapshot.into_ledger();

        assert!(
            matches!(result, Err(SnapshotError::InvalidQuantity(ref id)) if id.as_str() == "a"),
            "expected InvalidQuantity, got {result:?}"
        );
    }

    #[test]
    fn malformed_rate_fails_hydration() {
        let snapshot = CartSnapshot {
            currency: String::from("USD"),
            lines: vec![],
            discount: Some(DiscountSnapshot {
                code: String::from("SUMMER20"),
                rate: String::from("a fifth"),
                description: None,
            }),
        };

        let result = snapshot.into_ledger();

        assert!(
            matches!(result, Err(SnapshotError::InvalidRate(ref rate)) if rate == "a fifth"),
            "expected InvalidRate, got {result:?}"
        );
    }

    #[test]
    fn json_file_store_roundtrip() -> TestResult {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().join("cart.json"));
        let snapshot = CartSnapshot::from_ledger(&ledger_with_discount()?);

        assert!(store.load()?.is_none());

        store.save(&snapshot)?;

        assert_eq!(store.load()?, Some(snapshot));

        store.clear()?;

        assert!(store.load()?.is_none());

        Ok(())
    }

    #[test]
    fn json_file_store_save_replaces_previous_snapshot() -> TestResult {
        let dir = tempdir()?;
        let store = JsonFileStore::new(dir.path().join("cart.json"));

        let full = CartSnapshot::from_ledger(&ledger_with_discount()?);
        let empty = CartSnapshot::from_ledger(&CartLedger::new(USD));

        store.save(&full)?;
        store.save(&empty)?;

        assert_eq!(store.load()?, Some(empty));

        Ok(())
    }

    #[test]
    fn json_file_store_corrupt_file_is_an_error() -> TestResult {
        let dir = tempdir()?;
        let path = dir.path().join("cart.json");

        fs::write(&path, "{ not json")?;

        let result = JsonFileStore::new(&path).load();

        assert!(
            matches!(result, Err(SnapshotError::Json(_))),
            "expected Json error, got {result:?}"
        );

        Ok(())
    }

    #[test]
    fn memory_store_roundtrip() -> TestResult {
        let store = MemoryStore::new();
        let snapshot = CartSnapshot::from_ledger(&ledger_with_discount()?);

        store.save(&snapshot)?;

        assert_eq!(store.load()?, Some(snapshot));

        store.clear()?;

        assert!(store.load()?.is_none());

        Ok(())
    }
}
