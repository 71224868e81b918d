//! Cart session
//!
//! `CartSession` is the state container the composition root owns: it holds
//! the ledger, the discount validator, the snapshot store, and the observer
//! list, and it is passed by reference to whatever drives it. Every mutation
//! goes through the session, which persists a snapshot and notifies observers
//! after the ledger has changed.

use std::fmt;

use rusty_money::iso::Currency;
use smallvec::SmallVec;
use tracing::{Span, debug, info, warn};

use crate::{
    discounts::{DiscountCode, DiscountStatus, percent_points},
    ledger::{CartError, CartLedger, CartTotals, TotalsError},
    products::{Product, ProductId},
    snapshot::{CartSnapshot, SnapshotStore},
    validate::DiscountValidator,
};

/// Observer of committed cart changes.
///
/// Observers are registered on a session and called after every committed
/// mutation with the cart as it now stands. They passively record or render;
/// mutating the cart from a callback is not possible.
pub trait CartObserver: Send + Sync {
    /// Called after each committed mutation.
    fn on_cart_changed(&mut self, ledger: &CartLedger);
}

/// No-op observer for unobserved sessions.
#[derive(Debug, Default)]
pub struct NoopObserver;

impl CartObserver for NoopObserver {
    fn on_cart_changed(&mut self, _ledger: &CartLedger) {}
}

/// The cart state container.
///
/// Operations forward to the ledger, then commit: the snapshot store receives
/// the new state (failures are logged and swallowed; the in-memory ledger
/// stays authoritative) and every observer is notified.
///
/// `apply_discount` holds `&mut self` across its await, so a second
/// submission cannot start until the first resolves; responses therefore
/// apply in completion order and the last one wins.
pub struct CartSession<V, S> {
    ledger: CartLedger,
    validator: V,
    store: S,
    observers: SmallVec<[Box<dyn CartObserver>; 2]>,
}

impl<V, S> fmt::Debug for CartSession<V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CartSession")
            .field("ledger", &self.ledger)
            .field("validator", &"<DiscountValidator>")
            .field("store", &"<SnapshotStore>")
            .field(
                "observers",
                &format!("[{} observers]", self.observers.len()),
            )
            .finish()
    }
}

impl<V, S> CartSession<V, S>
where
    V: DiscountValidator,
    S: SnapshotStore,
{
    /// Create a session with an empty cart.
    #[must_use]
    pub fn new(currency: &'static Currency, validator: V, store: S) -> Self {
        Self {
            ledger: CartLedger::new(currency),
            validator,
            store,
            observers: SmallVec::new(),
        }
    }

    /// Create a session from the stored snapshot, or with an empty cart if
    /// there is none.
    ///
    /// The snapshot is a best-effort cache: one that cannot be read, does not
    /// parse, or was written for a different currency is discarded with a
    /// warning rather than surfaced as an error.
    #[must_use]
    pub fn restore_or_empty(currency: &'static Currency, validator: V, store: S) -> Self {
        let ledger = match store.load() {
            Ok(Some(snapshot)) => match snapshot.into_ledger() {
                Ok(ledger) if ledger.currency() == currency => ledger,
                Ok(ledger) => {
                    warn!(
                        snapshot_currency = ledger.currency().iso_alpha_code,
                        cart_currency = currency.iso_alpha_code,
                        "discarding cart snapshot in a different currency"
                    );

                    CartLedger::new(currency)
                }
                Err(error) => {
                    warn!(%error, "discarding unreadable cart snapshot");

                    CartLedger::new(currency)
                }
            },
            Ok(None) => CartLedger::new(currency),
            Err(error) => {
                warn!(%error, "failed to load cart snapshot");

                CartLedger::new(currency)
            }
        };

        Self {
            ledger,
            validator,
            store,
            observers: SmallVec::new(),
        }
    }

    /// Register an observer to be called after every committed mutation.
    pub fn subscribe(&mut self, observer: Box<dyn CartObserver>) {
        self.observers.push(observer);
    }

    /// The cart as it currently stands.
    #[must_use]
    pub fn ledger(&self) -> &CartLedger {
        &self.ledger
    }

    /// Derive the current totals.
    ///
    /// # Errors
    ///
    /// Returns a `TotalsError` if minor-unit arithmetic overflows.
    pub fn totals(&self) -> Result<CartTotals, TotalsError> {
        self.ledger.totals()
    }

    /// Add one unit of a product to the cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::CurrencyMismatch` if the product is priced in a
    /// different currency than the cart. Nothing is persisted in that case.
    #[tracing::instrument(
        name = "cart.session.add_item",
        skip(self, product),
        fields(product_id = %product.id),
        err
    )]
    pub fn add_item(&mut self, product: Product) -> Result<(), CartError> {
        self.ledger.add_item(product)?;

        debug!("added item to cart");

        self.commit();

        Ok(())
    }

    /// Remove the line for an id. Absent ids are a no-op.
    #[tracing::instrument(name = "cart.session.remove_item", skip(self, id), fields(product_id = %id))]
    pub fn remove_item(&mut self, id: &ProductId) {
        self.ledger.remove_item(id);

        debug!("removed item from cart");

        self.commit();
    }

    /// Set the quantity of an existing line; 0 or below removes it.
    #[tracing::instrument(
        name = "cart.session.update_quantity",
        skip(self, id),
        fields(product_id = %id)
    )]
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) {
        self.ledger.update_quantity(id, quantity);

        debug!("updated item quantity");

        self.commit();
    }

    /// Submit a discount code and wait for it to resolve.
    ///
    /// A blank submission rejects immediately without consulting the
    /// validator. Otherwise the status passes through pending while the
    /// validator runs, then lands on applied or rejected. A rejection never
    /// clears a previously applied discount.
    #[tracing::instrument(
        name = "cart.session.apply_discount",
        skip(self, code),
        fields(code = tracing::field::Empty)
    )]
    pub async fn apply_discount(&mut self, code: &str) -> DiscountStatus {
        let code = match DiscountCode::new(code) {
            Ok(code) => code,
            Err(error) => {
                self.ledger.reject_discount(error.to_string());
                self.commit();

                return self.ledger.status().clone();
            }
        };

        Span::current().record("code", tracing::field::display(&code));

        self.ledger.begin_discount_request();
        self.commit();

        match self.validator.validate(&code).await {
            Ok(discount) => {
                info!(rate = %percent_points(discount.rate()), "applied discount");

                self.ledger.accept_discount(discount);
            }
            Err(error) => {
                info!(%error, "rejected discount");

                self.ledger.reject_discount(error.to_string());
            }
        }

        self.commit();

        self.ledger.status().clone()
    }

    /// Drop the active discount and reset the status to idle.
    #[tracing::instrument(name = "cart.session.remove_discount", skip(self))]
    pub fn remove_discount(&mut self) {
        self.ledger.remove_discount();

        debug!("removed discount");

        self.commit();
    }

    /// Empty the cart, dropping every line and the discount.
    #[tracing::instrument(name = "cart.session.clear", skip(self))]
    pub fn clear(&mut self) {
        self.ledger.clear();

        debug!("cleared cart");

        self.commit();
    }

    fn commit(&mut self) {
        let snapshot = CartSnapshot::from_ledger(&self.ledger);

        if let Err(error) = self.store.save(&snapshot) {
            warn!(%error, "failed to persist cart snapshot");
        }

        for observer in &mut self.observers {
            observer.on_cart_changed(&self.ledger);
        }
    }
}
