//! Integration tests for the asynchronous discount code flow.
//!
//! A submitted code passes through pending while the validator resolves it,
//! then lands on applied or rejected. Rejections only ever touch the status:
//! a discount that was already applied keeps discounting. The `courses`
//! fixture set defines `SAVE10` (10% off) and `SUMMER20` (20% off).

use std::{
    sync::{
        Arc, Mutex, PoisonError,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use rusty_money::{Money, iso::USD};
use testresult::TestResult;

use trellis::{
    discounts::DiscountStatus,
    fixtures::Fixture,
    ledger::CartLedger,
    session::{CartObserver, CartSession},
    snapshot::MemoryStore,
    validate::MockDiscountValidator,
};

struct CountingObserver {
    changes: Arc<AtomicUsize>,
}

impl CartObserver for CountingObserver {
    fn on_cart_changed(&mut self, _ledger: &CartLedger) {
        self.changes.fetch_add(1, Ordering::SeqCst);
    }
}

struct StatusRecorder {
    statuses: Arc<Mutex<Vec<DiscountStatus>>>,
}

impl CartObserver for StatusRecorder {
    fn on_cart_changed(&mut self, ledger: &CartLedger) {
        self.statuses
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ledger.status().clone());
    }
}

#[tokio::test]
async fn fixture_codes_apply_through_the_async_validator() -> TestResult {
    let fixture = Fixture::from_set("courses")?;
    let mut session = CartSession::new(fixture.currency()?, fixture.validator(), MemoryStore::new());

    session.add_item(fixture.product("webdev404")?.clone())?;

    // Lowercase input canonicalizes to SAVE10 before validation.
    let status = session.apply_discount("save10").await;

    assert_eq!(status, DiscountStatus::Applied);

    // 10% of $199.99 is 1999.9 cents, rounding to $20.00.
    let totals = session.totals()?;

    assert_eq!(totals.discount_amount, Money::from_minor(2000, USD));
    assert_eq!(totals.total, Money::from_minor(17999, USD));

    Ok(())
}

#[tokio::test]
async fn later_code_replaces_the_earlier_one() -> TestResult {
    let fixture = Fixture::from_set("courses")?;
    let mut session = CartSession::new(fixture.currency()?, fixture.validator(), MemoryStore::new());

    session.add_item(fixture.product("webdev404")?.clone())?;
    session.apply_discount("SAVE10").await;
    session.apply_discount("SUMMER20").await;

    assert!(matches!(
        session.ledger().discount(),
        Some(discount) if discount.code().as_str() == "SUMMER20"
    ));

    // 20% of $199.99 is 3999.8 cents, rounding to $40.00.
    let totals = session.totals()?;

    assert_eq!(totals.discount_amount, Money::from_minor(4000, USD));
    assert_eq!(totals.total, Money::from_minor(15999, USD));

    Ok(())
}

#[tokio::test]
async fn unknown_code_rejects_but_keeps_the_active_discount() -> TestResult {
    let fixture = Fixture::from_set("courses")?;
    let mut session = CartSession::new(fixture.currency()?, fixture.validator(), MemoryStore::new());

    session.add_item(fixture.product("webdev404")?.clone())?;
    session.apply_discount("SAVE10").await;

    let status = session.apply_discount("EXPIRED99").await;

    assert_eq!(
        status,
        DiscountStatus::Rejected {
            reason: String::from("Invalid discount code.")
        }
    );

    // The earlier SAVE10 still discounts the cart.
    assert!(matches!(
        session.ledger().discount(),
        Some(discount) if discount.code().as_str() == "SAVE10"
    ));
    assert_eq!(session.totals()?.discount_amount, Money::from_minor(2000, USD));

    Ok(())
}

#[tokio::test]
async fn blank_submission_is_rejected_before_validation() -> TestResult {
    let fixture = Fixture::from_set("courses")?;
    let mut validator = MockDiscountValidator::new();

    validator.expect_validate().never();

    let mut session = CartSession::new(fixture.currency()?, validator, MemoryStore::new());

    let status = session.apply_discount("   ").await;

    assert_eq!(
        status,
        DiscountStatus::Rejected {
            reason: String::from("Please enter a discount code.")
        }
    );

    Ok(())
}

#[tokio::test]
async fn a_submission_is_pending_until_the_validator_answers() -> TestResult {
    let fixture = Fixture::from_set("courses")?;
    let mut session = CartSession::new(fixture.currency()?, fixture.validator(), MemoryStore::new());

    let statuses = Arc::new(Mutex::new(Vec::new()));

    session.subscribe(Box::new(StatusRecorder {
        statuses: Arc::clone(&statuses),
    }));

    session.apply_discount("SAVE10").await;

    let recorded = statuses
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();

    assert_eq!(recorded, vec![DiscountStatus::Pending, DiscountStatus::Applied]);

    Ok(())
}

#[tokio::test]
async fn observers_watch_the_full_discount_lifecycle() -> TestResult {
    let fixture = Fixture::from_set("courses")?;
    let mut session = CartSession::new(fixture.currency()?, fixture.validator(), MemoryStore::new());

    let changes = Arc::new(AtomicUsize::new(0));

    session.subscribe(Box::new(CountingObserver {
        changes: Arc::clone(&changes),
    }));

    // One commit for the add, two per validated submission (pending and the
    // outcome), one for the blank rejection.
    session.add_item(fixture.product("ai101")?.clone())?;
    session.apply_discount("SAVE10").await;
    session.apply_discount("EXPIRED99").await;
    session.apply_discount("").await;

    assert_eq!(changes.load(Ordering::SeqCst), 6);

    Ok(())
}

#[tokio::test]
async fn simulated_latency_still_resolves_to_applied() -> TestResult {
    let fixture = Fixture::from_set("courses")?;
    let validator = fixture.validator().with_latency(Duration::from_millis(5));
    let mut session = CartSession::new(fixture.currency()?, validator, MemoryStore::new());

    let status = session.apply_discount("SUMMER20").await;

    assert_eq!(status, DiscountStatus::Applied);

    Ok(())
}
