//! Storefront Example
//!
//! A small course storefront driven from the command line: restores the cart
//! from its snapshot, adds courses from the catalog fixture, applies a
//! discount code against a validator with simulated latency, and prints the
//! receipt. The snapshot is left on disk for the next run.
//!
//! Use `-f` to load a fixture set by name
//! Use `-a` to add a course by id (repeatable)
//! Use `-d` to apply a discount code
//! Use `-s` to choose the snapshot file
//! Use `-l` to set the simulated validation latency in milliseconds
//! Use `--reset` to start from an empty cart
//!
//! Run with: `cargo run --example storefront -- -a ai101 -a ai101 -d SAVE10`

use std::{
    fs::create_dir_all,
    io,
    path::PathBuf,
    time::{Duration, Instant},
};

use anyhow::Result;
use clap::Parser;
use humanize_duration::{Truncate, prelude::DurationExt};
use tracing_subscriber::EnvFilter;
use trellis::{
    fixtures::Fixture,
    receipt::Receipt,
    session::CartSession,
    snapshot::{JsonFileStore, SnapshotStore},
    utils::ExampleStorefrontArgs,
};

/// Storefront Example
#[expect(clippy::print_stdout, reason = "Example code")]
#[tokio::main]
pub async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = ExampleStorefrontArgs::parse();

    let fixture = Fixture::from_set(&args.fixture)?;
    let currency = fixture.currency()?;

    let mut validator = fixture.validator();

    if args.latency > 0 {
        validator = validator.with_latency(Duration::from_millis(args.latency));
    }

    let snapshot_path = PathBuf::from(&args.snapshot);

    if let Some(parent) = snapshot_path.parent() {
        create_dir_all(parent)?;
    }

    let store = JsonFileStore::new(snapshot_path);

    let mut session = if args.reset {
        store.clear()?;

        CartSession::new(currency, validator, store)
    } else {
        CartSession::restore_or_empty(currency, validator, store)
    };

    for id in &args.add {
        let course = fixture.product(id)?;

        session.add_item(course.clone())?;
    }

    if let Some(code) = args.discount.as_deref() {
        let start = Instant::now();
        let status = session.apply_discount(code).await;
        let elapsed = start.elapsed();

        println!(
            "\nDiscount '{code}': {status} ({})",
            elapsed.human(Truncate::Millis)
        );
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    let receipt = Receipt::from_ledger(session.ledger())?;

    receipt.write_to(&mut handle)?;

    if receipt.item_count() > 0 {
        println!("{}", receipt.checkout_confirmation());
    }

    println!("The cart snapshot is saved for the next run.");

    Ok(())
}
