//! Utils

use clap::Parser;

/// Arguments for the storefront example
#[derive(Debug, Parser)]
pub struct ExampleStorefrontArgs {
    /// Fixture set to use for the catalog & discounts
    #[clap(short, long, default_value = "courses")]
    pub fixture: String,

    /// Course ids to add to the cart (repeatable)
    #[clap(short, long)]
    pub add: Vec<String>,

    /// Discount code to apply at checkout
    #[clap(short, long)]
    pub discount: Option<String>,

    /// Snapshot file path
    #[clap(short, long, default_value = "target/cart.json")]
    pub snapshot: String,

    /// Simulated validation latency in milliseconds
    #[clap(short, long, default_value_t = 400)]
    pub latency: u64,

    /// Start from an empty cart instead of the stored snapshot
    #[clap(long)]
    pub reset: bool,
}
