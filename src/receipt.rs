//! Receipt

use std::{fmt::Write, io};

use rust_decimal::Decimal;
use rusty_money::{Money, iso::Currency};
use tabled::{
    builder::Builder,
    grid::config::HorizontalLine,
    settings::{
        Alignment, Color, Style, Theme,
        object::{Columns, Rows},
    },
};
use thiserror::Error;

use crate::{
    discounts::percent_points,
    ledger::{CartLedger, TotalsError},
};

/// Errors that can occur when building or writing a receipt.
#[derive(Debug, Error)]
pub enum ReceiptError {
    /// Error deriving cart totals.
    #[error(transparent)]
    Totals(#[from] TotalsError),

    /// IO error
    #[error("IO error")]
    IO,
}

/// One itemized line of the receipt.
#[derive(Debug, Clone)]
struct ReceiptRow {
    title: String,
    quantity: u32,
    unit_price: Money<'static, Currency>,
    line_total: Money<'static, Currency>,
}

/// The discount line of the receipt.
#[derive(Debug, Clone)]
struct DiscountRow {
    code: String,
    percent_points: Decimal,
    amount: Money<'static, Currency>,
}

/// Printable summary of a cart: an itemized table plus a totals block.
#[derive(Debug, Clone)]
pub struct Receipt {
    rows: Vec<ReceiptRow>,
    discount: Option<DiscountRow>,
    subtotal: Money<'static, Currency>,
    total: Money<'static, Currency>,
    item_count: u64,
}

impl Receipt {
    /// Build a receipt from the current cart state.
    ///
    /// # Errors
    ///
    /// Returns a [`ReceiptError`] if the cart totals cannot be derived.
    pub fn from_ledger(ledger: &CartLedger) -> Result<Self, ReceiptError> {
        let totals = ledger.totals()?;

        let rows = ledger
            .iter()
            .map(|line| {
                Ok(ReceiptRow {
                    title: line.product().title.clone(),
                    quantity: line.quantity(),
                    unit_price: line.product().price,
                    line_total: line.line_total()?,
                })
            })
            .collect::<Result<Vec<_>, TotalsError>>()?;

        let discount = ledger.discount().map(|discount| DiscountRow {
            code: discount.code().to_string(),
            percent_points: percent_points(discount.rate()),
            amount: totals.discount_amount,
        });

        Ok(Self {
            rows,
            discount,
            subtotal: totals.subtotal,
            total: totals.total,
            item_count: totals.item_count,
        })
    }

    /// Sum of line totals before the discount.
    #[must_use]
    pub fn subtotal(&self) -> Money<'static, Currency> {
        self.subtotal
    }

    /// Amount due after the discount.
    #[must_use]
    pub fn total(&self) -> Money<'static, Currency> {
        self.total
    }

    /// Sum of line quantities.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.item_count
    }

    /// One-line checkout confirmation echoing the total and item count.
    #[must_use]
    pub fn checkout_confirmation(&self) -> String {
        format!(
            "Checkout initiated! Total: {} for {} items. Thank you for your purchase!",
            self.total, self.item_count
        )
    }

    /// Prints the receipt to the given writer.
    ///
    /// # Errors
    ///
    /// Returns an error if the receipt cannot be written.
    pub fn write_to(&self, mut out: impl io::Write) -> Result<(), ReceiptError> {
        if self.rows.is_empty() {
            return writeln!(out, "\nYour cart is empty.").map_err(|_err| ReceiptError::IO);
        }

        let mut builder = Builder::default();

        builder.push_record(["", "Item", "Qty", "Unit Price", "Line Total"]);

        for (idx, row) in self.rows.iter().enumerate() {
            builder.push_record([
                format!("#{:<3}", idx + 1),
                row.title.clone(),
                row.quantity.to_string(),
                format!("{}", row.unit_price),
                format!("{}", row.line_total),
            ]);
        }

        write_receipt_table(&mut out, builder)?;

        write_receipt_summary(&mut out, self)?;

        Ok(())
    }
}

fn write_receipt_table(out: &mut impl io::Write, builder: Builder) -> Result<(), ReceiptError> {
    let mut table = builder.build();
    let mut theme = Theme::from(Style::modern_rounded());
    let separator = HorizontalLine::new(Some('─'), Some('┼'), Some('├'), Some('┤'));

    theme.remove_horizontal_lines();
    theme.insert_horizontal_line(1, separator);

    table.with(theme);
    table.modify(Rows::first(), Color::BOLD);
    table.modify(Columns::new(2..5), Alignment::right());

    let table_str = colorize_borders(&table.to_string());

    writeln!(out, "\n{table_str}").map_err(|_err| ReceiptError::IO)
}

fn write_receipt_summary(out: &mut impl io::Write, receipt: &Receipt) -> Result<(), ReceiptError> {
    let subtotal_label = " Subtotal:";
    let total_label = " \x1b[1mTotal:\x1b[0m";

    let discount_line = receipt.discount.as_ref().map(|discount| {
        (
            format!(" Discount ({} -{}%):", discount.code, discount.percent_points),
            format!("-{}  ", discount.amount),
        )
    });

    let subtotal_val = format!("{}  ", receipt.subtotal);
    let total_val = format!("{}  ", receipt.total);

    let mut label_width = visible_width(subtotal_label).max(visible_width(total_label));
    let mut value_width = subtotal_val.len().max(total_val.len());

    if let Some((label, value)) = &discount_line {
        label_width = label_width.max(visible_width(label));
        value_width = value_width.max(value.len());
    }

    write_summary_line(out, subtotal_label, &subtotal_val, label_width, value_width)?;

    if let Some((label, value)) = &discount_line {
        write_summary_line(out, label, value, label_width, value_width)?;
    }

    write_summary_line(
        out,
        total_label,
        &format!("\x1b[1m{total_val}\x1b[0m"),
        label_width,
        value_width,
    )?;

    writeln!(out).map_err(|_err| ReceiptError::IO)
}

/// Wraps runs of UTF-8 box-drawing characters in ANSI dark-grey escape codes.
///
/// Box-drawing characters occupy the Unicode range U+2500..U+257F. This function
/// scans each character, grouping consecutive border characters and emitting a
/// single grey escape sequence around each run, leaving cell content untouched.
fn colorize_borders(table: &str) -> String {
    let mut out = String::with_capacity(table.len() + 256);
    let mut in_run = false;

    for ch in table.chars() {
        let box_char = ('\u{2500}'..='\u{257F}').contains(&ch);

        if box_char && !in_run {
            _ = out.write_str("\x1b[90m");
            in_run = true;
        } else if !box_char && in_run {
            _ = out.write_str("\x1b[0m");
            in_run = false;
        }

        out.push(ch);
    }

    if in_run {
        _ = out.write_str("\x1b[0m");
    }

    out
}

/// Returns the visible (non-ANSI) width of a string.
fn visible_width(s: &str) -> usize {
    let mut width = 0usize;
    let mut in_escape = false;

    for ch in s.chars() {
        if in_escape {
            if ch.is_ascii_alphabetic() {
                in_escape = false;
            }
        } else if ch == '\x1b' {
            in_escape = true;
        } else {
            width += 1;
        }
    }

    width
}

/// Writes a summary line with a right-aligned label and a fixed-width value column.
fn write_summary_line(
    out: &mut impl io::Write,
    label: &str,
    value: &str,
    label_col_width: usize,
    value_col_width: usize,
) -> Result<(), ReceiptError> {
    let label_vis = visible_width(label);
    let value_vis = visible_width(value);

    // 2 chars of spacing between label and value column.
    let label_pad = label_col_width.saturating_sub(label_vis);
    let value_pad = value_col_width.saturating_sub(value_vis);

    writeln!(
        out,
        "{:>label_pad$}{label}  {value_pad}{value}",
        "",
        value_pad = " ".repeat(value_pad)
    )
    .map_err(|_err| ReceiptError::IO)
}

#[cfg(test)]
mod tests {
    use decimal_percentage::Percentage;
    use rusty_money::iso::USD;
    use testresult::TestResult;

    use crate::{
        discounts::{Discount, DiscountCode},
        products::Product,
    };

    use super::*;

    fn ledger() -> TestResult<CartLedger> {
        let mut ledger = CartLedger::new(USD);

        ledger.add_item(Product::new(
            "ai101",
            "Intro to AI",
            Money::from_minor(9999, USD),
        ))?;
        ledger.add_item(Product::new(
            "ai101",
            "Intro to AI",
            Money::from_minor(9999, USD),
        ))?;
        ledger.add_item(Product::new(
            "prog202",
            "Advanced JavaScript",
            Money::from_minor(12999, USD),
        ))?;

        Ok(ledger)
    }

    fn rendered(receipt: &Receipt) -> TestResult<String> {
        let mut out: Vec<u8> = Vec::new();

        receipt.write_to(&mut out)?;

        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn receipt_totals_match_the_ledger() -> TestResult {
        let receipt = Receipt::from_ledger(&ledger()?)?;

        assert_eq!(receipt.subtotal(), Money::from_minor(32997, USD));
        assert_eq!(receipt.total(), Money::from_minor(32997, USD));
        assert_eq!(receipt.item_count(), 3);

        Ok(())
    }

    #[test]
    fn checkout_confirmation_echoes_total_and_item_count() -> TestResult {
        let receipt = Receipt::from_ledger(&ledger()?)?;

        assert_eq!(
            receipt.checkout_confirmation(),
            "Checkout initiated! Total: $329.97 for 3 items. Thank you for your purchase!"
        );

        Ok(())
    }

    #[test]
    fn receipt_lists_items_with_quantities_and_line_totals() -> TestResult {
        let receipt = Receipt::from_ledger(&ledger()?)?;
        let out = rendered(&receipt)?;

        assert!(out.contains("Intro to AI"));
        assert!(out.contains("Advanced JavaScript"));
        assert!(out.contains("$99.99"));
        assert!(out.contains("$199.98"), "line total for quantity 2: {out}");
        assert!(out.contains("Subtotal:"));
        assert!(out.contains("Total:"));

        Ok(())
    }

    #[test]
    fn receipt_shows_the_discount_line_when_applied() -> TestResult {
        let mut ledger = ledger()?;

        ledger.accept_discount(
            Discount::new(DiscountCode::new("SUMMER20")?, Percentage::from(0.2))
                .with_description("20% off"),
        );

        let receipt = Receipt::from_ledger(&ledger)?;
        let out = rendered(&receipt)?;

        assert!(out.contains("Discount (SUMMER20 -20%):"), "got: {out}");
        assert!(out.contains("-$65.99"), "rounded discount amount: {out}");
        assert!(out.contains("$263.98"), "discounted total: {out}");

        Ok(())
    }

    #[test]
    fn receipt_without_discount_has_no_discount_line() -> TestResult {
        let receipt = Receipt::from_ledger(&ledger()?)?;
        let out = rendered(&receipt)?;

        assert!(!out.contains("Discount ("));

        Ok(())
    }

    #[test]
    fn empty_cart_renders_the_empty_message() -> TestResult {
        let receipt = Receipt::from_ledger(&CartLedger::new(USD))?;
        let out = rendered(&receipt)?;

        assert!(out.contains("Your cart is empty."));
        assert!(!out.contains("Subtotal:"));

        Ok(())
    }
}
