//! Discount Fixtures

use decimal_percentage::Percentage;
use serde::Deserialize;

use crate::{
    discounts::{Discount, DiscountCode},
    fixtures::FixtureError,
};

/// Wrapper for discounts in YAML
#[derive(Debug, Deserialize)]
pub struct DiscountsFixture {
    /// Discounts in file order
    pub discounts: Vec<DiscountFixture>,
}

/// Discount Fixture
#[derive(Debug, Deserialize)]
pub struct DiscountFixture {
    /// Promotion code (e.g., "SUMMER20")
    pub code: String,

    /// Discount rate (e.g., "20%" or "0.20")
    pub rate: String,

    /// Promotion description
    #[serde(default)]
    pub description: Option<String>,
}

impl TryFrom<DiscountFixture> for Discount {
    type Error = FixtureError;

    fn try_from(fixture: DiscountFixture) -> Result<Self, Self::Error> {
        let code = DiscountCode::new(&fixture.code)?;
        let rate = parse_percentage(&fixture.rate)?;

        let mut discount = Discount::new(code, rate);

        if let Some(description) = fixture.description {
            discount = discount.with_description(description);
        }

        Ok(discount)
    }
}

/// Parse percentage string (e.g., "15%" or "0.15") into a `Percentage`
///
/// Accepts two formats:
/// - Percentage format: "15%" for 15%
/// - Decimal format: "0.15" for 15%
///
/// # Errors
///
/// Returns an error if the string cannot be parsed or if the value is invalid.
pub fn parse_percentage(s: &str) -> Result<Percentage, FixtureError> {
    let trimmed = s.trim();

    if let Some(percent_str) = trimmed.strip_suffix('%') {
        // "15%" -> 0.15
        let value = percent_str
            .trim()
            .parse::<f64>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value / 100.0))
    } else {
        // "0.15" -> 0.15
        let value = trimmed
            .parse::<f64>()
            .map_err(|_err| FixtureError::InvalidPercentage(s.to_string()))?;

        Ok(Percentage::from(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_percentage_accepts_percentage_format() -> Result<(), FixtureError> {
        let percent = parse_percentage("15%")?;

        assert_eq!(percent, Percentage::from(0.15));

        Ok(())
    }

    #[test]
    fn parse_percentage_accepts_decimal_format() -> Result<(), FixtureError> {
        let percent = parse_percentage("0.15")?;

        assert_eq!(percent, Percentage::from(0.15));

        Ok(())
    }

    #[test]
    fn parse_percentage_rejects_invalid_format() {
        let result = parse_percentage("invalid");

        assert!(matches!(result, Err(FixtureError::InvalidPercentage(_))));
    }

    #[test]
    fn parse_percentage_handles_whitespace() -> Result<(), FixtureError> {
        let percent = parse_percentage("  15%  ")?;

        assert_eq!(percent, Percentage::from(0.15));

        Ok(())
    }

    #[test]
    fn discount_fixture_converts_and_canonicalizes_the_code() -> Result<(), FixtureError> {
        let fixture = DiscountFixture {
            code: String::from("summer20"),
            rate: String::from("20%"),
            description: Some(String::from("20% off Summer Sale")),
        };

        let discount = Discount::try_from(fixture)?;

        assert_eq!(discount.code().as_str(), "SUMMER20");
        assert_eq!(discount.rate(), Percentage::from(0.2));
        assert_eq!(discount.description(), Some("20% off Summer Sale"));

        Ok(())
    }

    #[test]
    fn discount_fixture_rejects_blank_codes() {
        let fixture = DiscountFixture {
            code: String::from("   "),
            rate: String::from("10%"),
            description: None,
        };

        let result = Discount::try_from(fixture);

        assert!(matches!(result, Err(FixtureError::DiscountCode(_))));
    }
}
