//! Free-text price parsing for dot-grouped whole-unit prices.
//!
//! Prices are printed as `15.999 RSD` or `1.000.000 din.`: the dot is always
//! a thousands separator and never a decimal point.

use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

use katalog_core::DEFAULT_HOME_CURRENCY;

/// Currency markers recognised in price text, mapped to their ISO code.
const CURRENCY_TOKENS: &[(&str, &str)] = &[
    ("RSD", "RSD"),
    ("DIN", "RSD"),
    ("ДИН", "RSD"),
    ("EUR", "EUR"),
    ("€", "EUR"),
];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PriceParseError {
    #[error("no number found in price text {input:?}")]
    NoNumberFound { input: String },

    #[error("price amount out of range in {input:?}")]
    OutOfRange { input: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPrice {
    pub amount: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone)]
pub struct PriceParser {
    home_currency: String,
}

impl Default for PriceParser {
    fn default() -> Self {
        Self::new(DEFAULT_HOME_CURRENCY)
    }
}

impl PriceParser {
    #[must_use]
    pub fn new(home_currency: &str) -> Self {
        Self {
            home_currency: home_currency.trim().to_uppercase(),
        }
    }

    #[must_use]
    pub fn home_currency(&self) -> &str {
        &self.home_currency
    }

    /// Parses `raw` into an amount and a currency code.
    ///
    /// When a currency marker is present, the nearest dot-grouped number
    /// before it wins (`"Cena: 15.999 RSD"` gives 15999). Otherwise every
    /// digit in the text is kept and read as a whole number. A decimal comma
    /// ends the amount: `"1.234,56 RSD"` gives 1234.
    ///
    /// # Errors
    ///
    /// Returns [`PriceParseError::NoNumberFound`] when the text holds no
    /// digits, and [`PriceParseError::OutOfRange`] when the digits do not
    /// fit a decimal.
    pub fn parse(&self, raw: &str) -> Result<ParsedPrice, PriceParseError> {
        let upper = raw.trim().to_uppercase();
        let marker = find_currency_marker(&upper);
        let currency = marker.map_or_else(
            || self.home_currency.clone(),
            |(_, code)| code.to_string(),
        );

        if let Some((start, _)) = marker {
            if let Some(amount) = anchored_amount(&upper[..start]) {
                return Ok(ParsedPrice { amount, currency });
            }
        }

        let mut stripped = upper;
        for (token, _) in CURRENCY_TOKENS {
            stripped = stripped.replace(token, "");
        }
        let digits: String = stripped.chars().filter(char::is_ascii_digit).collect();
        if digits.is_empty() {
            return Err(PriceParseError::NoNumberFound {
                input: raw.to_string(),
            });
        }

        let amount = Decimal::from_str(&digits).map_err(|_| PriceParseError::OutOfRange {
            input: raw.to_string(),
        })?;
        Ok(ParsedPrice { amount, currency })
    }
}

/// Parses with the default home currency.
///
/// # Errors
///
/// See [`PriceParser::parse`].
pub fn parse_price(raw: &str) -> Result<ParsedPrice, PriceParseError> {
    PriceParser::default().parse(raw)
}

/// Earliest currency marker in `upper` as `(byte_offset, iso_code)`.
fn find_currency_marker(upper: &str) -> Option<(usize, &'static str)> {
    CURRENCY_TOKENS
        .iter()
        .filter_map(|(token, code)| upper.find(token).map(|i| (i, *code)))
        .min_by_key(|(start, _)| *start)
}

/// Scans whitespace-separated tokens backward from the currency marker for
/// one with both digits and a thousands dot.
fn anchored_amount(before_marker: &str) -> Option<Decimal> {
    before_marker
        .split_whitespace()
        .rev()
        .filter(|part| part.contains('.') && part.chars().any(|c| c.is_ascii_digit()))
        .find_map(|part| {
            let integer_part = part.split(',').next().unwrap_or(part);
            let digits: String = integer_part.chars().filter(char::is_ascii_digit).collect();
            Decimal::from_str(&digits)
                .ok()
                .filter(|amount| *amount > Decimal::ZERO)
        })
}

#[cfg(test)]
#[path = "price_test.rs"]
mod tests;
