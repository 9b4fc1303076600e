//! schema.org `Product` offers embedded as JSON-LD.

use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde_json::Value;

static SCRIPT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<script[^>]+type\s*=\s*["']application/ld\+json["'][^>]*>(.*?)</script>"#)
        .expect("valid regex")
});

use super::PRICE_CEILING;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct JsonLdOffer {
    pub price: Decimal,
    pub currency: Option<String>,
    pub in_stock: Option<bool>,
}

/// Finds the first `Product` offer with a plausible price in any JSON-LD
/// block of `html`.
///
/// Blocks that are not valid JSON get a tolerant scan for an `"offers"` key
/// followed by a `"price"` token.
pub(crate) fn product_offer(html: &str) -> Option<JsonLdOffer> {
    SCRIPT_RE
        .captures_iter(html)
        .filter_map(|cap| cap.get(1))
        .find_map(|block| {
            let text = block.as_str().trim();
            match serde_json::from_str::<Value>(text) {
                Ok(value) => offer_from_value(&value),
                Err(e) => {
                    tracing::debug!(error = %e, "malformed JSON-LD block, scanning for offer price");
                    scan_offer_price(text).map(|price| JsonLdOffer {
                        price,
                        currency: None,
                        in_stock: None,
                    })
                }
            }
        })
}

fn offer_from_value(value: &Value) -> Option<JsonLdOffer> {
    // Accept top-level object, array, or @graph container.
    let mut candidates: Vec<&Value> = match value.as_array() {
        Some(items) => items.iter().collect(),
        None => vec![value],
    };
    let graph_items: Vec<&Value> = candidates
        .iter()
        .filter_map(|item| item.get("@graph").and_then(Value::as_array))
        .flatten()
        .collect();
    candidates.extend(graph_items);

    candidates
        .into_iter()
        .filter(|item| is_product(item))
        .find_map(|item| {
            let offers = item.get("offers")?;
            let offer = offers.as_array().map_or(Some(offers), |list| list.first())?;
            let price = offer
                .get("price")
                .or_else(|| offer.get("lowPrice"))
                .and_then(price_from_value)
                .filter(|p| plausible(*p))?;
            let currency = offer
                .get("priceCurrency")
                .and_then(Value::as_str)
                .map(|c| c.trim().to_uppercase())
                .filter(|c| !c.is_empty());
            let in_stock = offer
                .get("availability")
                .and_then(Value::as_str)
                .and_then(availability_in_stock);
            Some(JsonLdOffer {
                price,
                currency,
                in_stock,
            })
        })
}

/// `@type` may be a plain string or an array of strings.
fn is_product(item: &Value) -> bool {
    match item.get("@type") {
        Some(Value::String(s)) => s.eq_ignore_ascii_case("Product"),
        Some(Value::Array(types)) => types
            .iter()
            .filter_map(Value::as_str)
            .any(|s| s.eq_ignore_ascii_case("Product")),
        _ => false,
    }
}

/// Offer prices may be JSON numbers or strings; both use a decimal point.
fn price_from_value(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn availability_in_stock(availability: &str) -> Option<bool> {
    if availability.contains("OutOfStock") || availability.contains("SoldOut") {
        Some(false)
    } else if availability.contains("InStock") || availability.contains("LimitedAvailability") {
        Some(true)
    } else {
        None
    }
}

fn plausible(price: Decimal) -> bool {
    price > Decimal::ZERO && price < Decimal::from(PRICE_CEILING)
}

/// Tolerant scan over malformed JSON: the first `"price"` after `"offers"`,
/// read up to the next delimiter.
fn scan_offer_price(text: &str) -> Option<Decimal> {
    let offers_at = text.find("\"offers\"")?;
    let after_offers = &text[offers_at..];
    let price_at = after_offers.find("\"price\"")?;
    let after_key = &after_offers[price_at + "\"price\"".len()..];
    let value = after_key
        .trim_start()
        .strip_prefix(':')?
        .trim_start()
        .trim_start_matches('"');
    let end = value
        .find([',', '}', '\n', '\r', '\t', ' ', '"'])
        .unwrap_or(value.len());
    Decimal::from_str(&value[..end])
        .ok()
        .filter(|p| plausible(*p))
}
