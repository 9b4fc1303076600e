//! Field extraction from rendered product pages.
//!
//! Both fetch backends hand a [`PageContent`] to the same [`FieldExtractor`],
//! so static and browser-rendered pages yield identical capture shapes.

mod chain;
mod jsonld;

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use scraper::Html;

use katalog_core::{RawCapture, ShopConfig};

use crate::error::ExtractionError;
use crate::price::PriceParser;
use crate::url::{external_id_from_url, resolve_image_url};

/// Prices at or above this are treated as mis-parses, whichever strategy
/// produced them.
pub(crate) const PRICE_CEILING: u32 = 10_000_000;

/// A fetched page: final URL, its HTML, and when it was fetched.
#[derive(Debug, Clone)]
pub struct PageContent {
    pub url: String,
    pub html: String,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct FieldExtractor {
    price_parser: PriceParser,
}

impl FieldExtractor {
    #[must_use]
    pub fn new(price_parser: PriceParser) -> Self {
        Self { price_parser }
    }

    /// Extracts a capture from `page` using the shop's selector chains.
    ///
    /// Price comes from a JSON-LD `Product` offer when one is present,
    /// otherwise from the `price` chain. The name falls back to the page
    /// title. Images are collected across the whole `image` chain.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Incomplete`] when the name or a positive
    /// price is still missing after every strategy.
    pub fn extract(
        &self,
        page: &PageContent,
        shop: &ShopConfig,
    ) -> Result<RawCapture, ExtractionError> {
        let document = Html::parse_document(&page.html);

        let name = chain::first_value(&document, shop.selector_chain("name"))
            .or_else(|| chain::title_text(&document, &shop.title_suffixes));

        let offer = jsonld::product_offer(&page.html);
        let (price, currency) = match &offer {
            Some(offer) => (
                Some(offer.price),
                offer
                    .currency
                    .clone()
                    .unwrap_or_else(|| self.price_parser.home_currency().to_string()),
            ),
            None => self.selector_price(&document, shop, &page.url),
        };

        let (name, price) = match (name, price) {
            (Some(name), Some(price)) if price > Decimal::ZERO => (name, price),
            (name, price) => {
                let reason = match (&name, price) {
                    (None, _) => "name not found",
                    (Some(_), None) => "price not found",
                    (Some(_), Some(_)) => "price is not positive",
                };
                return Err(ExtractionError::Incomplete {
                    reason: reason.to_string(),
                    partial_name: name,
                    partial_price: price,
                });
            }
        };

        let capture = RawCapture {
            shop_id: shop.id.clone(),
            shop_name: shop.name.clone(),
            external_id: external_id_from_url(&page.url),
            url: page.url.clone(),
            name,
            description: chain::first_value(&document, shop.selector_chain("description")),
            brand: chain::first_value(&document, shop.selector_chain("brand")),
            category: chain::first_value(&document, shop.selector_chain("category")),
            price,
            currency,
            image_urls: collect_images(&document, shop, &page.url),
            specs: chain::spec_rows(&document, shop.selector_chain("specs"))
                .into_iter()
                .collect::<BTreeMap<_, _>>(),
            in_stock: offer.and_then(|o| o.in_stock).unwrap_or(true),
            offer_type: shop.offer_type,
            captured_at: page.fetched_at,
        };

        capture
            .validate()
            .map_err(|rejection| ExtractionError::Incomplete {
                reason: rejection.to_string(),
                partial_name: Some(capture.name.clone()),
                partial_price: Some(capture.price),
            })?;
        Ok(capture)
    }

    fn selector_price(
        &self,
        document: &Html,
        shop: &ShopConfig,
        page_url: &str,
    ) -> (Option<Decimal>, String) {
        let home = self.price_parser.home_currency().to_string();
        let Some(text) = chain::first_value(document, shop.selector_chain("price")) else {
            return (None, home);
        };
        match self.price_parser.parse(&text) {
            Ok(parsed) if parsed.amount >= Decimal::from(PRICE_CEILING) => {
                tracing::debug!(
                    url = page_url,
                    shop_id = %shop.id,
                    amount = %parsed.amount,
                    "price text parsed above the plausible ceiling"
                );
                (None, home)
            }
            Ok(parsed) => (Some(parsed.amount), parsed.currency),
            Err(e) => {
                tracing::debug!(url = page_url, shop_id = %shop.id, error = %e, "price text did not parse");
                (None, home)
            }
        }
    }
}

/// Absolute, de-duplicated image URLs in first-seen order.
fn collect_images(document: &Html, shop: &ShopConfig, page_url: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    chain::image_refs(document, shop.selector_chain("image"))
        .into_iter()
        .filter_map(|reference| resolve_image_url(page_url, &reference))
        .filter(|url| seen.insert(url.clone()))
        .collect()
}

#[cfg(test)]
#[path = "extract_test.rs"]
mod tests;
