use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::OfferType;

/// One scraped snapshot of one shop page.
///
/// `(shop_id, external_id)` is unique in the raw store. A newer capture for
/// the same key overwrites this one and re-queues it for resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCapture {
    pub shop_id: String,
    pub shop_name: String,
    pub external_id: String,
    pub url: String,
    pub name: String,
    pub description: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub price: Decimal,
    pub currency: String,
    pub image_urls: Vec<String>,
    pub specs: BTreeMap<String, String>,
    pub in_stock: bool,
    pub offer_type: OfferType,
    pub captured_at: DateTime<Utc>,
}

/// Why a capture may not enter persistence.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CaptureRejection {
    #[error("capture has an empty name")]
    EmptyName,
    #[error("capture has non-positive price {0}")]
    NonPositivePrice(Decimal),
}

impl RawCapture {
    /// Store key used in logs and the match audit trail.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{}:{}", self.shop_id, self.external_id)
    }

    /// # Errors
    ///
    /// Returns [`CaptureRejection`] when the name is blank or the price is
    /// zero or negative.
    pub fn validate(&self) -> Result<(), CaptureRejection> {
        if self.name.trim().is_empty() {
            return Err(CaptureRejection::EmptyName);
        }
        if self.price <= Decimal::ZERO {
            return Err(CaptureRejection::NonPositivePrice(self.price));
        }
        Ok(())
    }

    /// First image URL, used as the primary image of a new entity.
    #[must_use]
    pub fn primary_image(&self) -> Option<&str> {
        self.image_urls
            .iter()
            .map(|u| u.trim())
            .find(|u| !u.is_empty())
    }
}
