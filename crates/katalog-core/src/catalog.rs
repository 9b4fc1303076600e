//! Canonical catalog types: offers, per-shop prices, price history points,
//! and the match audit record.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Whether an offer is a physical good or a service. Goods and services are
/// never resolved against each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferType {
    #[default]
    Good,
    Service,
}

impl OfferType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            OfferType::Good => "good",
            OfferType::Service => "service",
        }
    }

    /// Parses the persisted tag. Unknown tags fall back to [`OfferType::Good`].
    #[must_use]
    pub fn from_tag(tag: &str) -> Self {
        if tag.eq_ignore_ascii_case("service") {
            OfferType::Service
        } else {
            OfferType::Good
        }
    }
}

impl std::fmt::Display for OfferType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A deduplicated product or service shared by every shop that sells it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalEntity {
    pub id: Uuid,
    pub name: String,
    /// Output of the name normalizer at creation time.
    pub normalized_name: String,
    pub brand: Option<String>,
    pub normalized_brand: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub specs: BTreeMap<String, String>,
    pub offer_type: OfferType,
}

impl CanonicalEntity {
    /// Stable identity used to collapse concurrent creations of the same offer.
    ///
    /// Two entities with the same normalized name, normalized brand, and
    /// offer type are the same real-world offer.
    #[must_use]
    pub fn identity_key(&self) -> String {
        format!(
            "{}|{}|{}",
            self.normalized_name,
            self.normalized_brand.as_deref().unwrap_or_default(),
            self.offer_type
        )
    }
}

/// Current price and stock of one entity at one shop. Unique per
/// `(product_id, shop_id)`; later writes overwrite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRecord {
    pub product_id: Uuid,
    pub shop_id: String,
    pub shop_name: String,
    pub price: Decimal,
    pub currency: String,
    pub url: String,
    pub in_stock: bool,
    pub updated_at: DateTime<Utc>,
}

impl PriceRecord {
    /// The history point mirrored to the price-history feed for this write.
    #[must_use]
    pub fn to_price_point(&self) -> PricePoint {
        PricePoint {
            product_id: self.product_id,
            shop_id: self.shop_id.clone(),
            price: self.price,
            currency: self.currency.clone(),
            recorded_at: self.updated_at,
        }
    }
}

/// Append-only observation of a price, consumed by price-history reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub product_id: Uuid,
    pub shop_id: String,
    pub price: Decimal,
    pub currency: String,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchConfidence {
    High,
    Medium,
    Low,
}

impl MatchConfidence {
    /// `high` at 0.95 and above, `medium` at 0.70 and above, `low` otherwise.
    #[must_use]
    pub fn from_similarity(similarity: f64) -> Self {
        if similarity >= 0.95 {
            MatchConfidence::High
        } else if similarity >= 0.70 {
            MatchConfidence::Medium
        } else {
            MatchConfidence::Low
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            MatchConfidence::High => "high",
            MatchConfidence::Medium => "medium",
            MatchConfidence::Low => "low",
        }
    }
}

impl std::fmt::Display for MatchConfidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Audit trail entry for a resolved capture.
///
/// `product_id` is the capture key (`shop_id:external_id`); `matched_id` is
/// the catalog entity it was attached to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub product_id: String,
    pub matched_id: Uuid,
    pub similarity: f64,
    pub confidence: MatchConfidence,
    pub matched_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(name: &str, brand: Option<&str>, offer_type: OfferType) -> CanonicalEntity {
        CanonicalEntity {
            id: Uuid::new_v4(),
            name: name.to_string(),
            normalized_name: name.to_lowercase(),
            brand: brand.map(str::to_string),
            normalized_brand: brand.map(str::to_lowercase),
            category: None,
            description: None,
            image_url: None,
            specs: BTreeMap::new(),
            offer_type,
        }
    }

    #[test]
    fn identity_key_ignores_entity_id() {
        let a = entity("iphone 15", Some("Apple"), OfferType::Good);
        let b = entity("iphone 15", Some("Apple"), OfferType::Good);
        assert_ne!(a.id, b.id);
        assert_eq!(a.identity_key(), b.identity_key());
        assert_eq!(a.identity_key(), "iphone 15|apple|good");
    }

    #[test]
    fn identity_key_separates_goods_and_services() {
        let good = entity("servis klime", None, OfferType::Good);
        let service = entity("servis klime", None, OfferType::Service);
        assert_ne!(good.identity_key(), service.identity_key());
    }

    #[test]
    fn confidence_bands() {
        assert_eq!(MatchConfidence::from_similarity(1.0), MatchConfidence::High);
        assert_eq!(MatchConfidence::from_similarity(0.95), MatchConfidence::High);
        assert_eq!(MatchConfidence::from_similarity(0.72), MatchConfidence::Medium);
        assert_eq!(MatchConfidence::from_similarity(0.3), MatchConfidence::Low);
    }

    #[test]
    fn offer_type_tags() {
        assert_eq!(OfferType::from_tag("service"), OfferType::Service);
        assert_eq!(OfferType::from_tag("SERVICE"), OfferType::Service);
        assert_eq!(OfferType::from_tag("good"), OfferType::Good);
        assert_eq!(OfferType::from_tag("anything"), OfferType::Good);
        assert_eq!(
            serde_json::to_string(&OfferType::Service).unwrap(),
            "\"service\""
        );
    }
}
