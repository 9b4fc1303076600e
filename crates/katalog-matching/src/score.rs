//! Similarity between a capture and a catalog candidate.

use std::collections::HashMap;
use std::sync::Arc;

use katalog_core::{CanonicalEntity, OfferType, RawCapture};

use crate::normalize::{is_numeric, BrandNormalizer, NameNormalizer};
use crate::rules::NormalizationRules;

const EQUAL_NAMES: f64 = 0.95;
const EQUAL_NAMES_AND_BRAND: f64 = 1.0;
const CONTAINED: f64 = 0.65;
const CONTAINED_NUMERIC_VARIANT: f64 = 0.7;
const OVERLAP_RATIO_WEIGHT: f64 = 0.8;
const OVERLAP_TOKEN_BONUS: f64 = 0.15;
const OVERLAP_BONUS_TOKENS: usize = 3;
const OVERLAP_CEILING_TOKENS: usize = 4;
const OVERLAP_CEILING: f64 = 0.85;
const BRAND_BONUS: f64 = 0.2;

/// Scores in `[0, 1]`. The score is not symmetric: the capture side is
/// the "request" and the candidate the "product" throughout.
#[derive(Debug, Clone, Default)]
pub struct SimilarityScorer {
    names: NameNormalizer,
    brands: BrandNormalizer,
}

impl SimilarityScorer {
    #[must_use]
    pub fn new(rules: Arc<NormalizationRules>) -> Self {
        Self {
            names: NameNormalizer::new(Arc::clone(&rules)),
            brands: BrandNormalizer::new(rules),
        }
    }

    #[must_use]
    pub fn names(&self) -> &NameNormalizer {
        &self.names
    }

    #[must_use]
    pub fn brands(&self) -> &BrandNormalizer {
        &self.brands
    }

    /// Scores a capture against a candidate using the capture's offer type.
    #[must_use]
    pub fn score(&self, capture: &RawCapture, candidate: &CanonicalEntity) -> f64 {
        self.score_names(
            &capture.name,
            capture.brand.as_deref(),
            &candidate.name,
            candidate.brand.as_deref(),
            capture.offer_type,
        )
    }

    #[must_use]
    pub fn score_names(
        &self,
        request_name: &str,
        request_brand: Option<&str>,
        product_name: &str,
        product_brand: Option<&str>,
        offer_type: OfferType,
    ) -> f64 {
        let request = self.names.normalize(request_name, offer_type);
        let product = self.names.normalize(product_name, offer_type);
        let brands_match = offer_type == OfferType::Good
            && match (
                self.brands.normalize_opt(request_brand),
                self.brands.normalize_opt(product_brand),
            ) {
                (Some(a), Some(b)) => a == b,
                _ => false,
            };

        if request == product {
            return if brands_match {
                EQUAL_NAMES_AND_BRAND
            } else {
                EQUAL_NAMES
            };
        }
        // An empty name is not a substring of anything here; only two
        // empty names match, and that case returned above.
        if request.is_empty() || product.is_empty() {
            return 0.0;
        }

        let request_words: Vec<&str> = request.split(' ').collect();
        let product_words: Vec<&str> = product.split(' ').collect();

        let (base, brand_bonus_applies) =
            if request.contains(product.as_str()) || product.contains(request.as_str()) {
                let (longer, shorter) = if product_words.len() > request_words.len() {
                    (&product_words, &request_words)
                } else {
                    (&request_words, &product_words)
                };
                let extra = extra_words(longer, shorter);
                if !extra.is_empty() && extra.iter().all(|w| is_numeric(w)) {
                    (CONTAINED_NUMERIC_VARIANT, false)
                } else {
                    (CONTAINED, true)
                }
            } else {
                let fuzzy = offer_type == OfferType::Service;
                let common = common_words(&request_words, &product_words, fuzzy);
                if common == 0 {
                    return 0.0;
                }
                (overlap_score(common, request_words.len(), product_words.len()), true)
            };

        let bonus = if brand_bonus_applies && brands_match {
            BRAND_BONUS
        } else {
            0.0
        };
        (base + bonus).clamp(0.0, 1.0)
    }
}

/// Words of `longer` left over after removing one occurrence of each word
/// in `shorter`.
fn extra_words<'a>(longer: &[&'a str], shorter: &[&str]) -> Vec<&'a str> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in shorter {
        *counts.entry(*word).or_default() += 1;
    }
    longer
        .iter()
        .filter(|word| match counts.get_mut(*word) {
            Some(n) if *n > 0 => {
                *n -= 1;
                false
            }
            _ => true,
        })
        .copied()
        .collect()
}

/// Request words longer than two characters that have a match among the
/// product words. Services also accept containment between words of four or
/// more characters.
fn common_words(request: &[&str], product: &[&str], fuzzy: bool) -> usize {
    request
        .iter()
        .filter(|word| word.chars().count() > 2)
        .filter(|word| {
            product.iter().any(|candidate| {
                word == &candidate
                    || (fuzzy
                        && word.chars().count() >= 4
                        && candidate.chars().count() >= 4
                        && (word.contains(candidate) || candidate.contains(*word)))
            })
        })
        .count()
}

#[allow(clippy::cast_precision_loss)]
fn overlap_score(common: usize, request_len: usize, product_len: usize) -> f64 {
    if common >= OVERLAP_CEILING_TOKENS {
        return OVERLAP_CEILING;
    }
    let union = (request_len + product_len).saturating_sub(common).max(1);
    let ratio = common as f64 / union as f64;
    ratio * OVERLAP_RATIO_WEIGHT + common.min(OVERLAP_BONUS_TOKENS) as f64 * OVERLAP_TOKEN_BONUS
}
