//! Decides whether a capture is an offer the catalog already holds.

use katalog_core::{CatalogReader, RawCapture};
use uuid::Uuid;

use crate::error::MatchingError;
use crate::score::SimilarityScorer;

/// Candidates fetched from the catalog per capture.
pub const DEFAULT_CANDIDATE_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchThresholds {
    /// At or above: exact match.
    pub exact: f64,
    /// At or above, below `exact`: probable match.
    pub probable: f64,
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            exact: 0.95,
            probable: 0.70,
        }
    }
}

impl MatchThresholds {
    /// # Errors
    ///
    /// Returns [`MatchingError::InvalidThresholds`] unless
    /// `0 <= probable <= exact <= 1`.
    pub fn new(exact: f64, probable: f64) -> Result<Self, MatchingError> {
        if !(0.0..=1.0).contains(&exact) || !(0.0..=1.0).contains(&probable) || probable > exact {
            return Err(MatchingError::InvalidThresholds { exact, probable });
        }
        Ok(Self { exact, probable })
    }

    /// Maps the best candidate and its score to a decision.
    #[must_use]
    pub fn decide(&self, best: Option<(Uuid, f64)>) -> MatchDecision {
        match best {
            Some((entity_id, similarity)) if similarity >= self.exact => MatchDecision::Exact {
                entity_id,
                similarity,
            },
            Some((entity_id, similarity)) if similarity >= self.probable => {
                MatchDecision::Probable {
                    entity_id,
                    similarity,
                }
            }
            Some((_, similarity)) => MatchDecision::NewEntity {
                best_similarity: Some(similarity),
            },
            None => MatchDecision::NewEntity {
                best_similarity: None,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MatchDecision {
    /// Reuse `entity_id`; normalization agrees on the offer.
    Exact { entity_id: Uuid, similarity: f64 },
    /// Reuse `entity_id` with less certainty.
    Probable { entity_id: Uuid, similarity: f64 },
    /// Nothing close enough; create a new entity.
    NewEntity { best_similarity: Option<f64> },
}

impl MatchDecision {
    /// The entity to reuse, if any.
    #[must_use]
    pub fn entity_id(&self) -> Option<Uuid> {
        match self {
            MatchDecision::Exact { entity_id, .. } | MatchDecision::Probable { entity_id, .. } => {
                Some(*entity_id)
            }
            MatchDecision::NewEntity { .. } => None,
        }
    }

    #[must_use]
    pub fn similarity(&self) -> Option<f64> {
        match self {
            MatchDecision::Exact { similarity, .. }
            | MatchDecision::Probable { similarity, .. } => Some(*similarity),
            MatchDecision::NewEntity { best_similarity } => *best_similarity,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            MatchDecision::Exact { .. } => "exact",
            MatchDecision::Probable { .. } => "probable",
            MatchDecision::NewEntity { .. } => "new",
        }
    }
}

pub struct EntityResolver<C> {
    catalog: C,
    scorer: SimilarityScorer,
    thresholds: MatchThresholds,
    candidate_limit: usize,
}

impl<C: CatalogReader> EntityResolver<C> {
    #[must_use]
    pub fn new(catalog: C, scorer: SimilarityScorer, thresholds: MatchThresholds) -> Self {
        Self {
            catalog,
            scorer,
            thresholds,
            candidate_limit: DEFAULT_CANDIDATE_LIMIT,
        }
    }

    #[must_use]
    pub fn with_candidate_limit(mut self, limit: usize) -> Self {
        self.candidate_limit = limit.max(1);
        self
    }

    #[must_use]
    pub fn scorer(&self) -> &SimilarityScorer {
        &self.scorer
    }

    #[must_use]
    pub fn thresholds(&self) -> MatchThresholds {
        self.thresholds
    }

    /// Scores the catalog's shortlist for `capture` and keeps the best.
    /// Ties keep the candidate the catalog returned first.
    ///
    /// # Errors
    ///
    /// Returns [`MatchingError::EmptyName`] for a blank capture name and
    /// [`MatchingError::CandidateLookup`] when the catalog query fails. "No
    /// match" is not an error: it is [`MatchDecision::NewEntity`].
    pub async fn resolve(&self, capture: &RawCapture) -> Result<MatchDecision, MatchingError> {
        if capture.name.trim().is_empty() {
            return Err(MatchingError::EmptyName);
        }
        let normalized_name = self.scorer.names().normalize(&capture.name, capture.offer_type);
        let normalized_brand = self.scorer.brands().normalize_opt(capture.brand.as_deref());

        let candidates = self
            .catalog
            .find_candidate_entities(
                &normalized_name,
                normalized_brand.as_deref(),
                capture.offer_type,
                self.candidate_limit,
            )
            .await
            .map_err(MatchingError::CandidateLookup)?;

        let mut best: Option<(Uuid, f64)> = None;
        for candidate in &candidates {
            let similarity = self.scorer.score(capture, candidate);
            if best.is_none_or(|(_, top)| similarity > top) {
                best = Some((candidate.id, similarity));
            }
        }

        let decision = self.thresholds.decide(best);
        tracing::debug!(
            shop_id = %capture.shop_id,
            external_id = %capture.external_id,
            normalized_name = %normalized_name,
            candidates = candidates.len(),
            decision = decision.as_str(),
            similarity = ?decision.similarity(),
            "resolved capture"
        );
        Ok(decision)
    }
}

#[cfg(test)]
#[path = "resolve_test.rs"]
mod tests;
