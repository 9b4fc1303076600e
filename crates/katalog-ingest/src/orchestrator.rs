//! Turns the backlog of raw captures into catalog writes.
//!
//! One batch is processed sequentially, oldest capture first. A failure on
//! one capture is logged and counted, then the loop moves on; only a failure
//! to load the batch or a cancellation ends it early. A capture is marked
//! processed only after its price record is written.

use std::fmt;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use katalog_core::{
    CanonicalEntity, CatalogReader, CatalogWriter, MatchAuditSink, MatchConfidence,
    PriceHistorySink, PriceRecord, ProductMatch, RawCapture, RawCaptureReader, RawCaptureWriter,
};
use katalog_matching::{EntityResolver, MatchDecision};

use crate::error::{IngestError, ItemError};

/// Used when the requested batch size is zero or negative.
pub const DEFAULT_BATCH_SIZE: usize = 10;
/// Upper bound on captures loaded per batch.
pub const MAX_BATCH_SIZE: usize = 100;

#[must_use]
pub fn clamp_batch_size(requested: i64) -> usize {
    if requested <= 0 {
        return DEFAULT_BATCH_SIZE;
    }
    usize::try_from(requested).map_or(MAX_BATCH_SIZE, |n| n.min(MAX_BATCH_SIZE))
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Captures loaded for this batch.
    pub total: usize,
    /// Captures whose price record was written.
    pub processed: usize,
    /// Captures that hit a persistence failure and stay queued.
    pub failed: usize,
    /// Captures rejected by validation and marked invalid.
    pub invalid: usize,
    pub exact_matches: usize,
    pub probable_matches: usize,
    pub new_entities: usize,
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "processed {}/{}, failed {}, invalid {}",
            self.processed, self.total, self.failed, self.invalid
        )
    }
}

enum ItemOutcome {
    Exact,
    Probable,
    Created,
}

pub struct IngestionOrchestrator<R, C, W, A, H> {
    raw: R,
    resolver: EntityResolver<C>,
    catalog: W,
    audit: A,
    history: H,
}

impl<R, C, W, A, H> IngestionOrchestrator<R, C, W, A, H>
where
    R: RawCaptureReader + RawCaptureWriter,
    C: CatalogReader,
    W: CatalogWriter,
    A: MatchAuditSink,
    H: PriceHistorySink,
{
    #[must_use]
    pub fn new(raw: R, resolver: EntityResolver<C>, catalog: W, audit: A, history: H) -> Self {
        Self {
            raw,
            resolver,
            catalog,
            audit,
            history,
        }
    }

    /// Processes up to `max_size` unprocessed captures (clamped by
    /// [`clamp_batch_size`]).
    ///
    /// `cancel` is checked between captures, so an in-flight capture is
    /// always finished.
    ///
    /// # Errors
    ///
    /// Returns [`IngestError::LoadBatch`] when the backlog cannot be read and
    /// [`IngestError::Cancelled`] when `cancel` fires before the batch ends.
    /// Per-capture failures are only counted in the [`BatchReport`].
    pub async fn run_batch(
        &self,
        max_size: i64,
        cancel: &CancellationToken,
    ) -> Result<BatchReport, IngestError> {
        let limit = clamp_batch_size(max_size);
        let captures = self
            .raw
            .unprocessed_raw_captures(limit)
            .await
            .map_err(|source| IngestError::LoadBatch { source })?;

        let mut report = BatchReport {
            total: captures.len(),
            ..BatchReport::default()
        };
        if captures.is_empty() {
            tracing::debug!("no unprocessed captures");
            return Ok(report);
        }

        for capture in &captures {
            if cancel.is_cancelled() {
                tracing::info!(
                    processed = report.processed,
                    total = report.total,
                    "batch cancelled"
                );
                return Err(IngestError::Cancelled {
                    processed: report.processed,
                });
            }

            match self.process_item(capture).await {
                Ok(outcome) => {
                    report.processed += 1;
                    match outcome {
                        ItemOutcome::Exact => report.exact_matches += 1,
                        ItemOutcome::Probable => report.probable_matches += 1,
                        ItemOutcome::Created => report.new_entities += 1,
                    }
                }
                Err(ItemError::InvalidCapture(rejection)) => {
                    report.invalid += 1;
                    tracing::warn!(
                        shop_id = %capture.shop_id,
                        external_id = %capture.external_id,
                        name = %capture.name,
                        reason = %rejection,
                        "dropping invalid capture"
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    tracing::warn!(
                        shop_id = %capture.shop_id,
                        external_id = %capture.external_id,
                        name = %capture.name,
                        error = %e,
                        "failed to process capture"
                    );
                }
            }
        }

        if report.failed > 0 || report.invalid > 0 {
            tracing::warn!(
                processed = report.processed,
                total = report.total,
                failed = report.failed,
                invalid = report.invalid,
                "batch finished with failures"
            );
        } else {
            tracing::info!(
                processed = report.processed,
                total = report.total,
                exact = report.exact_matches,
                probable = report.probable_matches,
                created = report.new_entities,
                "batch finished"
            );
        }
        Ok(report)
    }

    async fn process_item(&self, capture: &RawCapture) -> Result<ItemOutcome, ItemError> {
        if let Err(rejection) = capture.validate() {
            match self
                .raw
                .mark_raw_capture_invalid(
                    &capture.shop_id,
                    &capture.external_id,
                    capture.captured_at,
                    &rejection.to_string(),
                )
                .await
            {
                Ok(true) => {}
                Ok(false) => tracing::debug!(
                    shop_id = %capture.shop_id,
                    external_id = %capture.external_id,
                    "capture was replaced while processing; newer snapshot left queued"
                ),
                Err(e) => tracing::warn!(
                    shop_id = %capture.shop_id,
                    external_id = %capture.external_id,
                    error = %e,
                    "failed to mark capture invalid"
                ),
            }
            return Err(ItemError::InvalidCapture(rejection));
        }

        let capture = trimmed(capture);

        let decision = match self.resolver.resolve(&capture).await {
            Ok(decision) => decision,
            Err(e) => {
                let e = ItemError::Resolution(e);
                tracing::warn!(
                    shop_id = %capture.shop_id,
                    external_id = %capture.external_id,
                    error = %e,
                    "resolution failed, creating a new entity"
                );
                MatchDecision::NewEntity {
                    best_similarity: None,
                }
            }
        };

        let (entity_id, outcome) = match decision {
            MatchDecision::Exact {
                entity_id,
                similarity,
            } => {
                tracing::info!(
                    shop_id = %capture.shop_id,
                    external_id = %capture.external_id,
                    %entity_id,
                    similarity,
                    "exact match"
                );
                (entity_id, ItemOutcome::Exact)
            }
            MatchDecision::Probable {
                entity_id,
                similarity,
            } => {
                tracing::debug!(
                    shop_id = %capture.shop_id,
                    external_id = %capture.external_id,
                    %entity_id,
                    similarity,
                    "probable match"
                );
                (entity_id, ItemOutcome::Probable)
            }
            MatchDecision::NewEntity { .. } => {
                let entity = self.new_entity(&capture);
                let entity_id = self.catalog.save_entity(&entity).await.map_err(|source| {
                    ItemError::Persistence {
                        stage: "save entity",
                        source,
                    }
                })?;
                tracing::debug!(
                    shop_id = %capture.shop_id,
                    external_id = %capture.external_id,
                    %entity_id,
                    identity_key = %entity.identity_key(),
                    "created entity"
                );
                (entity_id, ItemOutcome::Created)
            }
        };

        let record = PriceRecord {
            product_id: entity_id,
            shop_id: capture.shop_id.clone(),
            shop_name: capture.shop_name.clone(),
            price: capture.price,
            currency: capture.currency.clone(),
            url: capture.url.clone(),
            in_stock: capture.in_stock,
            updated_at: capture.captured_at,
        };
        self.catalog
            .save_price_record(&record)
            .await
            .map_err(|source| ItemError::Persistence {
                stage: "save price record",
                source,
            })?;

        if let Err(e) = self.history.record_price(&record.to_price_point()).await {
            tracing::warn!(
                shop_id = %capture.shop_id,
                product_id = %entity_id,
                error = %e,
                "failed to record price history"
            );
        }

        if let Some(similarity) = decision.entity_id().and(decision.similarity()) {
            self.audit_match(&capture, entity_id, similarity).await;
        }

        match self
            .raw
            .mark_raw_capture_processed(&capture.shop_id, &capture.external_id, capture.captured_at)
            .await
        {
            Ok(true) => {}
            Ok(false) => tracing::debug!(
                shop_id = %capture.shop_id,
                external_id = %capture.external_id,
                "capture was replaced while processing; newer snapshot left queued"
            ),
            Err(e) => tracing::warn!(
                shop_id = %capture.shop_id,
                external_id = %capture.external_id,
                error = %e,
                "failed to mark capture processed; it will be reprocessed"
            ),
        }

        Ok(outcome)
    }

    fn new_entity(&self, capture: &RawCapture) -> CanonicalEntity {
        let scorer = self.resolver.scorer();
        CanonicalEntity {
            id: Uuid::new_v4(),
            name: capture.name.clone(),
            normalized_name: scorer.names().normalize(&capture.name, capture.offer_type),
            brand: capture.brand.clone(),
            normalized_brand: scorer.brands().normalize_opt(capture.brand.as_deref()),
            category: capture.category.clone(),
            description: capture.description.clone(),
            image_url: capture.primary_image().map(str::to_string),
            specs: capture.specs.clone(),
            offer_type: capture.offer_type,
        }
    }

    async fn audit_match(&self, capture: &RawCapture, matched_id: Uuid, similarity: f64) {
        let record = ProductMatch {
            product_id: capture.key(),
            matched_id,
            similarity,
            confidence: MatchConfidence::from_similarity(similarity),
            matched_at: Utc::now(),
        };
        if let Err(e) = self.audit.save_match(&record).await {
            tracing::warn!(
                capture = %record.product_id,
                %matched_id,
                error = %e,
                "failed to save match audit record"
            );
        }
    }
}

/// Copy of `capture` with text fields trimmed and blank optionals dropped.
fn trimmed(capture: &RawCapture) -> RawCapture {
    fn opt(value: Option<&String>) -> Option<String> {
        value
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    RawCapture {
        name: capture.name.trim().to_string(),
        description: opt(capture.description.as_ref()),
        brand: opt(capture.brand.as_ref()),
        category: opt(capture.category.as_ref()),
        url: capture.url.trim().to_string(),
        currency: capture.currency.trim().to_string(),
        image_urls: capture
            .image_urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect(),
        ..capture.clone()
    }
}
