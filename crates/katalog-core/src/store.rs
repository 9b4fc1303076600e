//! Narrow storage interfaces consumed by the ingestion pipeline.
//!
//! Each trait covers one responsibility so that callers only depend on the
//! operations they use. Implementations must make every single call atomic
//! (one-row upserts); nothing here assumes transactions across calls.

use std::future::Future;

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::capture::RawCapture;
use crate::catalog::{CanonicalEntity, OfferType, PricePoint, PriceRecord, ProductMatch};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("similarity {0} is outside [0, 1]")]
    InvalidSimilarity(f64),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn backend<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Backend(Box::new(err))
    }
}

pub trait RawCaptureReader: Send + Sync {
    /// Oldest-first captures still waiting for resolution, at most `limit`.
    fn unprocessed_raw_captures(
        &self,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<RawCapture>, StoreError>> + Send;
}

pub trait RawCaptureWriter: Send + Sync {
    /// Upserts by `(shop_id, external_id)`, resetting the processing state to
    /// unprocessed.
    fn save_raw_capture(
        &self,
        capture: &RawCapture,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Marks the capture processed only while it is still the unprocessed
    /// snapshot taken at `captured_at`. Returns `false` when nothing matched:
    /// the key is unknown, already resolved, or a newer capture replaced it
    /// in the meantime and must stay queued.
    fn mark_raw_capture_processed(
        &self,
        shop_id: &str,
        external_id: &str,
        captured_at: DateTime<Utc>,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;

    /// Takes a capture that can never be resolved out of the unprocessed
    /// queue. Only a new capture for the same key re-queues it. Guarded by
    /// `captured_at` like [`Self::mark_raw_capture_processed`].
    fn mark_raw_capture_invalid(
        &self,
        shop_id: &str,
        external_id: &str,
        captured_at: DateTime<Utc>,
        reason: &str,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send;
}

pub trait CatalogReader: Send + Sync {
    /// Recall-oriented shortlist of entities that might be the same offer.
    fn find_candidate_entities(
        &self,
        normalized_name: &str,
        normalized_brand: Option<&str>,
        offer_type: OfferType,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<CanonicalEntity>, StoreError>> + Send;

    /// Source URLs of price records not refreshed since `older_than`.
    fn list_stale_price_urls(
        &self,
        older_than: DateTime<Utc>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<StalePrice>, StoreError>> + Send;
}

pub trait CatalogWriter: Send + Sync {
    /// Upserts on the entity identity key and returns the id of the stored
    /// row, which differs from `entity.id` when another writer created the
    /// same offer first.
    fn save_entity(
        &self,
        entity: &CanonicalEntity,
    ) -> impl Future<Output = Result<Uuid, StoreError>> + Send;

    /// Upserts by `(product_id, shop_id)`.
    fn save_price_record(
        &self,
        record: &PriceRecord,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

pub trait MatchAuditSink: Send + Sync {
    /// # Errors
    ///
    /// Implementations return [`StoreError::InvalidSimilarity`] for a
    /// similarity outside `[0, 1]`.
    fn save_match(
        &self,
        record: &ProductMatch,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

pub trait PriceHistorySink: Send + Sync {
    fn record_price(
        &self,
        point: &PricePoint,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;
}

/// A price record due for a fresh capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StalePrice {
    pub product_id: Uuid,
    pub shop_id: String,
    pub url: String,
    pub updated_at: DateTime<Utc>,
}

/// Shared validation for [`MatchAuditSink`] implementations.
///
/// # Errors
///
/// Returns [`StoreError::InvalidSimilarity`] when the score is outside
/// `[0, 1]` or not a number.
pub fn check_similarity(similarity: f64) -> Result<(), StoreError> {
    if (0.0..=1.0).contains(&similarity) {
        Ok(())
    } else {
        Err(StoreError::InvalidSimilarity(similarity))
    }
}

/// Shared validation for [`PriceHistorySink`] implementations.
///
/// # Errors
///
/// Returns [`StoreError::InvalidRecord`] for a blank shop id or a negative
/// price.
pub fn check_price_point(point: &PricePoint) -> Result<(), StoreError> {
    if point.shop_id.trim().is_empty() {
        return Err(StoreError::InvalidRecord(
            "price point has an empty shop id".to_string(),
        ));
    }
    if point.price.is_sign_negative() {
        return Err(StoreError::InvalidRecord(format!(
            "price point has negative price {}",
            point.price
        )));
    }
    Ok(())
}
