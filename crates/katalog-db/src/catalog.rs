//! [`PgCatalog`]: the Postgres implementation of every storage trait the
//! pipeline consumes.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use katalog_core::store::{check_price_point, check_similarity};
use katalog_core::{
    CanonicalEntity, CatalogReader, CatalogWriter, MatchAuditSink, OfferType, PricePoint,
    PriceHistorySink, PriceRecord, ProductMatch, RawCapture, RawCaptureReader, RawCaptureWriter,
    StalePrice, StoreError,
};

use crate::{matches, offers, prices, raw_captures};

/// Cheap to clone; every clone shares the same pool.
#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl RawCaptureReader for PgCatalog {
    async fn unprocessed_raw_captures(&self, limit: usize) -> Result<Vec<RawCapture>, StoreError> {
        let rows = raw_captures::list_unprocessed_raw_captures(&self.pool, limit).await?;
        Ok(rows.into_iter().map(RawCapture::from).collect())
    }
}

impl RawCaptureWriter for PgCatalog {
    async fn save_raw_capture(&self, capture: &RawCapture) -> Result<(), StoreError> {
        raw_captures::upsert_raw_capture(&self.pool, capture).await?;
        Ok(())
    }

    async fn mark_raw_capture_processed(
        &self,
        shop_id: &str,
        external_id: &str,
        captured_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(
            raw_captures::mark_raw_capture_processed(&self.pool, shop_id, external_id, captured_at)
                .await?,
        )
    }

    async fn mark_raw_capture_invalid(
        &self,
        shop_id: &str,
        external_id: &str,
        captured_at: DateTime<Utc>,
        reason: &str,
    ) -> Result<bool, StoreError> {
        Ok(raw_captures::mark_raw_capture_invalid(
            &self.pool,
            shop_id,
            external_id,
            captured_at,
            reason,
        )
        .await?)
    }
}

impl CatalogReader for PgCatalog {
    async fn find_candidate_entities(
        &self,
        normalized_name: &str,
        normalized_brand: Option<&str>,
        offer_type: OfferType,
        limit: usize,
    ) -> Result<Vec<CanonicalEntity>, StoreError> {
        let rows = offers::find_candidate_offers(
            &self.pool,
            normalized_name,
            normalized_brand,
            offer_type,
            limit,
        )
        .await?;
        Ok(rows.into_iter().map(CanonicalEntity::from).collect())
    }

    async fn list_stale_price_urls(
        &self,
        older_than: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<StalePrice>, StoreError> {
        let rows = prices::list_stale_prices(&self.pool, older_than, limit).await?;
        Ok(rows.into_iter().map(StalePrice::from).collect())
    }
}

impl CatalogWriter for PgCatalog {
    async fn save_entity(&self, entity: &CanonicalEntity) -> Result<Uuid, StoreError> {
        Ok(offers::upsert_offer(&self.pool, entity).await?)
    }

    async fn save_price_record(&self, record: &PriceRecord) -> Result<(), StoreError> {
        prices::upsert_price(&self.pool, record).await?;
        Ok(())
    }
}

impl MatchAuditSink for PgCatalog {
    async fn save_match(&self, record: &ProductMatch) -> Result<(), StoreError> {
        check_similarity(record.similarity)?;
        matches::insert_product_match(&self.pool, record).await?;
        Ok(())
    }
}

impl PriceHistorySink for PgCatalog {
    async fn record_price(&self, point: &PricePoint) -> Result<(), StoreError> {
        check_price_point(point)?;
        prices::insert_price_point(&self.pool, point).await?;
        Ok(())
    }
}
