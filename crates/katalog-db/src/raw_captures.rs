//! Database operations for `raw_captures`, the queue between capture and
//! resolution.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;

use katalog_core::{OfferType, RawCapture};

use crate::{sql_limit, DbError};

pub const STATE_UNPROCESSED: &str = "unprocessed";
pub const STATE_PROCESSED: &str = "processed";
pub const STATE_INVALID: &str = "invalid";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `raw_captures` table, minus bookkeeping timestamps.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawCaptureRow {
    pub id: i64,
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
    pub specs: Json<BTreeMap<String, String>>,
    pub in_stock: bool,
    /// `good` or `service`.
    pub offer_type: String,
    pub captured_at: DateTime<Utc>,
    /// `unprocessed`, `processed`, or `invalid`.
    pub processing_state: String,
    pub invalid_reason: Option<String>,
}

impl From<RawCaptureRow> for RawCapture {
    fn from(row: RawCaptureRow) -> Self {
        RawCapture {
            shop_id: row.shop_id,
            shop_name: row.shop_name,
            external_id: row.external_id,
            url: row.url,
            name: row.name,
            description: row.description,
            brand: row.brand,
            category: row.category,
            price: row.price,
            currency: row.currency,
            image_urls: row.image_urls,
            specs: row.specs.0,
            in_stock: row.in_stock,
            offer_type: OfferType::from_tag(&row.offer_type),
            captured_at: row.captured_at,
        }
    }
}

// ---------------------------------------------------------------------------
// raw_captures operations
// ---------------------------------------------------------------------------

/// Upserts a capture keyed by `(shop_id, external_id)`.
///
/// A conflict overwrites every captured field and puts the row back into the
/// `unprocessed` state, clearing any previous invalid reason.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_raw_capture(pool: &PgPool, capture: &RawCapture) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO raw_captures \
             (shop_id, shop_name, external_id, url, name, description, brand, category, \
              price, currency, image_urls, specs, in_stock, offer_type, captured_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, \
                 $9, $10, $11, $12, $13, $14, $15) \
         ON CONFLICT (shop_id, external_id) DO UPDATE SET \
             shop_name        = EXCLUDED.shop_name, \
             url              = EXCLUDED.url, \
             name             = EXCLUDED.name, \
             description      = EXCLUDED.description, \
             brand            = EXCLUDED.brand, \
             category         = EXCLUDED.category, \
             price            = EXCLUDED.price, \
             currency         = EXCLUDED.currency, \
             image_urls       = EXCLUDED.image_urls, \
             specs            = EXCLUDED.specs, \
             in_stock         = EXCLUDED.in_stock, \
             offer_type       = EXCLUDED.offer_type, \
             captured_at      = EXCLUDED.captured_at, \
             processing_state = 'unprocessed', \
             invalid_reason   = NULL, \
             processed_at     = NULL, \
             updated_at       = NOW() \
         RETURNING id",
    )
    .bind(&capture.shop_id)
    .bind(&capture.shop_name)
    .bind(&capture.external_id)
    .bind(&capture.url)
    .bind(&capture.name)
    .bind(&capture.description)
    .bind(&capture.brand)
    .bind(&capture.category)
    .bind(capture.price)
    .bind(&capture.currency)
    .bind(&capture.image_urls)
    .bind(Json(&capture.specs))
    .bind(capture.in_stock)
    .bind(capture.offer_type.as_str())
    .bind(capture.captured_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns up to `limit` unprocessed captures, oldest `captured_at` first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_unprocessed_raw_captures(
    pool: &PgPool,
    limit: usize,
) -> Result<Vec<RawCaptureRow>, DbError> {
    let rows = sqlx::query_as::<_, RawCaptureRow>(
        "SELECT id, shop_id, shop_name, external_id, url, name, description, brand, category, \
                price, currency, image_urls, specs, in_stock, offer_type, captured_at, \
                processing_state, invalid_reason \
         FROM raw_captures \
         WHERE processing_state = 'unprocessed' \
         ORDER BY captured_at ASC, id ASC \
         LIMIT $1",
    )
    .bind(sql_limit(limit))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Marks a capture as processed if it is still the unprocessed snapshot
/// taken at `captured_at`. Returns `false` when a newer capture replaced it
/// or no such row exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn mark_raw_capture_processed(
    pool: &PgPool,
    shop_id: &str,
    external_id: &str,
    captured_at: DateTime<Utc>,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE raw_captures \
         SET processing_state = 'processed', processed_at = NOW(), updated_at = NOW() \
         WHERE shop_id = $1 AND external_id = $2 AND captured_at = $3 \
           AND processing_state = 'unprocessed'",
    )
    .bind(shop_id)
    .bind(external_id)
    .bind(captured_at)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Takes a capture out of the queue with the reason it was rejected, under
/// the same snapshot guard as [`mark_raw_capture_processed`].
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] on query failure.
pub async fn mark_raw_capture_invalid(
    pool: &PgPool,
    shop_id: &str,
    external_id: &str,
    captured_at: DateTime<Utc>,
    reason: &str,
) -> Result<bool, DbError> {
    let result = sqlx::query(
        "UPDATE raw_captures \
         SET processing_state = 'invalid', invalid_reason = $4, \
             processed_at = NOW(), updated_at = NOW() \
         WHERE shop_id = $1 AND external_id = $2 AND captured_at = $3 \
           AND processing_state = 'unprocessed'",
    )
    .bind(shop_id)
    .bind(external_id)
    .bind(captured_at)
    .bind(reason)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}
