//! Database operations for `prices` and `price_history`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use katalog_core::{PricePoint, PriceRecord, StalePrice};

use crate::{sql_limit, DbError};

/// A row from the `prices` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PriceRow {
    pub product_id: Uuid,
    pub shop_id: String,
    pub shop_name: String,
    pub price: Decimal,
    pub currency: String,
    pub url: String,
    pub in_stock: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<PriceRow> for StalePrice {
    fn from(row: PriceRow) -> Self {
        StalePrice {
            product_id: row.product_id,
            shop_id: row.shop_id,
            url: row.url,
            updated_at: row.updated_at,
        }
    }
}

// ---------------------------------------------------------------------------
// prices operations
// ---------------------------------------------------------------------------

/// Upserts the current price of an offer at one shop.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails, including when
/// `product_id` names no offer.
pub async fn upsert_price(pool: &PgPool, record: &PriceRecord) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO prices \
             (product_id, shop_id, shop_name, price, currency, url, in_stock, updated_at) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         ON CONFLICT (product_id, shop_id) DO UPDATE SET \
             shop_name  = EXCLUDED.shop_name, \
             price      = EXCLUDED.price, \
             currency   = EXCLUDED.currency, \
             url        = EXCLUDED.url, \
             in_stock   = EXCLUDED.in_stock, \
             updated_at = EXCLUDED.updated_at",
    )
    .bind(record.product_id)
    .bind(&record.shop_id)
    .bind(&record.shop_name)
    .bind(record.price)
    .bind(&record.currency)
    .bind(&record.url)
    .bind(record.in_stock)
    .bind(record.updated_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns up to `limit` prices last updated before `older_than`, stalest
/// first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_stale_prices(
    pool: &PgPool,
    older_than: DateTime<Utc>,
    limit: usize,
) -> Result<Vec<PriceRow>, DbError> {
    let rows = sqlx::query_as::<_, PriceRow>(
        "SELECT product_id, shop_id, shop_name, price, currency, url, in_stock, updated_at \
         FROM prices \
         WHERE updated_at < $1 \
         ORDER BY updated_at ASC \
         LIMIT $2",
    )
    .bind(older_than)
    .bind(sql_limit(limit))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// price_history operations
// ---------------------------------------------------------------------------

/// Appends a price observation.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_price_point(pool: &PgPool, point: &PricePoint) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO price_history (product_id, shop_id, price, currency, recorded_at) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(point.product_id)
    .bind(&point.shop_id)
    .bind(point.price)
    .bind(&point.currency)
    .bind(point.recorded_at)
    .execute(pool)
    .await?;

    Ok(())
}
