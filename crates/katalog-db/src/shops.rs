use katalog_core::ShopConfig;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

/// Upsert shops from config into the database.
///
/// Returns the number of shops processed. All upserts run inside a single
/// transaction; if any fails the whole batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_shops(pool: &PgPool, shops: &[ShopConfig]) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for shop in shops {
        sqlx::query(
            "INSERT INTO shops \
                 (id, name, base_url, selectors, rate_limit_ms, retry_limit, retry_backoff_ms, \
                  requires_js, offer_type, enabled) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (id) DO UPDATE SET \
                 name             = EXCLUDED.name, \
                 base_url         = EXCLUDED.base_url, \
                 selectors        = EXCLUDED.selectors, \
                 rate_limit_ms    = EXCLUDED.rate_limit_ms, \
                 retry_limit      = EXCLUDED.retry_limit, \
                 retry_backoff_ms = EXCLUDED.retry_backoff_ms, \
                 requires_js      = EXCLUDED.requires_js, \
                 offer_type       = EXCLUDED.offer_type, \
                 enabled          = EXCLUDED.enabled, \
                 updated_at       = NOW()",
        )
        .bind(&shop.id)
        .bind(&shop.name)
        .bind(&shop.base_url)
        .bind(Json(&shop.selectors))
        .bind(i64::try_from(shop.rate_limit_ms).unwrap_or(i64::MAX))
        .bind(i32::try_from(shop.retry_limit).unwrap_or(i32::MAX))
        .bind(i64::try_from(shop.retry_backoff_ms).unwrap_or(i64::MAX))
        .bind(shop.requires_js)
        .bind(shop.offer_type.as_str())
        .bind(shop.enabled)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
