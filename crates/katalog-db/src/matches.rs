//! Database operations for `product_matches`, the resolution audit trail.

use sqlx::PgPool;

use katalog_core::ProductMatch;

use crate::DbError;

/// Appends one match decision to the audit trail.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_product_match(pool: &PgPool, record: &ProductMatch) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO product_matches (product_id, matched_id, similarity, confidence, matched_at) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id",
    )
    .bind(&record.product_id)
    .bind(record.matched_id)
    .bind(record.similarity)
    .bind(record.confidence.as_str())
    .bind(record.matched_at)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
