//! Database operations for `offers`, the canonical catalog.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use katalog_core::{CanonicalEntity, OfferType};

use crate::{sql_limit, DbError};

/// A row from the `offers` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OfferRow {
    pub id: Uuid,
    pub identity_key: String,
    pub name: String,
    pub normalized_name: String,
    pub brand: Option<String>,
    pub normalized_brand: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub specs: Json<BTreeMap<String, String>>,
    pub offer_type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<OfferRow> for CanonicalEntity {
    fn from(row: OfferRow) -> Self {
        CanonicalEntity {
            id: row.id,
            name: row.name,
            normalized_name: row.normalized_name,
            brand: row.brand,
            normalized_brand: row.normalized_brand,
            category: row.category,
            description: row.description,
            image_url: row.image_url,
            specs: row.specs.0,
            offer_type: OfferType::from_tag(&row.offer_type),
        }
    }
}

/// Inserts an offer, or returns the id of the offer that already holds the
/// same identity key.
///
/// The existing row keeps its descriptive fields; only `updated_at` moves.
/// Two writers creating the same offer at once both get the winner's id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_offer(pool: &PgPool, entity: &CanonicalEntity) -> Result<Uuid, DbError> {
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO offers \
             (id, identity_key, name, normalized_name, brand, normalized_brand, \
              category, description, image_url, specs, offer_type) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) \
         ON CONFLICT (identity_key) DO UPDATE SET \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(entity.id)
    .bind(entity.identity_key())
    .bind(&entity.name)
    .bind(&entity.normalized_name)
    .bind(&entity.brand)
    .bind(&entity.normalized_brand)
    .bind(&entity.category)
    .bind(&entity.description)
    .bind(&entity.image_url)
    .bind(Json(&entity.specs))
    .bind(entity.offer_type.as_str())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Returns a recall-oriented shortlist of offers of the same type whose
/// normalized name contains, or is contained in, `normalized_name`, or that
/// share its first word.
///
/// When `normalized_brand` is set, offers with a different known brand are
/// excluded. Exact name matches sort first, then same-brand offers, then
/// the oldest.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_candidate_offers(
    pool: &PgPool,
    normalized_name: &str,
    normalized_brand: Option<&str>,
    offer_type: OfferType,
    limit: usize,
) -> Result<Vec<OfferRow>, DbError> {
    let rows = sqlx::query_as::<_, OfferRow>(
        "SELECT id, identity_key, name, normalized_name, brand, normalized_brand, \
                category, description, image_url, specs, offer_type, created_at, updated_at \
         FROM offers \
         WHERE offer_type = $3 \
           AND ($2::TEXT IS NULL OR normalized_brand IS NULL OR normalized_brand = $2) \
           AND ( \
                strpos(normalized_name, $1) > 0 \
             OR strpos($1, normalized_name) > 0 \
             OR split_part(normalized_name, ' ', 1) = split_part($1, ' ', 1) \
           ) \
         ORDER BY (normalized_name = $1) DESC, \
                  (normalized_brand IS NOT DISTINCT FROM $2) DESC, \
                  created_at ASC \
         LIMIT $4",
    )
    .bind(normalized_name)
    .bind(normalized_brand)
    .bind(offer_type.as_str())
    .bind(sql_limit(limit))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
