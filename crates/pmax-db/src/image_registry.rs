//! Image registry persistence. Analysis fields are write-once.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pmax_core::{AdAssetMapping, ImagePerformance, ImageRegistryEntry, ImageSlot};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ImageRegistryRow {
    pub image_id: String,
    pub content_category: String,
    pub eligible_slots: Json<Vec<ImageSlot>>,
    pub mappings: Json<Vec<AdAssetMapping>>,
    pub performance: Json<BTreeMap<String, ImagePerformance>>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ImageRegistryRow {
    /// # Errors
    ///
    /// Returns [`DbError::InvalidValue`] for an unknown content category.
    pub fn into_entry(self) -> Result<ImageRegistryEntry, DbError> {
        Ok(ImageRegistryEntry {
            image_id: self.image_id,
            content_category: self.content_category.parse()?,
            eligible_slots: self.eligible_slots.0,
            mappings: self.mappings.0,
            performance: self.performance.0,
            description: self.description,
        })
    }
}

/// Insert a new image, or refresh mappings and performance of an existing one.
///
/// `content_category` and `eligible_slots` are kept from the first insert.
/// Returns `true` when the image was new.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_image(pool: &PgPool, entry: &ImageRegistryEntry) -> Result<bool, DbError> {
    let inserted = sqlx::query_scalar::<_, bool>(
        "INSERT INTO image_registry \
             (image_id, content_category, eligible_slots, mappings, performance, description) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (image_id) DO UPDATE SET \
             mappings    = EXCLUDED.mappings, \
             performance = EXCLUDED.performance, \
             description = COALESCE(image_registry.description, EXCLUDED.description), \
             updated_at  = NOW() \
         RETURNING (xmax = 0)",
    )
    .bind(&entry.image_id)
    .bind(entry.content_category.as_str())
    .bind(Json(&entry.eligible_slots))
    .bind(Json(&entry.mappings))
    .bind(Json(&entry.performance))
    .bind(entry.description.as_deref())
    .fetch_one(pool)
    .await?;

    Ok(inserted)
}

/// Every registry entry, ordered by image id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::InvalidValue`] if a stored category is unknown.
pub async fn list_images(pool: &PgPool) -> Result<Vec<ImageRegistryEntry>, DbError> {
    let rows = sqlx::query_as::<_, ImageRegistryRow>(
        "SELECT image_id, content_category, eligible_slots, mappings, performance, \
                description, created_at, updated_at \
         FROM image_registry \
         ORDER BY image_id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ImageRegistryRow::into_entry).collect()
}

/// Replace the stored mappings of one image, leaving analysis fields alone.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if the image is not registered, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_image_mappings(
    pool: &PgPool,
    image_id: &str,
    mappings: &[AdAssetMapping],
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE image_registry \
         SET mappings = $2, updated_at = NOW() \
         WHERE image_id = $1",
    )
    .bind(image_id)
    .bind(Json(mappings))
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
