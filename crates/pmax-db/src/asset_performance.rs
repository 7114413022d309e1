//! Database operations for `asset_performance`: one row per asset per
//! report window, overwritten on re-run.

use chrono::{DateTime, NaiveDate, Utc};
use pmax_core::AssetMetricRecord;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

/// A row from the `asset_performance` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AssetPerformanceRow {
    pub id: i64,
    pub identity: String,
    pub window_end: NaiveDate,
    pub campaign_name: String,
    pub asset_type: String,
    pub asset_text: Option<String>,
    pub impressions: i64,
    pub clicks: i64,
    pub cost: Decimal,
    pub conversions: Decimal,
    pub ctr: f64,
    pub status: String,
    pub kill_reason: Option<String>,
    pub diagnosis: Option<String>,
    pub replacement_text: Option<String>,
    pub replacement_unavailable: bool,
    pub verification_status: Option<String>,
    pub verified_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AssetPerformanceRow {
    /// Convert back into the domain record.
    ///
    /// # Errors
    ///
    /// Returns [`DbError::InvalidValue`] if the stored asset type or status
    /// is not a known value.
    pub fn into_record(self) -> Result<AssetMetricRecord, DbError> {
        Ok(AssetMetricRecord {
            identity: self.identity,
            window_end: self.window_end,
            campaign_name: self.campaign_name,
            asset_type: self.asset_type.parse()?,
            asset_text: self.asset_text,
            impressions: self.impressions,
            clicks: self.clicks,
            cost: self.cost,
            conversions: self.conversions,
            ctr: self.ctr,
            status: self.status.parse()?,
        })
    }
}

/// FLAG details stored alongside a record. Empty for KEEP and MONITORED.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagAnnotation {
    pub kill_reason: Option<String>,
    pub diagnosis: Option<String>,
    pub replacement_text: Option<String>,
    pub replacement_unavailable: bool,
}

const COLUMNS: &str = "id, identity, window_end, campaign_name, asset_type, asset_text, \
     impressions, clicks, cost, conversions, ctr, status, kill_reason, diagnosis, \
     replacement_text, replacement_unavailable, verification_status, verified_at, \
     created_at, updated_at";

/// Insert or overwrite the record for `(identity, window_end)`.
///
/// A re-run replaces metrics, status and annotation. Verification fields are
/// left alone so a later verify pass is not erased by a repeated review.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_asset_performance(
    pool: &PgPool,
    record: &AssetMetricRecord,
    annotation: &FlagAnnotation,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO asset_performance \
             (identity, window_end, campaign_name, asset_type, asset_text, impressions, \
              clicks, cost, conversions, ctr, status, kill_reason, diagnosis, \
              replacement_text, replacement_unavailable) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
         ON CONFLICT (identity, window_end) DO UPDATE SET \
             campaign_name           = EXCLUDED.campaign_name, \
             asset_type              = EXCLUDED.asset_type, \
             asset_text              = EXCLUDED.asset_text, \
             impressions             = EXCLUDED.impressions, \
             clicks                  = EXCLUDED.clicks, \
             cost                    = EXCLUDED.cost, \
             conversions             = EXCLUDED.conversions, \
             ctr                     = EXCLUDED.ctr, \
             status                  = EXCLUDED.status, \
             kill_reason             = EXCLUDED.kill_reason, \
             diagnosis               = EXCLUDED.diagnosis, \
             replacement_text        = EXCLUDED.replacement_text, \
             replacement_unavailable = EXCLUDED.replacement_unavailable, \
             updated_at              = NOW() \
         RETURNING id",
    )
    .bind(&record.identity)
    .bind(record.window_end)
    .bind(&record.campaign_name)
    .bind(record.asset_type.as_str())
    .bind(record.asset_text.as_deref())
    .bind(record.impressions)
    .bind(record.clicks)
    .bind(record.cost)
    .bind(record.conversions)
    .bind(record.ctr)
    .bind(record.status.as_str())
    .bind(annotation.kill_reason.as_deref())
    .bind(annotation.diagnosis.as_deref())
    .bind(annotation.replacement_text.as_deref())
    .bind(annotation.replacement_unavailable)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Records from the most recent stored window that ends before `before` and
/// no earlier than `earliest`. Empty when no such window exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::InvalidValue`] if a stored row cannot be decoded.
pub async fn fetch_prior_window(
    pool: &PgPool,
    before: NaiveDate,
    earliest: NaiveDate,
) -> Result<Vec<AssetMetricRecord>, DbError> {
    let rows = sqlx::query_as::<_, AssetPerformanceRow>(&format!(
        "SELECT {COLUMNS} FROM asset_performance \
         WHERE window_end = ( \
             SELECT MAX(window_end) FROM asset_performance \
             WHERE window_end < $1 AND window_end >= $2 \
         ) \
         ORDER BY identity"
    ))
    .bind(before)
    .bind(earliest)
    .fetch_all(pool)
    .await?;

    rows.into_iter()
        .map(AssetPerformanceRow::into_record)
        .collect()
}

/// FLAG rows from the most recent window ending before `before`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_flags_for_verification(
    pool: &PgPool,
    before: NaiveDate,
) -> Result<Vec<AssetPerformanceRow>, DbError> {
    let rows = sqlx::query_as::<_, AssetPerformanceRow>(&format!(
        "SELECT {COLUMNS} FROM asset_performance \
         WHERE status = 'FLAG' \
           AND window_end = ( \
               SELECT MAX(window_end) FROM asset_performance \
               WHERE window_end < $1 AND status = 'FLAG' \
           ) \
         ORDER BY campaign_name, identity"
    ))
    .bind(before)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Write a verification outcome back onto a stored FLAG row.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row matches, or [`DbError::Sqlx`] if
/// the update fails.
pub async fn set_verification_status(
    pool: &PgPool,
    identity: &str,
    window_end: NaiveDate,
    status: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE asset_performance \
         SET verification_status = $1, verified_at = NOW(), updated_at = NOW() \
         WHERE identity = $2 AND window_end = $3",
    )
    .bind(status)
    .bind(identity)
    .bind(window_end)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}
