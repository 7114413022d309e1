//! Append-only store of removed copy, used as generation context.

use chrono::NaiveDate;
use pmax_core::GraveyardEntry;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
struct GraveyardRow {
    campaign_name: String,
    date_killed: NaiveDate,
    asset_identity: String,
    asset_type: String,
    original_copy: String,
    kill_reason: String,
    impressions: i64,
    clicks: i64,
    ctr: f64,
}

impl TryFrom<GraveyardRow> for GraveyardEntry {
    type Error = DbError;

    fn try_from(row: GraveyardRow) -> Result<Self, Self::Error> {
        Ok(GraveyardEntry {
            campaign_name: row.campaign_name,
            date_killed: row.date_killed,
            asset_identity: row.asset_identity,
            asset_type: row.asset_type.parse()?,
            original_copy: row.original_copy,
            kill_reason: row.kill_reason,
            impressions: row.impressions,
            clicks: row.clicks,
            ctr: row.ctr,
        })
    }
}

/// Append one entry. A repeat of the same `(campaign, identity, date_killed)`
/// is ignored; existing rows are never modified.
///
/// Returns `true` when a new row was written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_graveyard_entry(pool: &PgPool, entry: &GraveyardEntry) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO graveyard \
             (campaign_name, date_killed, asset_identity, asset_type, original_copy, \
              kill_reason, impressions, clicks, ctr) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         ON CONFLICT (campaign_name, asset_identity, date_killed) DO NOTHING",
    )
    .bind(&entry.campaign_name)
    .bind(entry.date_killed)
    .bind(&entry.asset_identity)
    .bind(entry.asset_type.as_str())
    .bind(&entry.original_copy)
    .bind(&entry.kill_reason)
    .bind(entry.impressions)
    .bind(entry.clicks)
    .bind(entry.ctr)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Graveyard entries, newest first, optionally restricted to one campaign.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, or
/// [`DbError::InvalidValue`] if a stored asset type is unknown.
pub async fn list_graveyard(
    pool: &PgPool,
    campaign_name: Option<&str>,
) -> Result<Vec<GraveyardEntry>, DbError> {
    let rows = sqlx::query_as::<_, GraveyardRow>(
        "SELECT campaign_name, date_killed, asset_identity, asset_type, original_copy, \
                kill_reason, impressions, clicks, ctr \
         FROM graveyard \
         WHERE ($1::TEXT IS NULL OR campaign_name = $1) \
         ORDER BY date_killed DESC, id DESC",
    )
    .bind(campaign_name)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(GraveyardEntry::try_from).collect()
}
