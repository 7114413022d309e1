//! Weekly budget decisions, one row per campaign per week.

use chrono::{DateTime, NaiveDate, Utc};
use pmax_core::CampaignBudgetRecord;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BudgetPerformanceRow {
    pub id: i64,
    pub campaign_name: String,
    pub week_ending: NaiveDate,
    pub spend: Decimal,
    pub revenue: Decimal,
    pub roas: Option<Decimal>,
    pub target_roas: Decimal,
    pub budget_utilization: Option<Decimal>,
    pub current_daily_budget: Decimal,
    pub recommended_daily_budget: Decimal,
    pub action: String,
    pub reason: String,
    pub market_ceiling: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Insert or overwrite the decision for `(campaign_name, week_ending)`.
///
/// ROAS is always taken from `record`; a stored value is never carried over.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_budget_record(
    pool: &PgPool,
    record: &CampaignBudgetRecord,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO budget_performance \
             (campaign_name, week_ending, spend, revenue, roas, target_roas, \
              budget_utilization, current_daily_budget, recommended_daily_budget, \
              action, reason, market_ceiling) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         ON CONFLICT (campaign_name, week_ending) DO UPDATE SET \
             spend                    = EXCLUDED.spend, \
             revenue                  = EXCLUDED.revenue, \
             roas                     = EXCLUDED.roas, \
             target_roas              = EXCLUDED.target_roas, \
             budget_utilization       = EXCLUDED.budget_utilization, \
             current_daily_budget     = EXCLUDED.current_daily_budget, \
             recommended_daily_budget = EXCLUDED.recommended_daily_budget, \
             action                   = EXCLUDED.action, \
             reason                   = EXCLUDED.reason, \
             market_ceiling           = EXCLUDED.market_ceiling, \
             updated_at               = NOW() \
         RETURNING id",
    )
    .bind(&record.campaign_name)
    .bind(record.week_ending)
    .bind(record.spend)
    .bind(record.revenue)
    .bind(record.roas)
    .bind(record.target_roas)
    .bind(record.budget_utilization.map(|u| u.round_dp(4)))
    .bind(record.current_daily_budget)
    .bind(record.recommended_daily_budget)
    .bind(record.action.as_str())
    .bind(&record.reason)
    .bind(record.market_ceiling)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// The most recent `limit` weeks for one campaign, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_budget_history(
    pool: &PgPool,
    campaign_name: &str,
    limit: i64,
) -> Result<Vec<BudgetPerformanceRow>, DbError> {
    let rows = sqlx::query_as::<_, BudgetPerformanceRow>(
        "SELECT id, campaign_name, week_ending, spend, revenue, roas, target_roas, \
                budget_utilization, current_daily_budget, recommended_daily_budget, \
                action, reason, market_ceiling, created_at, updated_at \
         FROM budget_performance \
         WHERE campaign_name = $1 \
         ORDER BY week_ending DESC \
         LIMIT $2",
    )
    .bind(campaign_name)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
