//! Reduce daily metric rows into one weekly record per asset identity.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use pmax_core::{ctr_percent, AssetMetricRecord, AssetStatus, AssetType, DailyMetricRow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::ValidationIssue;

pub const DEFAULT_WINDOW_DAYS: u32 = 7;

/// Inclusive reporting window ending on `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWindow {
    pub end: NaiveDate,
    pub days: u32,
}

impl ReportWindow {
    #[must_use]
    pub fn new(end: NaiveDate, days: u32) -> Self {
        Self {
            end,
            days: days.max(1),
        }
    }

    /// First day inside the window.
    #[must_use]
    pub fn start(&self) -> NaiveDate {
        self.end - Duration::days(i64::from(self.days) - 1)
    }

    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start() && date <= self.end
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Aggregation {
    /// Sorted by identity. Status is `MONITORED` until classified.
    pub records: Vec<AssetMetricRecord>,
    /// Sorted, so output does not depend on input order.
    pub issues: Vec<ValidationIssue>,
}

#[derive(Default)]
struct Totals {
    campaigns: BTreeSet<String>,
    types: BTreeSet<AssetType>,
    texts: BTreeSet<String>,
    impressions: i64,
    clicks: i64,
    cost: Decimal,
    conversions: Decimal,
}

fn row_issue(row: &DailyMetricRow, window: &ReportWindow) -> Option<&'static str> {
    if row.impressions < 0 || row.clicks < 0 {
        return Some("negative impressions or clicks");
    }
    if row.cost < Decimal::ZERO || row.conversions < Decimal::ZERO {
        return Some("negative cost or conversions");
    }
    if row.clicks > row.impressions {
        return Some("clicks exceed impressions");
    }
    if !window.contains(row.date) {
        return Some("date outside report window");
    }
    None
}

/// Group rows by stable identity and sum their counters.
///
/// Rows that fail validation are skipped and reported. An identity whose rows
/// disagree on campaign or asset type is dropped entirely, since there is no
/// order-independent way to pick one.
#[must_use]
pub fn aggregate(rows: &[DailyMetricRow], window: ReportWindow) -> Aggregation {
    let mut issues = Vec::new();
    let mut groups: BTreeMap<String, Totals> = BTreeMap::new();

    for row in rows {
        let Some(identity) = row.identity() else {
            issues.push(ValidationIssue::new(
                None,
                &row.campaign_name,
                Some(row.date),
                "missing asset identity",
            ));
            continue;
        };

        if let Some(reason) = row_issue(row, &window) {
            issues.push(ValidationIssue::new(
                Some(identity),
                &row.campaign_name,
                Some(row.date),
                reason,
            ));
            continue;
        }

        let totals = groups.entry(identity).or_default();
        totals.campaigns.insert(row.campaign_name.clone());
        totals.types.insert(row.asset_type);
        if let Some(text) = row.asset_text.as_deref().map(str::trim) {
            if !text.is_empty() {
                totals.texts.insert(text.to_string());
            }
        }
        totals.impressions += row.impressions;
        totals.clicks += row.clicks;
        totals.cost += row.cost;
        totals.conversions += row.conversions;
    }

    let mut records = Vec::with_capacity(groups.len());
    for (identity, totals) in groups {
        if totals.campaigns.len() > 1 || totals.types.len() > 1 {
            let campaign = totals.campaigns.iter().next().cloned().unwrap_or_default();
            issues.push(ValidationIssue::new(
                Some(identity),
                &campaign,
                None,
                "conflicting campaign or asset type for identity",
            ));
            continue;
        }

        let (Some(campaign_name), Some(asset_type)) =
            (totals.campaigns.into_iter().next(), totals.types.into_iter().next())
        else {
            continue;
        };

        records.push(AssetMetricRecord {
            identity,
            window_end: window.end,
            campaign_name,
            asset_type,
            asset_text: totals.texts.into_iter().next(),
            impressions: totals.impressions,
            clicks: totals.clicks,
            cost: totals.cost,
            conversions: totals.conversions,
            ctr: ctr_percent(totals.clicks, totals.impressions),
            status: AssetStatus::Monitored,
        });
    }

    issues.sort();

    tracing::debug!(
        rows = rows.len(),
        records = records.len(),
        issues = issues.len(),
        window_end = %window.end,
        "aggregated metric rows"
    );

    Aggregation { records, issues }
}

#[cfg(test)]
#[path = "aggregate_test.rs"]
mod tests;
