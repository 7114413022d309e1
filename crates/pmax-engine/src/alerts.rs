//! Emergency condition scan. Runs in every season mode.

use std::collections::BTreeMap;

use pmax_core::{
    ctr_percent, AlertPolicy, AssetMetricRecord, AssetType, BudgetPolicy, CampaignSpend,
    SeasonContext,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::budget::market_ceiling;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Critical,
    High,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Critical => write!(f, "CRITICAL"),
            Severity::High => write!(f, "HIGH"),
            Severity::Info => write!(f, "INFO"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    CtrCollapse,
    BudgetRunaway,
    MarketCeiling,
    UpstreamFailure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub severity: Severity,
    pub campaign_name: Option<String>,
    /// Asset type for type-level CTR collapse; `None` for campaign-wide alerts.
    pub asset_type: Option<AssetType>,
    pub title: String,
    pub message: String,
    pub actions: Vec<String>,
}

fn actions(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}

/// Critical alert raised when collection failed and the run was aborted.
#[must_use]
pub fn upstream_failure(detail: &str) -> Alert {
    Alert {
        kind: AlertKind::UpstreamFailure,
        severity: Severity::Critical,
        campaign_name: None,
        asset_type: None,
        title: "Weekly Review Aborted: Upstream Data Unavailable".to_string(),
        message: detail.to_string(),
        actions: actions(&[
            "Check the metrics collector logs",
            "Re-run the review once collection succeeds",
        ]),
    }
}

#[derive(Default, Clone, Copy)]
struct Clicks {
    impressions: i64,
    clicks: i64,
}

impl Clicks {
    fn ctr(self) -> f64 {
        ctr_percent(self.clicks, self.impressions)
    }
}

type GroupKey = (String, Option<AssetType>);

fn ctr_groups(records: &[AssetMetricRecord]) -> BTreeMap<GroupKey, Clicks> {
    let mut groups: BTreeMap<GroupKey, Clicks> = BTreeMap::new();
    for r in records {
        for key in [
            (r.campaign_name.clone(), None),
            (r.campaign_name.clone(), Some(r.asset_type)),
        ] {
            let entry = groups.entry(key).or_default();
            entry.impressions += r.impressions;
            entry.clicks += r.clicks;
        }
    }
    groups
}

/// Week-over-week CTR collapse at campaign and asset-type granularity.
///
/// `prior` is the immediately preceding stored window. Groups without prior
/// CTR or without current impressions are skipped.
#[must_use]
pub fn ctr_collapse_alerts(
    current: &[AssetMetricRecord],
    prior: &[AssetMetricRecord],
    policy: &AlertPolicy,
) -> Vec<Alert> {
    let before = ctr_groups(prior);
    let now = ctr_groups(current);
    let keep = 1.0 - policy.ctr_collapse_drop;

    let mut alerts = Vec::new();
    for ((campaign, asset_type), totals) in &now {
        let Some(prior_totals) = before.get(&(campaign.clone(), *asset_type)) else {
            continue;
        };
        let prior_ctr = prior_totals.ctr();
        if prior_ctr <= 0.0 || totals.impressions <= 0 {
            continue;
        }
        let current_ctr = totals.ctr();
        if current_ctr > prior_ctr * keep {
            continue;
        }

        let scope = asset_type.map_or_else(|| "campaign".to_string(), |t| t.to_string());
        alerts.push(Alert {
            kind: AlertKind::CtrCollapse,
            severity: Severity::High,
            campaign_name: Some(campaign.clone()),
            asset_type: *asset_type,
            title: format!(
                "CTR Dropped {:.0}%+ Week-Over-Week ({scope})",
                policy.ctr_collapse_drop * 100.0
            ),
            message: format!(
                "{campaign}: CTR fell from {prior_ctr:.2}% to {current_ctr:.2}%"
            ),
            actions: actions(&[
                "Check for ad policy changes",
                "Review the competitive landscape",
                "Verify the landing page is loading",
                "Consider an emergency asset refresh",
            ]),
        });
    }
    alerts
}

fn percent(ratio: Decimal) -> Decimal {
    ratio.checked_mul(Decimal::ONE_HUNDRED).unwrap_or(Decimal::MAX)
}

/// Budget runaway and market-ceiling alerts for each campaign.
#[must_use]
pub fn budget_alerts(
    spends: &[CampaignSpend],
    ctx: &SeasonContext,
    policy: &BudgetPolicy,
) -> Vec<Alert> {
    let mut alerts = Vec::new();
    for s in spends {
        let daily = s.avg_daily_spend();
        let budget = s.current_daily_budget;

        if let Some(roas) = s.roas().filter(|_| budget > Decimal::ZERO) {
            let cap = budget.checked_mul(policy.runaway_multiplier).unwrap_or(Decimal::MAX);
            if daily >= cap && roas < ctx.target_roas {
                alerts.push(Alert {
                    kind: AlertKind::BudgetRunaway,
                    severity: Severity::High,
                    campaign_name: Some(s.campaign_name.clone()),
                    asset_type: None,
                    title: format!(
                        "Spending {}x Budget with Low ROAS",
                        policy.runaway_multiplier.normalize()
                    ),
                    message: format!(
                        "{}: spending ${daily:.2}/day (budget ${budget:.2}) at {:.2}% ROAS (target {:.2}%)",
                        s.campaign_name,
                        percent(roas),
                        percent(ctx.target_roas),
                    ),
                    actions: actions(&[
                        "Reduce the daily budget cap immediately",
                        "Review audience expansion settings",
                        "Check placement performance",
                    ]),
                });
            }
        }

        if market_ceiling(s, policy) {
            let utilization = s
                .budget_utilization()
                .map_or(Decimal::ZERO, percent);
            alerts.push(Alert {
                kind: AlertKind::MarketCeiling,
                severity: Severity::Info,
                campaign_name: Some(s.campaign_name.clone()),
                asset_type: None,
                title: "Market Ceiling Detected".to_string(),
                message: format!(
                    "{}: only spending ${daily:.2} of ${budget:.2} budget ({utilization:.0}% utilization)",
                    s.campaign_name,
                ),
                actions: actions(&[
                    "Stop increasing budget; the market cannot absorb more",
                    "Consider new campaigns or channels",
                ]),
            });
        }
    }
    alerts
}

/// Full scan. Output is sorted by severity, then campaign.
#[must_use]
pub fn detect_alerts(
    current: &[AssetMetricRecord],
    prior: &[AssetMetricRecord],
    spends: &[CampaignSpend],
    ctx: &SeasonContext,
    budget: &BudgetPolicy,
    alerts: &AlertPolicy,
) -> Vec<Alert> {
    let mut out = ctr_collapse_alerts(current, prior, alerts);
    out.extend(budget_alerts(spends, ctx, budget));
    out.sort_by(|a, b| {
        a.severity
            .cmp(&b.severity)
            .then_with(|| a.campaign_name.cmp(&b.campaign_name))
    });

    if !out.is_empty() {
        tracing::warn!(alerts = out.len(), season = %ctx.season, "emergency conditions detected");
    }
    out
}

#[cfg(test)]
#[path = "alerts_test.rs"]
mod tests;
