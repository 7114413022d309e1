//! The weekly review pipeline: aggregate, classify, advise, scan for alerts.

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use pmax_core::{
    AssetMetricRecord, AssetStatus, BudgetAction, CampaignBudgetRecord, CampaignSpend,
    DailyMetricRow, EngineConfig, GenerationRequest, GenerationTarget, GraveyardEntry,
    ReplacementCopy, Season, SeasonContext, SeasonMode,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::aggregate::{aggregate, ReportWindow};
use crate::alerts::{detect_alerts, Alert};
use crate::budget::advise;
use crate::classify::{classify, FlaggedAsset};
use crate::error::{EngineError, ValidationIssue};

/// Collected inputs for one run. Treated as an immutable snapshot.
#[derive(Debug, Clone, Default)]
pub struct ReviewInput {
    pub rows: Vec<DailyMetricRow>,
    pub spends: Vec<CampaignSpend>,
    /// Records from the immediately preceding stored window.
    pub prior_records: Vec<AssetMetricRecord>,
    pub graveyard: Vec<GraveyardEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub label: String,
    pub season: Season,
    pub mode: SeasonMode,
    pub preview: bool,
    pub window_end: NaiveDate,
    pub rows_received: usize,
    pub records: usize,
    pub kept: usize,
    pub flagged_text: usize,
    pub flagged_image: usize,
    pub monitored: usize,
    pub budget_actions: BTreeMap<String, BudgetAction>,
    pub alerts: usize,
    pub validation_issues: Vec<ValidationIssue>,
    pub generation_degraded: bool,
    pub generation_error: Option<String>,
    pub replacements_unavailable: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewOutput {
    pub context: SeasonContext,
    pub window: ReportWindow,
    /// Every aggregated record with its final status.
    pub records: Vec<AssetMetricRecord>,
    pub flagged: Vec<FlaggedAsset>,
    pub budgets: Vec<CampaignBudgetRecord>,
    pub alerts: Vec<Alert>,
    pub summary: RunSummary,
}

/// What the generation collaborator delivered for one run.
///
/// A partial failure keeps the copies that did arrive alongside the error.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationResult {
    pub replacements: Vec<ReplacementCopy>,
    pub error: Option<String>,
}

impl GenerationResult {
    #[must_use]
    pub fn complete(replacements: Vec<ReplacementCopy>) -> Self {
        Self {
            replacements,
            error: None,
        }
    }

    #[must_use]
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            replacements: Vec::new(),
            error: Some(error.into()),
        }
    }
}

impl ReviewOutput {
    /// Replacement-copy requests, one per campaign with text flags. Empty
    /// when the season or a preview run forbids side effects.
    ///
    /// Graveyard context leaves out entries for the assets being replaced.
    #[must_use]
    pub fn generation_requests(&self, graveyard: &[GraveyardEntry]) -> Vec<GenerationRequest> {
        if !self.context.side_effects_enabled() {
            return Vec::new();
        }

        let mut by_campaign: BTreeMap<&str, Vec<GenerationTarget>> = BTreeMap::new();
        for flag in &self.flagged {
            if let Some(target) = flag.generation_target() {
                by_campaign
                    .entry(flag.record.campaign_name.as_str())
                    .or_default()
                    .push(target);
            }
        }

        by_campaign
            .into_iter()
            .map(|(campaign, targets)| {
                let context = graveyard
                    .iter()
                    .filter(|g| g.campaign_name == campaign)
                    .filter(|g| !targets.iter().any(|t| t.asset_identity == g.asset_identity))
                    .cloned()
                    .collect();
                GenerationRequest {
                    campaign_name: campaign.to_string(),
                    targets,
                    graveyard: context,
                }
            })
            .collect()
    }

    /// Attach generated copy to text flags. Every text flag left without copy
    /// is marked `replacement_unavailable`; the decisions stand.
    ///
    /// The run counts as degraded only when the collaborator failed or left a
    /// requested asset uncovered. Text flags with no copy to replace are
    /// never requested and do not degrade the run.
    pub fn apply_generation(&mut self, result: GenerationResult) {
        if !self.context.side_effects_enabled() {
            return;
        }

        if let Some(error) = &result.error {
            tracing::warn!(
                error = %error,
                delivered = result.replacements.len(),
                "replacement generation failed"
            );
        }
        self.summary.generation_error = result.error;

        let mut by_identity: HashMap<String, ReplacementCopy> = result
            .replacements
            .into_iter()
            .map(|copy| (copy.asset_identity.clone(), copy))
            .collect();

        let mut unavailable = 0;
        let mut uncovered = 0;
        for flag in self.flagged.iter_mut().filter(|f| f.is_text()) {
            if let Some(copy) = by_identity.remove(&flag.record.identity) {
                flag.replacement = Some(copy);
                flag.replacement_unavailable = false;
                continue;
            }
            flag.replacement = None;
            flag.replacement_unavailable = true;
            unavailable += 1;
            if flag.record.asset_text.is_some() {
                uncovered += 1;
            }
        }

        self.summary.replacements_unavailable = unavailable;
        self.summary.generation_degraded = uncovered > 0 || self.summary.generation_error.is_some();
    }

    /// Graveyard entries for text flags, dated at the window end. Empty when
    /// side effects are disabled.
    #[must_use]
    pub fn graveyard_entries(&self) -> Vec<GraveyardEntry> {
        if !self.context.side_effects_enabled() {
            return Vec::new();
        }
        self.flagged
            .iter()
            .filter_map(|f| f.graveyard_entry(self.window.end))
            .collect()
    }

    /// Text flags for the spreadsheet-export collaborator. Images never appear.
    pub fn export_rows(&self) -> impl Iterator<Item = &FlaggedAsset> {
        self.flagged.iter().filter(|f| f.is_text())
    }
}

fn spend_issue(spend: &CampaignSpend) -> Option<&'static str> {
    if spend.spend < Decimal::ZERO || spend.revenue < Decimal::ZERO {
        return Some("negative spend or revenue");
    }
    if spend.current_daily_budget < Decimal::ZERO {
        return Some("negative daily budget");
    }
    if spend.spend > Decimal::ZERO && spend.roas().is_none() {
        return Some("ROAS not representable");
    }
    None
}

/// Keep well-formed spend rows for configured campaigns, one per campaign.
fn validate_spends(
    spends: &[CampaignSpend],
    config: &EngineConfig,
    issues: &mut Vec<ValidationIssue>,
) -> Vec<CampaignSpend> {
    let mut by_campaign: BTreeMap<&str, Vec<&CampaignSpend>> = BTreeMap::new();
    for s in spends {
        if config.campaigns.campaign(&s.campaign_name).is_none() {
            issues.push(ValidationIssue::new(
                None,
                &s.campaign_name,
                Some(s.week_ending),
                "campaign not configured",
            ));
            continue;
        }
        if let Some(reason) = spend_issue(s) {
            issues.push(ValidationIssue::new(
                None,
                &s.campaign_name,
                Some(s.week_ending),
                reason,
            ));
            continue;
        }
        by_campaign.entry(s.campaign_name.as_str()).or_default().push(s);
    }

    let mut valid = Vec::new();
    for (campaign, rows) in by_campaign {
        if let [only] = rows.as_slice() {
            valid.push((*only).clone());
        } else {
            issues.push(ValidationIssue::new(
                None,
                campaign,
                None,
                "multiple spend rows for campaign",
            ));
        }
    }
    valid
}

/// Run one weekly review over an immutable input snapshot.
///
/// Pure: performs no I/O. The caller persists the output, requests
/// generation, and delivers notifications.
///
/// # Errors
///
/// Returns [`EngineError::UpstreamData`] when the snapshot carries neither
/// metric rows nor spend rows.
pub fn run_review(
    input: &ReviewInput,
    ctx: &SeasonContext,
    config: &EngineConfig,
    window_days: u32,
) -> Result<ReviewOutput, EngineError> {
    if input.rows.is_empty() && input.spends.is_empty() {
        return Err(EngineError::UpstreamData(
            "snapshot contains no metric rows and no spend rows".to_string(),
        ));
    }

    let window = ReportWindow::new(ctx.date, window_days);
    let mut issues = Vec::new();

    let (known, unknown): (Vec<DailyMetricRow>, Vec<DailyMetricRow>) = input
        .rows
        .iter()
        .cloned()
        .partition(|r| config.campaigns.campaign(&r.campaign_name).is_some());
    for row in unknown {
        issues.push(ValidationIssue::new(
            row.identity(),
            &row.campaign_name,
            Some(row.date),
            "campaign not configured",
        ));
    }

    let aggregation = aggregate(&known, window);
    issues.extend(aggregation.issues);

    let (records, flagged) = classify(aggregation.records, ctx, &input.graveyard);

    let spends = validate_spends(&input.spends, config, &mut issues);
    let budgets: Vec<CampaignBudgetRecord> = spends
        .iter()
        .map(|s| advise(s, ctx, &config.thresholds.budget))
        .collect();

    let alerts = detect_alerts(
        &records,
        &input.prior_records,
        &spends,
        ctx,
        &config.thresholds.budget,
        &config.thresholds.alerts,
    );

    issues.sort();

    let count = |status: AssetStatus| records.iter().filter(|r| r.status == status).count();
    let summary = RunSummary {
        label: ctx.label(),
        season: ctx.season,
        mode: ctx.mode,
        preview: ctx.preview,
        window_end: window.end,
        rows_received: input.rows.len(),
        records: records.len(),
        kept: count(AssetStatus::Keep),
        flagged_text: flagged.iter().filter(|f| f.is_text()).count(),
        flagged_image: flagged.iter().filter(|f| !f.is_text()).count(),
        monitored: count(AssetStatus::Monitored),
        budget_actions: budgets
            .iter()
            .map(|b| (b.campaign_name.clone(), b.action))
            .collect(),
        alerts: alerts.len(),
        validation_issues: issues,
        generation_degraded: false,
        generation_error: None,
        replacements_unavailable: 0,
    };

    if !summary.validation_issues.is_empty() {
        tracing::warn!(
            skipped = summary.validation_issues.len(),
            "skipped invalid input rows"
        );
    }
    tracing::info!(
        label = %summary.label,
        records = summary.records,
        flagged_text = summary.flagged_text,
        flagged_image = summary.flagged_image,
        alerts = summary.alerts,
        "review complete"
    );

    Ok(ReviewOutput {
        context: ctx.clone(),
        window,
        records,
        flagged,
        budgets,
        alerts,
        summary,
    })
}

#[cfg(test)]
#[path = "review_test.rs"]
mod tests;
