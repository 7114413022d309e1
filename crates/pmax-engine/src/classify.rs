//! Season-gated KEEP / FLAG / MONITORED decisions and failure diagnosis.

use std::collections::HashSet;

use chrono::NaiveDate;
use pmax_core::{
    AssetMetricRecord, AssetStatus, AssetType, GenerationTarget, GraveyardEntry,
    ReplacementCopy, SeasonContext,
};
use serde::{Deserialize, Serialize};

const HYPE_PHRASES: [&str; 8] = [
    "innovative",
    "premier",
    "top-of-the-line",
    "unmatched",
    "experience",
    "destination",
    "serious anglers",
    "monsters",
];

const GATEKEEPING_WORDS: [&str; 5] = ["serious", "elite", "professional", "expert", "advanced"];

/// Share of a flagged asset's words found in a graveyard entry above which
/// the asset counts as a repeat of killed copy.
const GRAVEYARD_OVERLAP: f64 = 0.5;

/// What a human (or collaborator) should do about a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlagFollowUp {
    /// Text asset: request replacement copy and bury the original.
    ReplaceCopy,
    /// Image asset: swap the creative by hand. No generation, no graveyard.
    ManualImageReview,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlaggedAsset {
    pub record: AssetMetricRecord,
    pub reason: String,
    pub diagnosis: String,
    pub follow_up: FlagFollowUp,
    /// Generated copy, when the generation collaborator delivered one.
    #[serde(default)]
    pub replacement: Option<ReplacementCopy>,
    /// Set when generation was requested but produced nothing for this asset.
    #[serde(default)]
    pub replacement_unavailable: bool,
}

impl FlaggedAsset {
    #[must_use]
    pub fn is_text(&self) -> bool {
        self.follow_up == FlagFollowUp::ReplaceCopy
    }

    /// Manual-action note for image flags.
    #[must_use]
    pub fn manual_note(&self) -> Option<String> {
        match self.follow_up {
            FlagFollowUp::ReplaceCopy => None,
            FlagFollowUp::ManualImageReview => Some(format!(
                "Replace {} {} in '{}' by hand: {}",
                self.record.asset_type, self.record.identity, self.record.campaign_name, self.reason
            )),
        }
    }

    /// Generation request entry; `None` for images or text without copy.
    #[must_use]
    pub fn generation_target(&self) -> Option<GenerationTarget> {
        if !self.is_text() {
            return None;
        }
        let original_copy = self.record.asset_text.clone()?;
        Some(GenerationTarget {
            asset_identity: self.record.identity.clone(),
            asset_type: self.record.asset_type,
            original_copy,
            kill_reason: self.reason.clone(),
            diagnosis: self.diagnosis.clone(),
        })
    }

    /// Graveyard record for a text flag; `None` for images or text without copy.
    #[must_use]
    pub fn graveyard_entry(&self, date_killed: NaiveDate) -> Option<GraveyardEntry> {
        if !self.is_text() {
            return None;
        }
        let original_copy = self.record.asset_text.clone()?;
        Some(GraveyardEntry {
            campaign_name: self.record.campaign_name.clone(),
            date_killed,
            asset_identity: self.record.identity.clone(),
            asset_type: self.record.asset_type,
            original_copy,
            kill_reason: self.reason.clone(),
            impressions: self.record.impressions,
            clicks: self.record.clicks,
            ctr: self.record.ctr,
        })
    }
}

/// Status and FLAG reason for one record.
fn decide(record: &AssetMetricRecord, ctx: &SeasonContext) -> (AssetStatus, Option<String>) {
    if !ctx.analysis_enabled() || record.impressions < ctx.thresholds.min_impressions {
        return (AssetStatus::Monitored, None);
    }

    let threshold = if record.asset_type.is_image() {
        ctx.image_min_ctr
    } else {
        match ctx.thresholds.min_ctr_for(record.asset_type) {
            Some(t) => t,
            None => return (AssetStatus::Monitored, None),
        }
    };

    if record.ctr < threshold {
        let reason = format!("CTR {:.2}% < {:.2}%", record.ctr, threshold);
        (AssetStatus::Flag, Some(reason))
    } else {
        (AssetStatus::Keep, None)
    }
}

fn words(text: &str) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Fraction of `subject`'s words that also appear in `other`.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn word_overlap(subject: &str, other: &str) -> f64 {
    let subject_words = words(subject);
    let other_words = words(other);
    if subject_words.is_empty() || other_words.is_empty() {
        return 0.0;
    }
    let shared = subject_words.intersection(&other_words).count();
    shared as f64 / subject_words.len() as f64
}

/// Short failure category plus explanation, used as generation context.
///
/// An asset's own graveyard entries never count as prior killed copy.
#[must_use]
pub fn diagnose(record: &AssetMetricRecord, graveyard: &[GraveyardEntry]) -> String {
    if record.asset_type.is_image() {
        return "visual_fatigue: Image underperforming. Consider replacing with fresh creative."
            .to_string();
    }

    let text = record.asset_text.as_deref().unwrap_or_default().to_lowercase();

    if let Some(phrase) = HYPE_PHRASES.iter().find(|p| text.contains(**p)) {
        return format!("voice: Contains hype language ('{phrase}'). Keep the voice calm and direct.");
    }

    if record.asset_type == AssetType::LongHeadline && text.split_whitespace().count() <= 2 {
        return "specificity: Too short for a long headline. Needs concrete detail.".to_string();
    }

    if let Some(word) = GATEKEEPING_WORDS.iter().find(|w| text.contains(**w)) {
        return format!("voice: Gatekeeping language ('{word}'). Keep it inclusive.");
    }

    if let Some(grave) = graveyard
        .iter()
        .filter(|g| g.campaign_name == record.campaign_name)
        .filter(|g| g.asset_identity != record.identity)
        .find(|g| word_overlap(&text, &g.original_copy) > GRAVEYARD_OVERLAP)
    {
        return format!(
            "angle: Similar to previously killed copy '{}'. Try a different approach.",
            grave.original_copy
        );
    }

    "angle: Low engagement. Try a more direct, product-focused approach.".to_string()
}

/// Classify every record, returning them with final statuses plus the FLAG subset.
#[must_use]
pub fn classify(
    records: Vec<AssetMetricRecord>,
    ctx: &SeasonContext,
    graveyard: &[GraveyardEntry],
) -> (Vec<AssetMetricRecord>, Vec<FlaggedAsset>) {
    let mut classified = Vec::with_capacity(records.len());
    let mut flagged = Vec::new();

    for mut record in records {
        let (status, reason) = decide(&record, ctx);
        record.status = status;

        if let Some(reason) = reason {
            let follow_up = if record.asset_type.is_image() {
                FlagFollowUp::ManualImageReview
            } else {
                FlagFollowUp::ReplaceCopy
            };
            tracing::info!(
                identity = %record.identity,
                campaign = %record.campaign_name,
                asset_type = %record.asset_type,
                reason = %reason,
                "flagged asset"
            );
            flagged.push(FlaggedAsset {
                diagnosis: diagnose(&record, graveyard),
                record: record.clone(),
                reason,
                follow_up,
                replacement: None,
                replacement_unavailable: false,
            });
        }

        classified.push(record);
    }

    tracing::info!(
        season = %ctx.season,
        mode = %ctx.mode,
        records = classified.len(),
        flagged = flagged.len(),
        "classified assets"
    );

    (classified, flagged)
}

#[cfg(test)]
#[path = "classify_test.rs"]
mod tests;
