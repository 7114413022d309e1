//! Did last week's recommendations reach the ad platform?

use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use pmax_core::{AssetType, ImageRegistryEntry};
use serde::{Deserialize, Serialize};

use crate::classify::word_overlap;

/// Share of a replacement's words a live asset must carry to count as an
/// edited upload of it.
const MANUAL_EDIT_OVERLAP: f64 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerificationStatus {
    /// The flagged asset is gone or its content changed.
    Verified,
    /// The flagged asset is still live and unchanged.
    NotUploaded,
}

impl VerificationStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            VerificationStatus::Verified => "VERIFIED",
            VerificationStatus::NotUploaded => "NOT_UPLOADED",
        }
    }
}

impl std::fmt::Display for VerificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReplacementStatus {
    Added,
    Edited,
    Missing,
}

/// A stored FLAG decision from a prior review.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorFlag {
    pub identity: String,
    pub window_end: NaiveDate,
    pub campaign_name: String,
    pub asset_type: AssetType,
    pub asset_text: Option<String>,
    /// Generated copy recorded alongside the flag, if any.
    pub replacement_text: Option<String>,
}

/// One asset currently serving, per the fresh collector snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiveAsset {
    pub campaign_name: String,
    pub asset_type: AssetType,
    /// Asset id for text, resource name for images.
    pub identity: String,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub identity: String,
    pub window_end: NaiveDate,
    pub campaign_name: String,
    pub status: VerificationStatus,
    pub replacement: Option<ReplacementStatus>,
    /// Live text that matched the replacement when it was edited before upload.
    pub matched_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub outcomes: Vec<VerificationOutcome>,
}

impl VerificationReport {
    #[must_use]
    pub fn count(&self, status: VerificationStatus) -> usize {
        self.outcomes.iter().filter(|o| o.status == status).count()
    }

    #[must_use]
    pub fn replacement_count(&self, status: ReplacementStatus) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.replacement == Some(status))
            .count()
    }

    /// `true` when every flag was acted on and every replacement went live.
    #[must_use]
    pub fn all_applied(&self) -> bool {
        self.outcomes.iter().all(|o| {
            o.status == VerificationStatus::Verified
                && o.replacement != Some(ReplacementStatus::Missing)
        })
    }
}

fn same_text(a: Option<&str>, b: Option<&str>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.trim() == b.trim(),
        (None, _) | (_, None) => true,
    }
}

fn still_live(flag: &PriorFlag, live: &[LiveAsset]) -> bool {
    let in_campaign = live.iter().filter(|a| a.campaign_name == flag.campaign_name);

    for asset in in_campaign {
        if asset.identity == flag.identity
            && same_text(flag.asset_text.as_deref(), asset.text.as_deref())
        {
            return true;
        }
        if !flag.asset_type.is_image() {
            if let (Some(flag_text), Some(live_text)) = (&flag.asset_text, &asset.text) {
                if flag_text.trim() == live_text.trim() {
                    return true;
                }
            }
        }
    }
    false
}

fn replacement_status(
    replacement: &str,
    campaign_name: &str,
    live: &[LiveAsset],
) -> (ReplacementStatus, Option<String>) {
    let texts: Vec<&str> = live
        .iter()
        .filter(|a| a.campaign_name == campaign_name)
        .filter_map(|a| a.text.as_deref())
        .collect();

    if texts.iter().any(|t| t.trim() == replacement.trim()) {
        return (ReplacementStatus::Added, None);
    }
    if let Some(found) = texts
        .iter()
        .find(|t| word_overlap(replacement, t) >= MANUAL_EDIT_OVERLAP)
    {
        return (ReplacementStatus::Edited, Some((*found).to_string()));
    }
    (ReplacementStatus::Missing, None)
}

/// Diff prior FLAG decisions against the live snapshot.
#[must_use]
pub fn compare(prior: &[PriorFlag], live: &[LiveAsset]) -> VerificationReport {
    let outcomes = prior
        .iter()
        .map(|flag| {
            let status = if still_live(flag, live) {
                VerificationStatus::NotUploaded
            } else {
                VerificationStatus::Verified
            };
            let (replacement, matched_text) = match flag.replacement_text.as_deref() {
                Some(text) => {
                    let (s, m) = replacement_status(text, &flag.campaign_name, live);
                    (Some(s), m)
                }
                None => (None, None),
            };
            VerificationOutcome {
                identity: flag.identity.clone(),
                window_end: flag.window_end,
                campaign_name: flag.campaign_name.clone(),
                status,
                replacement,
                matched_text,
            }
        })
        .collect();

    let report = VerificationReport { outcomes };
    tracing::info!(
        verified = report.count(VerificationStatus::Verified),
        not_uploaded = report.count(VerificationStatus::NotUploaded),
        "verification compared"
    );
    report
}

/// Registry entries whose mappings changed after unlinking every image no
/// longer live in its campaign.
///
/// Only campaigns with at least one live image in the snapshot are
/// reconciled, so a campaign the collector skipped is left alone.
#[must_use]
pub fn reconcile_registry(
    registry: &[ImageRegistryEntry],
    live: &[LiveAsset],
    on: NaiveDate,
) -> Vec<ImageRegistryEntry> {
    let mut live_by_campaign: BTreeMap<&str, HashSet<&str>> = BTreeMap::new();
    for asset in live.iter().filter(|a| a.asset_type.is_image()) {
        live_by_campaign
            .entry(asset.campaign_name.as_str())
            .or_default()
            .insert(asset.identity.as_str());
    }

    let mut changed = Vec::new();
    for entry in registry {
        let mut updated = entry.clone();
        let unlinked: usize = live_by_campaign
            .iter()
            .map(|(campaign, resources)| updated.unlink_missing(campaign, resources, on))
            .sum();
        if unlinked > 0 {
            tracing::info!(image_id = %entry.image_id, unlinked, "unlinked stale image mappings");
            changed.push(updated);
        }
    }
    changed
}
