//! Content-category distribution of a campaign's live images versus its profile.

use std::collections::BTreeMap;

use pmax_core::{
    CampaignImageProfile, ContentCategory, GapPolicy, ImageRegistryEntry, ProfileKind,
};
use serde::{Deserialize, Serialize};

/// Denominator floor for suggested upload counts on tiny image sets.
const MIN_SET_SIZE: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GapStatus {
    Under,
    OnTarget,
    Over,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryGap {
    pub category: ContentCategory,
    pub count: usize,
    pub actual_pct: f64,
    pub target_pct: f64,
    /// Target minus actual, in percentage points. Positive means under-represented.
    pub deficit: f64,
    pub status: GapStatus,
    /// Zero unless `status` is `Under`.
    pub suggested_uploads: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadCandidate {
    pub image_id: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapAnalysis {
    pub campaign_name: String,
    pub profile: ProfileKind,
    pub total_images: usize,
    /// Every category, largest deficit first.
    pub composition: Vec<CategoryGap>,
    /// Registry images not live in this campaign, per under-represented category.
    pub candidates: BTreeMap<ContentCategory, Vec<UploadCandidate>>,
}

impl GapAnalysis {
    /// Under-represented categories, largest deficit first.
    pub fn recommendations(&self) -> impl Iterator<Item = &CategoryGap> {
        self.composition
            .iter()
            .filter(|g| g.status == GapStatus::Under)
    }
}

#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn suggested_uploads(deficit: f64, total: usize) -> usize {
    let base = total.max(MIN_SET_SIZE) as f64;
    let raw = (deficit * base / 100.0).round();
    (raw.max(1.0)) as usize
}

/// Compare a campaign's live image mix against its target profile.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn analyze_gaps(
    campaign_name: &str,
    profile: &CampaignImageProfile,
    registry: &[ImageRegistryEntry],
    policy: &GapPolicy,
) -> GapAnalysis {
    let live: Vec<&ImageRegistryEntry> = registry
        .iter()
        .filter(|e| e.is_live_in(campaign_name))
        .collect();
    let total = live.len();

    let mut composition: Vec<CategoryGap> = ContentCategory::ALL
        .into_iter()
        .map(|category| {
            let count = live
                .iter()
                .filter(|e| e.content_category == category)
                .count();
            let actual_pct = if total == 0 {
                0.0
            } else {
                count as f64 * 100.0 / total as f64
            };
            let target_pct = profile.target_for(category);
            let deficit = target_pct - actual_pct;
            let status = if deficit > policy.tolerance_pp {
                GapStatus::Under
            } else if deficit < -policy.tolerance_pp {
                GapStatus::Over
            } else {
                GapStatus::OnTarget
            };
            CategoryGap {
                category,
                count,
                actual_pct,
                target_pct,
                deficit,
                status,
                suggested_uploads: if status == GapStatus::Under {
                    suggested_uploads(deficit, total)
                } else {
                    0
                },
            }
        })
        .collect();

    // Stable sort keeps the fixed category order for equal deficits.
    composition.sort_by(|a, b| b.deficit.total_cmp(&a.deficit));

    let mut candidates = BTreeMap::new();
    for gap in composition.iter().filter(|g| g.status == GapStatus::Under) {
        let mut pool: Vec<&ImageRegistryEntry> = registry
            .iter()
            .filter(|e| e.content_category == gap.category && !e.is_live_in(campaign_name))
            .collect();
        pool.sort_by(|a, b| {
            b.is_available()
                .cmp(&a.is_available())
                .then_with(|| a.image_id.cmp(&b.image_id))
        });
        let picks: Vec<UploadCandidate> = pool
            .into_iter()
            .take(policy.max_candidates)
            .map(|e| UploadCandidate {
                image_id: e.image_id.clone(),
                description: e.description.clone(),
            })
            .collect();
        if !picks.is_empty() {
            candidates.insert(gap.category, picks);
        }
    }

    tracing::info!(
        campaign = %campaign_name,
        total_images = total,
        under = composition.iter().filter(|g| g.status == GapStatus::Under).count(),
        "image gap analysis"
    );

    GapAnalysis {
        campaign_name: campaign_name.to_string(),
        profile: profile.kind,
        total_images: total,
        composition,
        candidates,
    }
}

#[cfg(test)]
#[path = "gap_test.rs"]
mod tests;
