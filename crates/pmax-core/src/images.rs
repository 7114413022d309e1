use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::metrics::AssetType;
use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentCategory {
    ProductHero,
    ProductDetail,
    ProductInUse,
    LifestyleWithProduct,
    LifestyleNoProduct,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 5] = [
        ContentCategory::ProductHero,
        ContentCategory::ProductDetail,
        ContentCategory::ProductInUse,
        ContentCategory::LifestyleWithProduct,
        ContentCategory::LifestyleNoProduct,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ContentCategory::ProductHero => "product_hero",
            ContentCategory::ProductDetail => "product_detail",
            ContentCategory::ProductInUse => "product_in_use",
            ContentCategory::LifestyleWithProduct => "lifestyle_with_product",
            ContentCategory::LifestyleNoProduct => "lifestyle_no_product",
        }
    }

    /// Human label, e.g. `"lifestyle with product"`.
    #[must_use]
    pub fn label(self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl std::fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContentCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| CoreError::UnknownValue {
                kind: "content category",
                value: s.to_string(),
            })
    }
}

/// Image placement slot on the ad platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ImageSlot {
    #[serde(rename = "MARKETING_IMAGE")]
    Landscape,
    #[serde(rename = "SQUARE_MARKETING_IMAGE")]
    Square,
    #[serde(rename = "PORTRAIT_MARKETING_IMAGE")]
    Portrait,
}

impl From<ImageSlot> for AssetType {
    fn from(slot: ImageSlot) -> Self {
        match slot {
            ImageSlot::Landscape => AssetType::MarketingImage,
            ImageSlot::Square => AssetType::SquareMarketingImage,
            ImageSlot::Portrait => AssetType::PortraitMarketingImage,
        }
    }
}

/// Link between a registry image and one live ad-platform asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdAssetMapping {
    pub campaign_name: String,
    pub asset_resource: String,
    pub slot: ImageSlot,
    /// Set once the asset is no longer live in the campaign.
    #[serde(default)]
    pub unlinked_on: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImagePerformance {
    pub window_end: NaiveDate,
    pub impressions: i64,
    pub clicks: i64,
    pub ctr: f64,
}

/// An analyzed image in the registry.
///
/// `content_category` and `eligible_slots` are fixed once analyzed; only
/// `mappings` and `performance` change from week to week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageRegistryEntry {
    pub image_id: String,
    pub content_category: ContentCategory,
    #[serde(default)]
    pub eligible_slots: Vec<ImageSlot>,
    #[serde(default)]
    pub mappings: Vec<AdAssetMapping>,
    /// Latest performance snapshot keyed by campaign name.
    #[serde(default)]
    pub performance: BTreeMap<String, ImagePerformance>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ImageRegistryEntry {
    /// `true` when the image has a mapping to `campaign_name` that has not
    /// been unlinked.
    #[must_use]
    pub fn is_live_in(&self, campaign_name: &str) -> bool {
        self.mappings
            .iter()
            .any(|m| m.campaign_name == campaign_name && m.unlinked_on.is_none())
    }

    /// `true` when no campaign currently uses the image.
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.mappings.iter().all(|m| m.unlinked_on.is_some())
    }

    /// Stamp `unlinked_on` on this campaign's linked mappings whose asset is
    /// not in `live_resources`. Returns how many mappings were unlinked.
    pub fn unlink_missing(
        &mut self,
        campaign_name: &str,
        live_resources: &HashSet<&str>,
        on: NaiveDate,
    ) -> usize {
        let mut unlinked = 0;
        for mapping in &mut self.mappings {
            if mapping.campaign_name == campaign_name
                && mapping.unlinked_on.is_none()
                && !live_resources.contains(mapping.asset_resource.as_str())
            {
                mapping.unlinked_on = Some(on);
                unlinked += 1;
            }
        }
        unlinked
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProfileKind {
    CoreBrand,
    ReplacementNet,
}

impl std::fmt::Display for ProfileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfileKind::CoreBrand => write!(f, "core-brand"),
            ProfileKind::ReplacementNet => write!(f, "replacement-net"),
        }
    }
}

/// Target share of each content category for a campaign type. Percentages sum to 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignImageProfile {
    pub kind: ProfileKind,
    pub targets: BTreeMap<ContentCategory, f64>,
}

impl CampaignImageProfile {
    /// Target percentage for `category`; categories absent from the profile target 0%.
    #[must_use]
    pub fn target_for(&self, category: ContentCategory) -> f64 {
        self.targets.get(&category).copied().unwrap_or(0.0)
    }
}
