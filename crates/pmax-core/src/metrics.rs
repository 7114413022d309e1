use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::CoreError;

/// Ad-platform asset field type. Text types carry per-season CTR floors;
/// image slots share the flat image floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetType {
    Headline,
    LongHeadline,
    Description,
    MarketingImage,
    SquareMarketingImage,
    PortraitMarketingImage,
}

impl AssetType {
    #[must_use]
    pub fn is_image(self) -> bool {
        matches!(
            self,
            AssetType::MarketingImage
                | AssetType::SquareMarketingImage
                | AssetType::PortraitMarketingImage
        )
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssetType::Headline => "HEADLINE",
            AssetType::LongHeadline => "LONG_HEADLINE",
            AssetType::Description => "DESCRIPTION",
            AssetType::MarketingImage => "MARKETING_IMAGE",
            AssetType::SquareMarketingImage => "SQUARE_MARKETING_IMAGE",
            AssetType::PortraitMarketingImage => "PORTRAIT_MARKETING_IMAGE",
        }
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "HEADLINE" => Ok(AssetType::Headline),
            "LONG_HEADLINE" => Ok(AssetType::LongHeadline),
            "DESCRIPTION" => Ok(AssetType::Description),
            "MARKETING_IMAGE" => Ok(AssetType::MarketingImage),
            "SQUARE_MARKETING_IMAGE" => Ok(AssetType::SquareMarketingImage),
            "PORTRAIT_MARKETING_IMAGE" => Ok(AssetType::PortraitMarketingImage),
            other => Err(CoreError::UnknownValue {
                kind: "asset type",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetStatus {
    Keep,
    Flag,
    Monitored,
}

impl AssetStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AssetStatus::Keep => "KEEP",
            AssetStatus::Flag => "FLAG",
            AssetStatus::Monitored => "MONITORED",
        }
    }
}

impl std::fmt::Display for AssetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AssetStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "KEEP" => Ok(AssetStatus::Keep),
            "FLAG" => Ok(AssetStatus::Flag),
            "MONITORED" => Ok(AssetStatus::Monitored),
            other => Err(CoreError::UnknownValue {
                kind: "asset status",
                value: other.to_string(),
            }),
        }
    }
}

/// One day of platform metrics for one asset, as delivered by the collector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetricRow {
    /// Platform asset id for text assets.
    #[serde(default)]
    pub asset_id: Option<String>,
    /// Stable image resource name, e.g. `customers/1/assets/99`.
    #[serde(default)]
    pub asset_resource: Option<String>,
    #[serde(default)]
    pub asset_text: Option<String>,
    pub asset_type: AssetType,
    pub campaign_name: String,
    pub date: NaiveDate,
    pub impressions: i64,
    pub clicks: i64,
    pub cost: Decimal,
    #[serde(default)]
    pub conversions: Decimal,
}

impl DailyMetricRow {
    /// Stable grouping identity: the resource id for images, the asset id for
    /// text, falling back to a hash of text and campaign when the id is absent.
    #[must_use]
    pub fn identity(&self) -> Option<String> {
        let non_empty = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };

        if self.asset_type.is_image() {
            return non_empty(&self.asset_resource);
        }

        non_empty(&self.asset_id).or_else(|| {
            non_empty(&self.asset_text).map(|text| asset_identity(&text, &self.campaign_name))
        })
    }
}

/// Deterministic 16-hex-char identity for a text asset within a campaign.
#[must_use]
pub fn asset_identity(asset_text: &str, campaign_name: &str) -> String {
    let mut hex = format!(
        "{:x}",
        Sha256::digest(format!("{asset_text}|{campaign_name}").as_bytes())
    );
    hex.truncate(16);
    hex
}

/// Click-through rate as a percentage; `0.0` when there were no impressions.
#[must_use]
pub fn ctr_percent(clicks: i64, impressions: i64) -> f64 {
    if impressions <= 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let ctr = (clicks as f64 * 100.0) / impressions as f64;
    ctr
}

/// Weekly per-asset totals. Unique per `(identity, window_end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetMetricRecord {
    pub identity: String,
    pub window_end: NaiveDate,
    pub campaign_name: String,
    pub asset_type: AssetType,
    pub asset_text: Option<String>,
    pub impressions: i64,
    pub clicks: i64,
    pub cost: Decimal,
    pub conversions: Decimal,
    /// Percentage, e.g. `1.5` for 1.5%.
    pub ctr: f64,
    pub status: AssetStatus,
}

/// Removed ad copy kept as context for future replacement generation.
/// Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraveyardEntry {
    pub campaign_name: String,
    pub date_killed: NaiveDate,
    pub asset_identity: String,
    pub asset_type: AssetType,
    pub original_copy: String,
    pub kill_reason: String,
    pub impressions: i64,
    pub clicks: i64,
    pub ctr: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(asset_id: Option<&str>, text: Option<&str>) -> DailyMetricRow {
        DailyMetricRow {
            asset_id: asset_id.map(str::to_string),
            asset_resource: None,
            asset_text: text.map(str::to_string),
            asset_type: AssetType::Headline,
            campaign_name: "Core Brand".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 6, 1).unwrap(),
            impressions: 100,
            clicks: 3,
            cost: Decimal::new(125, 2),
            conversions: Decimal::ZERO,
        }
    }

    #[test]
    fn ctr_is_zero_without_impressions() {
        assert_eq!(ctr_percent(5, 0), 0.0);
    }

    #[test]
    fn ctr_is_a_percentage() {
        assert!((ctr_percent(15, 1000) - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn asset_identity_is_stable_and_short() {
        let a = asset_identity("Nets Built To Last", "Core Brand");
        let b = asset_identity("Nets Built To Last", "Core Brand");
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
        assert_ne!(a, asset_identity("Nets Built To Last", "Replacement Nets"));
    }

    #[test]
    fn asset_identity_is_sha256_prefix() {
        assert_eq!(
            asset_identity("Best Nets Ever", "Core Brand"),
            "0d94a8aa1cae10bb"
        );
    }

    #[test]
    fn text_identity_prefers_asset_id() {
        let row = text_row(Some("12345"), Some("Hello"));
        assert_eq!(row.identity().as_deref(), Some("12345"));
    }

    #[test]
    fn text_identity_falls_back_to_hash() {
        let row = text_row(None, Some("Hello"));
        assert_eq!(row.identity(), Some(asset_identity("Hello", "Core Brand")));
    }

    #[test]
    fn image_identity_requires_resource() {
        let mut row = text_row(Some("12345"), None);
        row.asset_type = AssetType::SquareMarketingImage;
        assert!(row.identity().is_none());
        row.asset_resource = Some("customers/1/assets/77".to_string());
        assert_eq!(row.identity().as_deref(), Some("customers/1/assets/77"));
    }

    #[test]
    fn asset_type_round_trips_through_str() {
        for t in [
            AssetType::Headline,
            AssetType::LongHeadline,
            AssetType::Description,
            AssetType::MarketingImage,
            AssetType::SquareMarketingImage,
            AssetType::PortraitMarketingImage,
        ] {
            assert_eq!(t.as_str().parse::<AssetType>().unwrap(), t);
        }
        assert!("SITELINK".parse::<AssetType>().is_err());
    }
}
