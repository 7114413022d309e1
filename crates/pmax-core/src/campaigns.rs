use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::images::{CampaignImageProfile, ContentCategory, ProfileKind};
use crate::ConfigError;

const PROFILE_SUM_TOLERANCE: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignConfig {
    /// Campaign name exactly as the ad platform reports it.
    pub name: String,
    pub campaign_id: Option<String>,
    pub asset_group: Option<String>,
    pub image_profile: ProfileKind,
    pub notes: Option<String>,
}

impl CampaignConfig {
    /// Generate a URL-safe slug from the campaign name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.name
            .to_lowercase()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' {
                    c
                } else if c == ' ' || c == '_' {
                    '-'
                } else {
                    '\0'
                }
            })
            .filter(|&c| c != '\0')
            .collect::<String>()
            .split('-')
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("-")
    }
}

/// Target category percentages for each campaign type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageProfiles {
    pub core_brand: BTreeMap<ContentCategory, f64>,
    pub replacement_net: BTreeMap<ContentCategory, f64>,
}

impl ImageProfiles {
    #[must_use]
    pub fn profile(&self, kind: ProfileKind) -> CampaignImageProfile {
        let targets = match kind {
            ProfileKind::CoreBrand => &self.core_brand,
            ProfileKind::ReplacementNet => &self.replacement_net,
        };
        CampaignImageProfile {
            kind,
            targets: targets.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CampaignsFile {
    pub campaigns: Vec<CampaignConfig>,
    pub image_profiles: ImageProfiles,
}

impl CampaignsFile {
    /// Look up a campaign by exact name.
    #[must_use]
    pub fn campaign(&self, name: &str) -> Option<&CampaignConfig> {
        self.campaigns.iter().find(|c| c.name == name)
    }

    #[must_use]
    pub fn by_slug(&self, slug: &str) -> Option<&CampaignConfig> {
        self.campaigns.iter().find(|c| c.slug() == slug)
    }

    /// Image profile for a campaign, or `None` for unknown campaigns.
    #[must_use]
    pub fn profile_for(&self, campaign_name: &str) -> Option<CampaignImageProfile> {
        self.campaign(campaign_name)
            .map(|c| self.image_profiles.profile(c.image_profile))
    }
}

/// Load and validate the campaigns configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_campaigns(path: &Path) -> Result<CampaignsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let campaigns_file: CampaignsFile =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    validate_campaigns(&campaigns_file)?;

    Ok(campaigns_file)
}

fn validate_campaigns(campaigns_file: &CampaignsFile) -> Result<(), ConfigError> {
    if campaigns_file.campaigns.is_empty() {
        return Err(ConfigError::Validation(
            "at least one campaign must be configured".to_string(),
        ));
    }

    let mut seen_names = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for campaign in &campaigns_file.campaigns {
        if campaign.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "campaign name must be non-empty".to_string(),
            ));
        }

        let lower_name = campaign.name.to_lowercase();
        if !seen_names.insert(lower_name) {
            return Err(ConfigError::Validation(format!(
                "duplicate campaign name: '{}'",
                campaign.name
            )));
        }

        let slug = campaign.slug();
        if !seen_slugs.insert(slug.clone()) {
            return Err(ConfigError::Validation(format!(
                "duplicate campaign slug: '{}' (from campaign '{}')",
                slug, campaign.name
            )));
        }
    }

    for kind in [ProfileKind::CoreBrand, ProfileKind::ReplacementNet] {
        validate_profile(&campaigns_file.image_profiles.profile(kind))?;
    }

    Ok(())
}

fn validate_profile(profile: &CampaignImageProfile) -> Result<(), ConfigError> {
    if let Some((category, pct)) = profile
        .targets
        .iter()
        .find(|(_, pct)| !pct.is_finite() || **pct < 0.0)
    {
        return Err(ConfigError::Validation(format!(
            "image profile '{}' has invalid target {pct} for {category}",
            profile.kind
        )));
    }

    let total: f64 = profile.targets.values().sum();
    if (total - 100.0).abs() > PROFILE_SUM_TOLERANCE {
        return Err(ConfigError::Validation(format!(
            "image profile '{}' targets sum to {total}, expected 100",
            profile.kind
        )));
    }

    Ok(())
}

#[cfg(test)]
#[path = "campaigns_test.rs"]
mod tests;
