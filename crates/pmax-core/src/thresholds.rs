//! Seasonal thresholds and decision ratios, loaded from `thresholds.yaml`.

use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::metrics::AssetType;
use crate::season::Season;
use crate::ConfigError;

/// Minimum CTR percentages for the three text asset types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextCtrFloors {
    pub headline: f64,
    pub long_headline: f64,
    pub description: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonBudget {
    pub recommended_daily: Decimal,
    pub max_daily: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonThresholds {
    /// Eligibility floor: below this, assets are only monitored.
    pub min_impressions: i64,
    pub min_ctr: TextCtrFloors,
    pub lookback_days: u32,
    /// Overrides the break-even ROAS for this season.
    #[serde(default)]
    pub target_roas: Option<Decimal>,
    pub budget: SeasonBudget,
}

impl SeasonThresholds {
    /// CTR floor for a text asset type; `None` for image slots.
    #[must_use]
    pub fn min_ctr_for(&self, asset_type: AssetType) -> Option<f64> {
        match asset_type {
            AssetType::Headline => Some(self.min_ctr.headline),
            AssetType::LongHeadline => Some(self.min_ctr.long_headline),
            AssetType::Description => Some(self.min_ctr.description),
            AssetType::MarketingImage
            | AssetType::SquareMarketingImage
            | AssetType::PortraitMarketingImage => None,
        }
    }
}

/// One entry per season, so lookups are total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonTable {
    pub deep_winter: SeasonThresholds,
    pub shoulder: SeasonThresholds,
    pub peak: SeasonThresholds,
    pub low_season: SeasonThresholds,
}

impl SeasonTable {
    #[must_use]
    pub fn get(&self, season: Season) -> &SeasonThresholds {
        match season {
            Season::DeepWinter => &self.deep_winter,
            Season::Shoulder => &self.shoulder,
            Season::Peak => &self.peak,
            Season::LowSeason => &self.low_season,
        }
    }
}

/// Ratios driving the ROAS budget tiers. All are fractions, not percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetPolicy {
    pub gross_margin: Decimal,
    /// ROAS below `target * pause_ratio` pauses to the maintenance floor.
    pub pause_ratio: Decimal,
    /// ROAS below `target * decrease_ratio` cuts the budget.
    pub decrease_ratio: Decimal,
    /// ROAS above `target * increase_ratio` scales the budget up.
    pub increase_ratio: Decimal,
    pub step_fraction: Decimal,
    pub maintenance_floor: Decimal,
    pub ceiling_utilization: Decimal,
    pub ceiling_min_budget: Decimal,
    pub runaway_multiplier: Decimal,
}

impl BudgetPolicy {
    /// Break-even ROAS, `1 / gross_margin`.
    #[must_use]
    pub fn break_even_roas(&self) -> Decimal {
        if self.gross_margin <= Decimal::ZERO {
            return Decimal::ONE;
        }
        Decimal::ONE / self.gross_margin
    }
}

impl Default for BudgetPolicy {
    fn default() -> Self {
        Self {
            gross_margin: Decimal::new(64, 2),
            pause_ratio: Decimal::new(70, 2),
            decrease_ratio: Decimal::new(90, 2),
            increase_ratio: Decimal::new(110, 2),
            step_fraction: Decimal::new(20, 2),
            maintenance_floor: Decimal::from(10),
            ceiling_utilization: Decimal::new(80, 2),
            ceiling_min_budget: Decimal::from(100),
            runaway_multiplier: Decimal::from(2),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertPolicy {
    /// Fractional week-over-week CTR drop that counts as a collapse.
    pub ctr_collapse_drop: f64,
}

impl Default for AlertPolicy {
    fn default() -> Self {
        Self {
            ctr_collapse_drop: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GapPolicy {
    /// Percentage points below target before a category counts as under-represented.
    pub tolerance_pp: f64,
    pub max_candidates: usize,
}

impl Default for GapPolicy {
    fn default() -> Self {
        Self {
            tolerance_pp: 5.0,
            max_candidates: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdsConfig {
    pub seasons: SeasonTable,
    /// Flat CTR floor for every image slot in every season.
    pub image_min_ctr: f64,
    #[serde(default)]
    pub budget: BudgetPolicy,
    #[serde(default)]
    pub alerts: AlertPolicy,
    #[serde(default)]
    pub gaps: GapPolicy,
}

fn season_defaults(
    min_impressions: i64,
    ctr: (f64, f64, f64),
    lookback_days: u32,
    budget: (i64, i64),
) -> SeasonThresholds {
    SeasonThresholds {
        min_impressions,
        min_ctr: TextCtrFloors {
            headline: ctr.0,
            long_headline: ctr.1,
            description: ctr.2,
        },
        lookback_days,
        target_roas: None,
        budget: SeasonBudget {
            recommended_daily: Decimal::from(budget.0),
            max_daily: Decimal::from(budget.1),
        },
    }
}

impl Default for ThresholdsConfig {
    fn default() -> Self {
        Self {
            seasons: SeasonTable {
                deep_winter: season_defaults(150, (2.0, 1.0, 3.0), 60, (10, 30)),
                shoulder: season_defaults(300, (3.0, 2.0, 4.0), 30, (100, 300)),
                peak: season_defaults(500, (4.0, 2.5, 5.0), 30, (150, 900)),
                low_season: season_defaults(150, (2.0, 1.0, 3.0), 60, (30, 75)),
            },
            image_min_ctr: 1.0,
            budget: BudgetPolicy::default(),
            alerts: AlertPolicy::default(),
            gaps: GapPolicy::default(),
        }
    }
}

/// Load and validate thresholds from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_thresholds(path: &Path) -> Result<ThresholdsConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: ThresholdsConfig =
        serde_yaml::from_str(&content).map_err(|e| ConfigError::FileParse {
            path: path.display().to_string(),
            source: e,
        })?;

    validate_thresholds(&config)?;
    Ok(config)
}

fn validate_thresholds(config: &ThresholdsConfig) -> Result<(), ConfigError> {
    for season in Season::ALL {
        let t = config.seasons.get(season);
        let name = season.key();

        if t.min_impressions < 0 {
            return Err(ConfigError::Validation(format!(
                "season '{name}' has negative min_impressions"
            )));
        }

        for (label, value) in [
            ("headline", t.min_ctr.headline),
            ("long_headline", t.min_ctr.long_headline),
            ("description", t.min_ctr.description),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Validation(format!(
                    "season '{name}' has invalid min_ctr.{label}: {value}"
                )));
            }
        }

        if t.lookback_days == 0 || t.lookback_days > 90 {
            return Err(ConfigError::Validation(format!(
                "season '{name}' lookback_days must be between 1 and 90, got {}",
                t.lookback_days
            )));
        }

        if t.target_roas.is_some_and(|r| r <= Decimal::ZERO) {
            return Err(ConfigError::Validation(format!(
                "season '{name}' target_roas must be positive"
            )));
        }

        if t.budget.recommended_daily > t.budget.max_daily {
            return Err(ConfigError::Validation(format!(
                "season '{name}' recommended_daily exceeds max_daily"
            )));
        }
    }

    if !config.image_min_ctr.is_finite() || config.image_min_ctr < 0.0 {
        return Err(ConfigError::Validation(
            "image_min_ctr must be a non-negative percentage".to_string(),
        ));
    }

    let b = &config.budget;
    if b.gross_margin <= Decimal::ZERO || b.gross_margin > Decimal::ONE {
        return Err(ConfigError::Validation(
            "budget.gross_margin must be in (0, 1]".to_string(),
        ));
    }
    if !(Decimal::ZERO < b.pause_ratio
        && b.pause_ratio < b.decrease_ratio
        && b.decrease_ratio < Decimal::ONE
        && Decimal::ONE < b.increase_ratio)
    {
        return Err(ConfigError::Validation(
            "budget ratios must satisfy 0 < pause < decrease < 1 < increase".to_string(),
        ));
    }
    if b.step_fraction <= Decimal::ZERO || b.step_fraction >= Decimal::ONE {
        return Err(ConfigError::Validation(
            "budget.step_fraction must be in (0, 1)".to_string(),
        ));
    }
    if b.maintenance_floor < Decimal::ZERO || b.ceiling_min_budget < Decimal::ZERO {
        return Err(ConfigError::Validation(
            "budget floors must not be negative".to_string(),
        ));
    }
    if b.ceiling_utilization <= Decimal::ZERO || b.ceiling_utilization > Decimal::ONE {
        return Err(ConfigError::Validation(
            "budget.ceiling_utilization must be in (0, 1]".to_string(),
        ));
    }
    if b.runaway_multiplier < Decimal::ONE {
        return Err(ConfigError::Validation(
            "budget.runaway_multiplier must be at least 1".to_string(),
        ));
    }

    let drop = config.alerts.ctr_collapse_drop;
    if !(drop > 0.0 && drop < 1.0) {
        return Err(ConfigError::Validation(format!(
            "alerts.ctr_collapse_drop must be in (0, 1), got {drop}"
        )));
    }

    if !config.gaps.tolerance_pp.is_finite() || config.gaps.tolerance_pp < 0.0 {
        return Err(ConfigError::Validation(
            "gaps.tolerance_pp must be a non-negative number".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_thresholds(&ThresholdsConfig::default()).is_ok());
    }

    #[test]
    fn break_even_roas_at_64_percent_margin() {
        let policy = BudgetPolicy::default();
        assert_eq!(policy.break_even_roas(), Decimal::new(15625, 4));
    }

    #[test]
    fn image_slots_have_no_text_floor() {
        let config = ThresholdsConfig::default();
        assert!(config
            .seasons
            .peak
            .min_ctr_for(AssetType::MarketingImage)
            .is_none());
        assert_eq!(
            config.seasons.peak.min_ctr_for(AssetType::Headline),
            Some(4.0)
        );
    }

    #[test]
    fn rejects_unordered_ratios() {
        let mut config = ThresholdsConfig::default();
        config.budget.decrease_ratio = Decimal::new(60, 2);
        let err = validate_thresholds(&config).unwrap_err();
        assert!(err.to_string().contains("pause < decrease"));
    }

    #[test]
    fn rejects_negative_ctr_floor() {
        let mut config = ThresholdsConfig::default();
        config.seasons.shoulder.min_ctr.description = -1.0;
        let err = validate_thresholds(&config).unwrap_err();
        assert!(err.to_string().contains("shoulder"));
    }

    #[test]
    fn rejects_zero_lookback() {
        let mut config = ThresholdsConfig::default();
        config.seasons.low_season.lookback_days = 0;
        assert!(validate_thresholds(&config).is_err());
    }

    #[test]
    fn missing_season_fails_to_parse() {
        let yaml = r#"
seasons:
  deep_winter:
    min_impressions: 150
    min_ctr: { headline: 2.0, long_headline: 1.0, description: 3.0 }
    lookback_days: 60
    budget: { recommended_daily: "10", max_daily: "30" }
image_min_ctr: 1.0
"#;
        let parsed: Result<ThresholdsConfig, _> = serde_yaml::from_str(yaml);
        assert!(parsed.is_err());
    }

    #[test]
    fn load_thresholds_from_real_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("config")
            .join("thresholds.yaml");
        let config = load_thresholds(&path).expect("thresholds.yaml should load");
        assert_eq!(config, ThresholdsConfig::default());
    }
}
