//! Calendar to season mapping, resolved once per run.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::thresholds::{SeasonBudget, SeasonThresholds, ThresholdsConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Season {
    DeepWinter,
    Shoulder,
    Peak,
    LowSeason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeasonMode {
    /// Tracking and alerting only; no flagging or generation.
    MonitorOnly,
    Active,
}

impl Season {
    pub const ALL: [Season; 4] = [
        Season::DeepWinter,
        Season::Shoulder,
        Season::Peak,
        Season::LowSeason,
    ];

    /// Season for a calendar month (1-12). Months outside that range fall
    /// into Low Season so the mapping stays total.
    #[must_use]
    pub fn for_month(month: u32) -> Season {
        match month {
            1 | 2 => Season::DeepWinter,
            3 | 4 | 9 | 10 => Season::Shoulder,
            5..=8 => Season::Peak,
            _ => Season::LowSeason,
        }
    }

    #[must_use]
    pub fn for_date(date: NaiveDate) -> Season {
        Season::for_month(date.month())
    }

    #[must_use]
    pub fn mode(self) -> SeasonMode {
        match self {
            Season::DeepWinter | Season::LowSeason => SeasonMode::MonitorOnly,
            Season::Shoulder | Season::Peak => SeasonMode::Active,
        }
    }

    /// Config key, e.g. `deep_winter`.
    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            Season::DeepWinter => "deep_winter",
            Season::Shoulder => "shoulder",
            Season::Peak => "peak",
            Season::LowSeason => "low_season",
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Season::DeepWinter => "Deep Winter",
            Season::Shoulder => "Shoulder",
            Season::Peak => "Peak",
            Season::LowSeason => "Low Season",
        };
        f.write_str(name)
    }
}

impl std::fmt::Display for SeasonMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeasonMode::MonitorOnly => write!(f, "monitor-only"),
            SeasonMode::Active => write!(f, "active"),
        }
    }
}

/// Immutable per-run season state handed to every downstream component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonContext {
    pub date: NaiveDate,
    pub season: Season,
    pub mode: SeasonMode,
    pub preview: bool,
    pub thresholds: SeasonThresholds,
    pub image_min_ctr: f64,
    pub target_roas: Decimal,
    pub budget_baseline: SeasonBudget,
}

impl SeasonContext {
    /// `true` when assets should be classified: Active season or a preview run.
    #[must_use]
    pub fn analysis_enabled(&self) -> bool {
        self.mode == SeasonMode::Active || self.preview
    }

    /// `true` when the run may write graveyard entries, request generation
    /// or export. Preview runs never do.
    #[must_use]
    pub fn side_effects_enabled(&self) -> bool {
        self.mode == SeasonMode::Active && !self.preview
    }

    /// Report label such as `"Peak (active)"` or `"PREVIEW Deep Winter (monitor-only)"`.
    #[must_use]
    pub fn label(&self) -> String {
        if self.preview {
            format!("PREVIEW {} ({})", self.season, self.mode)
        } else {
            format!("{} ({})", self.season, self.mode)
        }
    }
}

/// Resolve the season, mode and thresholds for `date`.
#[must_use]
pub fn resolve_season(date: NaiveDate, config: &ThresholdsConfig, preview: bool) -> SeasonContext {
    let season = Season::for_date(date);
    let thresholds = config.seasons.get(season).clone();
    let target_roas = thresholds
        .target_roas
        .unwrap_or_else(|| config.budget.break_even_roas());

    SeasonContext {
        date,
        season,
        mode: season.mode(),
        preview,
        budget_baseline: thresholds.budget.clone(),
        thresholds,
        image_min_ctr: config.image_min_ctr,
        target_roas,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn every_month_maps_to_one_season() {
        let expected = [
            (1, Season::DeepWinter),
            (2, Season::DeepWinter),
            (3, Season::Shoulder),
            (4, Season::Shoulder),
            (5, Season::Peak),
            (6, Season::Peak),
            (7, Season::Peak),
            (8, Season::Peak),
            (9, Season::Shoulder),
            (10, Season::Shoulder),
            (11, Season::LowSeason),
            (12, Season::LowSeason),
        ];
        for (month, season) in expected {
            assert_eq!(Season::for_date(date(2026, month, 15)), season, "month {month}");
        }
    }

    #[test]
    fn off_seasons_are_monitor_only() {
        assert_eq!(Season::DeepWinter.mode(), SeasonMode::MonitorOnly);
        assert_eq!(Season::LowSeason.mode(), SeasonMode::MonitorOnly);
        assert_eq!(Season::Shoulder.mode(), SeasonMode::Active);
        assert_eq!(Season::Peak.mode(), SeasonMode::Active);
    }

    #[test]
    fn resolve_is_deterministic() {
        let config = ThresholdsConfig::default();
        let a = resolve_season(date(2026, 7, 4), &config, false);
        let b = resolve_season(date(2026, 7, 4), &config, false);
        assert_eq!(a, b);
        assert_eq!(a.thresholds.min_impressions, 500);
        assert!((a.image_min_ctr - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn target_roas_defaults_to_break_even() {
        let ctx = resolve_season(date(2026, 6, 1), &ThresholdsConfig::default(), false);
        assert_eq!(ctx.target_roas, Decimal::new(15625, 4));
    }

    #[test]
    fn season_target_roas_overrides_break_even() {
        let mut config = ThresholdsConfig::default();
        config.seasons.peak.target_roas = Some(Decimal::from(2));
        let ctx = resolve_season(date(2026, 6, 1), &config, false);
        assert_eq!(ctx.target_roas, Decimal::from(2));
    }

    #[test]
    fn preview_enables_analysis_without_side_effects() {
        let ctx = resolve_season(date(2026, 1, 10), &ThresholdsConfig::default(), true);
        assert_eq!(ctx.mode, SeasonMode::MonitorOnly);
        assert!(ctx.analysis_enabled());
        assert!(!ctx.side_effects_enabled());
        assert!(ctx.label().starts_with("PREVIEW"));
    }

    #[test]
    fn monitor_only_disables_analysis() {
        let ctx = resolve_season(date(2026, 12, 1), &ThresholdsConfig::default(), false);
        assert!(!ctx.analysis_enabled());
        assert!(!ctx.side_effects_enabled());
        assert_eq!(ctx.label(), "Low Season (monitor-only)");
    }
}
