use pmax_core::{resolve_season, AssetType, ThresholdsConfig};
use rust_decimal::Decimal;

use super::*;

fn ctx(month: u32, preview: bool) -> SeasonContext {
    let date = NaiveDate::from_ymd_opt(2026, month, 15).unwrap();
    resolve_season(date, &ThresholdsConfig::default(), preview)
}

fn record(asset_type: AssetType, text: Option<&str>, impressions: i64, clicks: i64) -> AssetMetricRecord {
    AssetMetricRecord {
        identity: "123".to_string(),
        window_end: NaiveDate::from_ymd_opt(2026, 6, 7).unwrap(),
        campaign_name: "Core Brand".to_string(),
        asset_type,
        asset_text: text.map(str::to_string),
        impressions,
        clicks,
        cost: Decimal::ZERO,
        conversions: Decimal::ZERO,
        ctr: pmax_core::ctr_percent(clicks, impressions),
        status: AssetStatus::Monitored,
    }
}

fn grave(copy: &str) -> GraveyardEntry {
    GraveyardEntry {
        campaign_name: "Core Brand".to_string(),
        date_killed: NaiveDate::from_ymd_opt(2026, 5, 3).unwrap(),
        asset_identity: "old".to_string(),
        asset_type: AssetType::Headline,
        original_copy: copy.to_string(),
        kill_reason: "CTR 1.00% < 4.00%".to_string(),
        impressions: 900,
        clicks: 9,
        ctr: 1.0,
    }
}

#[test]
fn peak_headline_below_floor_is_flagged() {
    let (records, flagged) = classify(
        vec![record(AssetType::Headline, Some("Nets For Every Hoop"), 1000, 15)],
        &ctx(6, false),
        &[],
    );
    assert_eq!(records[0].status, AssetStatus::Flag);
    assert_eq!(flagged.len(), 1);
    assert_eq!(flagged[0].reason, "CTR 1.50% < 4.00%");
    assert_eq!(flagged[0].follow_up, FlagFollowUp::ReplaceCopy);
}

#[test]
fn above_floor_is_kept() {
    let (records, flagged) = classify(
        vec![record(AssetType::Headline, Some("Nets For Every Hoop"), 1000, 50)],
        &ctx(6, false),
        &[],
    );
    assert_eq!(records[0].status, AssetStatus::Keep);
    assert!(flagged.is_empty());
}

#[test]
fn never_flags_below_impression_floor_in_any_season() {
    let config = ThresholdsConfig::default();
    for month in 1..=12 {
        for preview in [false, true] {
            let c = ctx(month, preview);
            let floor = config.seasons.get(c.season).min_impressions;
            for asset_type in [
                AssetType::Headline,
                AssetType::LongHeadline,
                AssetType::Description,
                AssetType::MarketingImage,
            ] {
                let (records, flagged) =
                    classify(vec![record(asset_type, Some("x"), floor - 1, 0)], &c, &[]);
                assert_eq!(records[0].status, AssetStatus::Monitored);
                assert!(flagged.is_empty());
            }
        }
    }
}

#[test]
fn monitor_only_season_never_classifies() {
    let (records, flagged) = classify(
        vec![record(AssetType::Headline, Some("x"), 5000, 0)],
        &ctx(1, false),
        &[],
    );
    assert_eq!(records[0].status, AssetStatus::Monitored);
    assert!(flagged.is_empty());
}

#[test]
fn preview_classifies_in_monitor_only_season() {
    let (records, _) = classify(
        vec![record(AssetType::Headline, Some("x"), 5000, 0)],
        &ctx(1, true),
        &[],
    );
    assert_eq!(records[0].status, AssetStatus::Flag);
}

#[test]
fn text_floors_are_independent_per_type() {
    // 3.5% is below the peak headline floor (4.0) but above long headline (2.5).
    let c = ctx(7, false);
    let (records, _) = classify(
        vec![
            record(AssetType::Headline, Some("a"), 1000, 35),
            record(AssetType::LongHeadline, Some("b c d"), 1000, 35),
            record(AssetType::Description, Some("e"), 1000, 35),
        ],
        &c,
        &[],
    );
    let statuses: Vec<AssetStatus> = records.iter().map(|r| r.status).collect();
    assert_eq!(
        statuses,
        vec![AssetStatus::Flag, AssetStatus::Keep, AssetStatus::Flag]
    );
}

#[test]
fn images_use_flat_floor_every_active_season() {
    for month in [3, 6] {
        let (_, flagged) = classify(
            vec![
                record(AssetType::SquareMarketingImage, None, 1000, 9),
                record(AssetType::MarketingImage, None, 1000, 10),
            ],
            &ctx(month, false),
            &[],
        );
        assert_eq!(flagged.len(), 1, "month {month}");
        assert_eq!(flagged[0].reason, "CTR 0.90% < 1.00%");
        assert_eq!(flagged[0].follow_up, FlagFollowUp::ManualImageReview);
    }
}

#[test]
fn image_flag_has_note_but_no_graveyard_or_generation() {
    let (_, flagged) = classify(
        vec![record(AssetType::PortraitMarketingImage, None, 1000, 1)],
        &ctx(6, false),
        &[],
    );
    let flag = &flagged[0];
    assert!(flag.manual_note().is_some());
    assert!(flag.generation_target().is_none());
    assert!(flag.graveyard_entry(NaiveDate::from_ymd_opt(2026, 6, 7).unwrap()).is_none());
    assert!(flag.diagnosis.starts_with("visual_fatigue"));
}

#[test]
fn text_flag_produces_graveyard_entry_and_target() {
    let (_, flagged) = classify(
        vec![record(AssetType::Headline, Some("Nets For Every Hoop"), 1000, 15)],
        &ctx(6, false),
        &[],
    );
    let killed = NaiveDate::from_ymd_opt(2026, 6, 7).unwrap();
    let entry = flagged[0].graveyard_entry(killed).unwrap();
    assert_eq!(entry.original_copy, "Nets For Every Hoop");
    assert_eq!(entry.kill_reason, "CTR 1.50% < 4.00%");
    assert_eq!(entry.date_killed, killed);

    let target = flagged[0].generation_target().unwrap();
    assert_eq!(target.asset_identity, "123");
    assert!(flagged[0].manual_note().is_none());
}

#[test]
fn diagnose_hype_language() {
    let r = record(AssetType::Headline, Some("An Innovative Net"), 1000, 1);
    assert!(diagnose(&r, &[]).starts_with("voice: Contains hype language ('innovative')"));
}

#[test]
fn diagnose_short_long_headline() {
    let r = record(AssetType::LongHeadline, Some("Great nets"), 1000, 1);
    assert!(diagnose(&r, &[]).starts_with("specificity"));
}

#[test]
fn diagnose_gatekeeping() {
    let r = record(AssetType::Description, Some("Built for elite players"), 1000, 1);
    assert!(diagnose(&r, &[]).contains("Gatekeeping language ('elite')"));
}

#[test]
fn diagnose_repeat_of_graveyard_copy() {
    let r = record(AssetType::Headline, Some("Tough Nets For Hoops"), 1000, 1);
    let diagnosis = diagnose(&r, &[grave("Tough Nets For Any Hoop")]);
    assert!(diagnosis.starts_with("angle: Similar to previously killed copy"));
}

#[test]
fn diagnose_ignores_other_campaign_graveyard() {
    let r = record(AssetType::Headline, Some("Tough Nets For Hoops"), 1000, 1);
    let mut other = grave("Tough Nets For Hoops");
    other.campaign_name = "Replacement Nets".to_string();
    assert!(diagnose(&r, &[other]).starts_with("angle: Low engagement"));
}

#[test]
fn diagnose_ignores_own_graveyard_entry() {
    let r = record(AssetType::Headline, Some("Tough Nets For Hoops"), 1000, 1);
    let mut own = grave("Tough Nets For Hoops");
    own.asset_identity = r.identity.clone();
    assert!(diagnose(&r, &[own]).starts_with("angle: Low engagement"));
}

#[test]
fn word_overlap_is_relative_to_subject() {
    assert!((word_overlap("a b c d", "a b x y z") - 0.5).abs() < 1e-9);
    assert_eq!(word_overlap("", "a"), 0.0);
}
