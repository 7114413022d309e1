//! `pmax images`: registry import and image mix analysis.

use std::path::PathBuf;

use clap::Subcommand;
use pmax_core::{AppConfig, CampaignConfig, EngineConfig, ImageRegistryEntry};
use pmax_engine::{analyze_gaps, GapAnalysis};
use pmax_relay::render::render_gaps;
use pmax_relay::Notification;

use crate::snapshot::read_registry_file;
use crate::{build_notifier, connect, notify_best_effort};

#[derive(Debug, Subcommand)]
pub enum ImagesCommands {
    /// Upsert analyzed images from a JSON file into the registry
    Import {
        #[arg(long)]
        file: PathBuf,
    },
    /// Compare each campaign's live image mix with its target profile
    Gaps {
        /// Restrict analysis to one campaign (by slug)
        #[arg(long)]
        campaign: Option<String>,

        /// Send the report to the notification webhook
        #[arg(long)]
        notify: bool,
    },
}

/// Campaigns to analyze: the one named by `slug`, or all of them.
pub(crate) fn select_campaigns<'a>(
    engine: &'a EngineConfig,
    slug: Option<&str>,
) -> anyhow::Result<Vec<&'a CampaignConfig>> {
    match slug {
        Some(slug) => {
            let campaign = engine
                .campaigns
                .by_slug(slug)
                .ok_or_else(|| anyhow::anyhow!("campaign '{slug}' not found in campaigns.yaml"))?;
            Ok(vec![campaign])
        }
        None => Ok(engine.campaigns.campaigns.iter().collect()),
    }
}

pub(crate) fn analyze(
    engine: &EngineConfig,
    campaigns: &[&CampaignConfig],
    registry: &[ImageRegistryEntry],
) -> Vec<GapAnalysis> {
    campaigns
        .iter()
        .map(|c| {
            let profile = engine.campaigns.image_profiles.profile(c.image_profile);
            analyze_gaps(&c.name, &profile, registry, &engine.thresholds.gaps)
        })
        .collect()
}

pub(crate) async fn run(
    config: &AppConfig,
    engine: &EngineConfig,
    command: ImagesCommands,
) -> anyhow::Result<()> {
    let pool = connect(config).await?;
    match command {
        ImagesCommands::Import { file } => {
            let entries = read_registry_file(&file)?;
            let mut added = 0usize;
            for entry in &entries {
                if pmax_db::upsert_image(&pool, entry).await? {
                    added += 1;
                }
            }
            tracing::info!(total = entries.len(), added, "image registry imported");
            println!(
                "imported {} image(s): {added} new, {} refreshed",
                entries.len(),
                entries.len() - added
            );
        }
        ImagesCommands::Gaps { campaign, notify } => {
            let campaigns = select_campaigns(engine, campaign.as_deref())?;
            let registry = pmax_db::list_images(&pool).await?;
            let notifier = if notify { build_notifier(config)? } else { None };

            for analysis in analyze(engine, &campaigns, &registry) {
                let text = render_gaps(&analysis);
                notify_best_effort(notifier.as_ref(), &Notification::report(text.clone())).await;
                println!("{text}\n");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use pmax_core::{
        AdAssetMapping, CampaignsFile, ContentCategory, ImageProfiles, ImageSlot, ProfileKind,
        ThresholdsConfig,
    };
    use pmax_engine::GapStatus;

    use super::*;

    fn engine() -> EngineConfig {
        let core = BTreeMap::from([
            (ContentCategory::ProductHero, 50.0),
            (ContentCategory::LifestyleWithProduct, 50.0),
        ]);
        let net = BTreeMap::from([(ContentCategory::ProductHero, 100.0)]);
        let campaign = |name: &str, kind| CampaignConfig {
            name: name.to_string(),
            campaign_id: None,
            asset_group: None,
            image_profile: kind,
            notes: None,
        };
        EngineConfig {
            thresholds: ThresholdsConfig::default(),
            campaigns: CampaignsFile {
                campaigns: vec![
                    campaign("Core Brand", ProfileKind::CoreBrand),
                    campaign("Replacement Nets", ProfileKind::ReplacementNet),
                ],
                image_profiles: ImageProfiles {
                    core_brand: core,
                    replacement_net: net,
                },
            },
        }
    }

    fn image(id: &str, category: ContentCategory, campaign: &str) -> ImageRegistryEntry {
        ImageRegistryEntry {
            image_id: id.to_string(),
            content_category: category,
            eligible_slots: vec![ImageSlot::Square],
            mappings: vec![AdAssetMapping {
                campaign_name: campaign.to_string(),
                asset_resource: format!("customers/1/assets/{id}"),
                slot: ImageSlot::Square,
                unlinked_on: None,
            }],
            performance: BTreeMap::new(),
            description: None,
        }
    }

    #[test]
    fn selects_campaign_by_slug() {
        let engine = engine();
        let picked = select_campaigns(&engine, Some("replacement-nets")).unwrap();
        assert_eq!(picked.len(), 1);
        assert_eq!(picked[0].name, "Replacement Nets");
        assert_eq!(select_campaigns(&engine, None).unwrap().len(), 2);
        assert!(select_campaigns(&engine, Some("unknown")).is_err());
    }

    #[test]
    fn each_campaign_uses_its_own_profile() {
        let engine = engine();
        let registry = vec![
            image("a", ContentCategory::ProductHero, "Core Brand"),
            image("b", ContentCategory::ProductHero, "Replacement Nets"),
        ];
        let campaigns = select_campaigns(&engine, None).unwrap();
        let results = analyze(&engine, &campaigns, &registry);

        let core = &results[0];
        assert_eq!(core.total_images, 1);
        assert!(core
            .recommendations()
            .any(|g| g.category == ContentCategory::LifestyleWithProduct));

        let net = &results[1];
        assert!(net.composition.iter().all(|g| g.status != GapStatus::Under));
    }
}
