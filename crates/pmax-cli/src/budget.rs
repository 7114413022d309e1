//! `pmax budget`: week-over-week budget decisions for one campaign.

use pmax_core::{AppConfig, EngineConfig};
use pmax_db::BudgetPerformanceRow;
use rust_decimal::Decimal;

use crate::connect;

pub(crate) fn format_row(row: &BudgetPerformanceRow) -> String {
    let roas = row
        .roas
        .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
        .map_or_else(|| "n/a".to_string(), |pct| format!("{pct:.2}%"));
    let ceiling = if row.market_ceiling { " [ceiling]" } else { "" };
    format!(
        "{}  {:<8} ROAS {roas:>9}  ${:.2} -> ${:.2}/day{ceiling}  {}",
        row.week_ending,
        row.action,
        row.current_daily_budget,
        row.recommended_daily_budget,
        row.reason
    )
}

pub(crate) async fn run(
    config: &AppConfig,
    engine: &EngineConfig,
    slug: &str,
    weeks: i64,
) -> anyhow::Result<()> {
    let campaign = engine
        .campaigns
        .by_slug(slug)
        .ok_or_else(|| anyhow::anyhow!("campaign '{slug}' not found in campaigns.yaml"))?;

    let pool = connect(config).await?;
    let history = pmax_db::list_budget_history(&pool, &campaign.name, weeks).await?;
    if history.is_empty() {
        println!("no budget history for {}", campaign.name);
        return Ok(());
    }

    println!("{} (last {} week(s))", campaign.name, history.len());
    for row in &history {
        println!("  {}", format_row(row));
    }
    Ok(())
}
