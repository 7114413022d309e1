//! ROAS-tiered budget advice.

use pmax_core::{BudgetAction, BudgetPolicy, CampaignBudgetRecord, CampaignSpend, SeasonContext};
use rust_decimal::Decimal;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// Average spend well under budget on a large budget: the market cannot
/// absorb more at current efficiency.
#[must_use]
pub fn market_ceiling(spend: &CampaignSpend, policy: &BudgetPolicy) -> bool {
    spend.current_daily_budget > policy.ceiling_min_budget
        && spend
            .budget_utilization()
            .is_some_and(|u| u < policy.ceiling_utilization)
}

fn pct(ratio: Decimal) -> Decimal {
    ratio.checked_mul(HUNDRED).unwrap_or(Decimal::MAX).round_dp(2)
}

/// Decide the budget action for one campaign week.
///
/// ROAS is recomputed from the supplied spend and revenue every time. Zero
/// spend always holds.
#[must_use]
pub fn advise(
    spend: &CampaignSpend,
    ctx: &SeasonContext,
    policy: &BudgetPolicy,
) -> CampaignBudgetRecord {
    let current = spend.current_daily_budget;
    let target = if ctx.target_roas > Decimal::ZERO {
        ctx.target_roas
    } else {
        policy.break_even_roas()
    };

    let mut record = CampaignBudgetRecord {
        campaign_name: spend.campaign_name.clone(),
        week_ending: spend.week_ending,
        spend: spend.spend,
        revenue: spend.revenue,
        roas: None,
        target_roas: target,
        budget_utilization: spend.budget_utilization().map(|u| u.round_dp(4)),
        current_daily_budget: current,
        recommended_daily_budget: current,
        action: BudgetAction::Hold,
        reason: "no spend this period".to_string(),
        market_ceiling: false,
    };

    if spend.spend <= Decimal::ZERO {
        return record;
    }

    let Some((roas, ratio)) = spend
        .roas()
        .and_then(|roas| roas.checked_div(target).map(|ratio| (roas, ratio)))
    else {
        tracing::warn!(campaign = %record.campaign_name, "ROAS out of range; holding");
        record.reason = "ROAS out of range; holding".to_string();
        return record;
    };
    record.roas = Some(roas.round_dp(4));
    let floor = policy.maintenance_floor;

    if ratio < policy.pause_ratio {
        if current <= floor {
            record.reason = format!(
                "ROAS {:.2}% critically below target {:.2}%, budget already at or below maintenance floor ${floor:.2}/day",
                pct(roas),
                pct(target),
            );
        } else {
            record.action = BudgetAction::Pause;
            record.recommended_daily_budget = floor;
            record.reason = format!(
                "ROAS {:.2}% critically below target {:.2}%; reduce to maintenance floor ${floor:.2}/day",
                pct(roas),
                pct(target),
            );
        }
    } else if ratio < policy.decrease_ratio {
        let cut = (current * (Decimal::ONE - policy.step_fraction)).round_dp(2);
        record.action = BudgetAction::Decrease;
        record.recommended_daily_budget = cut.max(floor.min(current));
        record.reason = format!(
            "ROAS {:.2}% below target {:.2}%; cut budget by {:.0}%",
            pct(roas),
            pct(target),
            pct(policy.step_fraction),
        );
    } else if ratio <= policy.increase_ratio {
        record.reason = format!("ROAS {:.2}% on target {:.2}%; hold", pct(roas), pct(target));
    } else if market_ceiling(spend, policy) {
        record.market_ceiling = true;
        record.reason = format!(
            "MARKET_CEILING: ROAS {:.2}% above target {:.2}% but only {:.0}% of ${current:.2}/day budget is spent",
            pct(roas),
            pct(target),
            spend.budget_utilization().map_or(Decimal::ZERO, pct),
        );
    } else {
        record.action = BudgetAction::Increase;
        record.recommended_daily_budget =
            (current * (Decimal::ONE + policy.step_fraction)).round_dp(2);
        record.reason = format!(
            "ROAS {:.2}% above target {:.2}%; raise budget by {:.0}%",
            pct(roas),
            pct(target),
            pct(policy.step_fraction),
        );
    }

    tracing::debug!(
        campaign = %record.campaign_name,
        action = %record.action,
        roas = ?record.roas,
        "budget advice"
    );

    record
}

#[cfg(test)]
#[path = "budget_test.rs"]
mod tests;
