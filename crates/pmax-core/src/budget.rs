use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::CoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BudgetAction {
    Increase,
    Hold,
    Decrease,
    Pause,
}

impl BudgetAction {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            BudgetAction::Increase => "INCREASE",
            BudgetAction::Hold => "HOLD",
            BudgetAction::Decrease => "DECREASE",
            BudgetAction::Pause => "PAUSE",
        }
    }
}

impl std::fmt::Display for BudgetAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetAction {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INCREASE" => Ok(BudgetAction::Increase),
            "HOLD" => Ok(BudgetAction::Hold),
            "DECREASE" => Ok(BudgetAction::Decrease),
            "PAUSE" => Ok(BudgetAction::Pause),
            other => Err(CoreError::UnknownValue {
                kind: "budget action",
                value: other.to_string(),
            }),
        }
    }
}

/// Campaign-level spend and attributed revenue for one budget week.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignSpend {
    pub campaign_name: String,
    pub week_ending: NaiveDate,
    pub spend: Decimal,
    /// Revenue attributed by the commerce platform, not the ad platform.
    pub revenue: Decimal,
    pub current_daily_budget: Decimal,
    /// Days the spend covers; used for average daily spend.
    #[serde(default = "default_days_in_period")]
    pub days_in_period: u32,
}

fn default_days_in_period() -> u32 {
    7
}

impl CampaignSpend {
    /// Average spend per day over the period.
    #[must_use]
    pub fn avg_daily_spend(&self) -> Decimal {
        if self.days_in_period == 0 {
            return self.spend;
        }
        self.spend / Decimal::from(self.days_in_period)
    }

    /// Average daily spend as a fraction of the current daily budget, or
    /// `None` when no budget is set or the ratio overflows.
    #[must_use]
    pub fn budget_utilization(&self) -> Option<Decimal> {
        if self.current_daily_budget <= Decimal::ZERO {
            return None;
        }
        self.avg_daily_spend().checked_div(self.current_daily_budget)
    }

    /// Revenue over spend, or `None` when nothing was spent or the ratio
    /// overflows.
    #[must_use]
    pub fn roas(&self) -> Option<Decimal> {
        if self.spend <= Decimal::ZERO {
            return None;
        }
        self.revenue.checked_div(self.spend)
    }
}

/// Weekly budget decision for one campaign. Unique per
/// `(campaign_name, week_ending)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignBudgetRecord {
    pub campaign_name: String,
    pub week_ending: NaiveDate,
    pub spend: Decimal,
    pub revenue: Decimal,
    /// Revenue over spend as a ratio (`1.25` is 125%). `None` when nothing was spent.
    pub roas: Option<Decimal>,
    pub target_roas: Decimal,
    pub budget_utilization: Option<Decimal>,
    pub current_daily_budget: Decimal,
    pub recommended_daily_budget: Decimal,
    pub action: BudgetAction,
    pub reason: String,
    pub market_ceiling: bool,
}
