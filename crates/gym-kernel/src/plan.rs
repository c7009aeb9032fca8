//! Plan catalog: the two fixed membership plans.

use crate::error::GymError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier of a membership plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanId {
    /// Short-cycle plan.
    Monthly,
    /// Long-cycle plan.
    Annual,
}

impl PlanId {
    pub const ALL: [PlanId; 2] = [PlanId::Monthly, PlanId::Annual];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Monthly => "monthly",
            Self::Annual => "annual",
        }
    }
}

impl fmt::Display for PlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanId {
    type Err = GymError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "monthly" | "short-cycle" | "short_cycle" => Ok(Self::Monthly),
            "annual" | "long-cycle" | "long_cycle" => Ok(Self::Annual),
            other => Err(GymError::UnknownPlan(other.to_string())),
        }
    }
}

/// Price, duration and benefits of a plan. Fully determined by [`PlanId`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: PlanId,
    /// Price in whole RON.
    pub price: u32,
    pub duration_days: u32,
    pub benefits: &'static [&'static str],
}

const MONTHLY_BENEFITS: &[&str] = &[
    "Access to all zones",
    "One free fitness assessment",
    "Showers and lockers",
];

const ANNUAL_BENEFITS: &[&str] = &[
    "Access to all zones",
    "Two personal-trainer sessions per month",
    "Showers and lockers",
    "Priority access at peak hours",
];

/// Look up a plan by identifier.
pub fn plan(id: PlanId) -> Plan {
    match id {
        PlanId::Monthly => Plan {
            id,
            price: 150,
            duration_days: 30,
            benefits: MONTHLY_BENEFITS,
        },
        PlanId::Annual => Plan {
            id,
            price: 1500,
            duration_days: 365,
            benefits: ANNUAL_BENEFITS,
        },
    }
}

/// Look up a plan by its textual identifier.
pub fn plan_by_name(name: &str) -> Result<Plan, GymError> {
    name.parse::<PlanId>().map(plan)
}

/// Every plan in the catalog, short cycle first.
pub fn catalog() -> Vec<Plan> {
    PlanId::ALL.into_iter().map(plan).collect()
}
