//! Membership lifecycle: the per-member subscription state machine.
//!
//! ```text
//! inactive ──activate──▶ active ──(expiry passed, detected lazily)──▶ expired
//!                          │  ▲                                          │
//!                        cancel └──────────────activate──────────────────┤
//!                          ▼                                             │
//!                      cancelled ───────────────activate─────────────────┘
//! ```
//!
//! Expiry is never driven by a timer. Status-gated operations ask for
//! [`MemberProfile::effective_status`], which reports a lapsed `active`
//! membership as `expired`; [`MemberProfile::record_visit`] additionally
//! commits that transition.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::GymError;
use crate::plan::{Plan, PlanId, plan};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipStatus {
    #[default]
    Inactive,
    Active,
    Expired,
    Cancelled,
}

impl MembershipStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Active => "active",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for MembershipStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of a successful activation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activation {
    pub plan: Plan,
    pub expires_at: DateTime<Utc>,
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} membership activated: {} RON, valid until {}",
            self.plan.id,
            self.plan.price,
            self.expires_at.format("%Y-%m-%d")
        )
    }
}

/// Outcome of `record_visit` on an active membership.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitOutcome {
    /// Visit appended at this instant.
    Recorded(DateTime<Utc>),
    /// The membership had lapsed at this instant; status is now `expired`.
    Expired(DateTime<Utc>),
}

impl fmt::Display for VisitOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recorded(at) => write!(f, "visit recorded at {}", at.format("%Y-%m-%d %H:%M:%S")),
            Self::Expired(at) => write!(f, "membership expired on {}", at.format("%Y-%m-%d")),
        }
    }
}

/// Where a member is currently checked in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonePresence {
    pub facility: String,
    pub zone: String,
}

/// Member-specific state.
///
/// Invariants: `expiry` is present iff `status != inactive`; `current_zone`
/// is present only while checked in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    #[serde(default)]
    pub status: MembershipStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<PlanId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visits: Vec<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_zone: Option<ZonePresence>,
    /// Facility key of the most recent check-in.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_facility: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub reserved_classes: BTreeSet<String>,
}

impl MemberProfile {
    /// Status as of `now`: an active membership past its expiry reads as
    /// `expired`. Does not mutate.
    pub fn effective_status(&self, now: DateTime<Utc>) -> MembershipStatus {
        match (self.status, self.expiry) {
            (MembershipStatus::Active, Some(expiry)) if expiry < now => MembershipStatus::Expired,
            (status, _) => status,
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.effective_status(now) == MembershipStatus::Active
    }

    /// Gate for status-restricted operations.
    pub fn require_active(&self, now: DateTime<Utc>) -> Result<(), GymError> {
        if self.is_active(now) {
            Ok(())
        } else {
            Err(GymError::MembershipNotActive)
        }
    }

    /// Start (or restart) a membership on `plan_id` from any prior state.
    pub fn activate(&mut self, plan_id: PlanId, now: DateTime<Utc>) -> Activation {
        let plan = plan(plan_id);
        let expires_at = now + Duration::days(i64::from(plan.duration_days));
        self.status = MembershipStatus::Active;
        self.plan = Some(plan_id);
        self.expiry = Some(expires_at);
        Activation { plan, expires_at }
    }

    /// Cancel the membership. Fails only when there never was one.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), GymError> {
        if self.status == MembershipStatus::Inactive {
            return Err(GymError::NoActiveMembership);
        }
        self.status = MembershipStatus::Cancelled;
        self.expiry = Some(now);
        self.plan = None;
        Ok(())
    }

    /// Record a gym visit, committing a lapsed membership to `expired`
    /// instead of recording.
    pub fn record_visit(&mut self, now: DateTime<Utc>) -> Result<VisitOutcome, GymError> {
        if self.status != MembershipStatus::Active {
            return Err(GymError::MembershipNotActive);
        }
        if self.effective_status(now) == MembershipStatus::Expired {
            self.status = MembershipStatus::Expired;
            return Ok(VisitOutcome::Expired(self.expiry.unwrap_or(now)));
        }
        self.visits.push(now);
        Ok(VisitOutcome::Recorded(now))
    }

    pub fn is_checked_in(&self) -> bool {
        self.current_zone.is_some()
    }
}
