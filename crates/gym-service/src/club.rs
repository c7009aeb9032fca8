//! The operation façade.
//!
//! Every mutating call is one `SnapshotStore::transact`: the snapshot is
//! loaded under the store lock, the operation runs against it, and the
//! result is saved before the lock is released. Two callers racing for the
//! last seat in a zone or class are therefore serialised, and the loser sees
//! `ZoneFull` / `ClassFull`. Read-only calls load without the lock.

use chrono::{DateTime, Utc};
use gym_kernel::plan::catalog as plan_catalog;
use gym_kernel::{
    Account, Activation, ClassSession, Facility, GymError, MemberProfile, NewClass, Plan, PlanId,
    VisitOutcome, new_class_id,
};
use gym_store::{Snapshot, SnapshotStore, TransactionError};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::ClubConfig;
use crate::coordinator::{self, CheckInReceipt, CheckOutReceipt, ReservationReceipt};
use crate::error::ClubError;
use crate::session::Session;
use crate::views::{
    ClassRemoved, ClassScheduled, ClassView, FacilityView, Statistics, ZoneOccupancy,
};

pub struct Club {
    store: SnapshotStore,
    clock: Arc<dyn Clock>,
}

impl Club {
    pub fn new(store: SnapshotStore) -> Self {
        Self {
            store,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn open(config: &ClubConfig) -> Result<Self, ClubError> {
        config.validate()?;
        Ok(Self::new(config.snapshot_store()))
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    // ── accounts ────────────────────────────────────────────────────────

    pub fn register_member(
        &self,
        id: &str,
        secret: &str,
        display_name: &str,
    ) -> Result<(), ClubError> {
        self.transact("register_member", |snapshot, now| {
            snapshot.insert_account(Account::new_member(id, secret, display_name, now)?)
        })?;
        tracing::info!(account = id, "member registered");
        Ok(())
    }

    /// Register an operator. A blank `access_level` becomes `standard`.
    pub fn register_operator(
        &self,
        id: &str,
        secret: &str,
        display_name: &str,
        access_level: &str,
    ) -> Result<(), ClubError> {
        self.transact("register_operator", |snapshot, now| {
            snapshot.insert_account(Account::new_operator(
                id,
                secret,
                display_name,
                access_level,
                now,
            )?)
        })?;
        tracing::info!(account = id, "operator registered");
        Ok(())
    }

    /// Verify a credential and open a session.
    ///
    /// Unknown identifier and wrong secret are indistinguishable.
    pub fn login(&self, id: &str, secret: &str) -> Result<Session, ClubError> {
        let now = self.clock.now();
        let result = self.snapshot().and_then(|snapshot| {
            let account = snapshot
                .account(id)
                .filter(|account| account.verify(secret))
                .ok_or(GymError::InvalidCredentials)?;
            Ok(Session::open(&account.id, account.kind(), now))
        });
        let session = observe("login", result)?;
        tracing::info!(account = id, kind = %session.kind(), "logged in");
        Ok(session)
    }

    pub fn logout(&self, session: Session) {
        tracing::info!(account = session.account_id(), "logged out");
    }

    /// Role-specific description of the session's account, or `None` if the
    /// account no longer exists.
    pub fn current_user_info(
        &self,
        session: &Session,
    ) -> Result<Option<BTreeMap<String, String>>, ClubError> {
        let now = self.clock.now();
        let snapshot = observe("current_user_info", self.snapshot())?;
        Ok(snapshot
            .account(session.account_id())
            .map(|account| account.describe(now)))
    }

    pub fn change_credential(
        &self,
        session: &Session,
        old_secret: &str,
        new_secret: &str,
    ) -> Result<(), ClubError> {
        self.transact("change_credential", |snapshot, _| {
            account_mut(snapshot, session)?.change_credential(old_secret, new_secret)
        })?;
        tracing::info!(account = session.account_id(), "credential changed");
        Ok(())
    }

    // ── membership ──────────────────────────────────────────────────────

    pub fn plans(&self) -> Vec<Plan> {
        plan_catalog()
    }

    pub fn activate_membership(
        &self,
        session: &Session,
        plan_name: &str,
    ) -> Result<Activation, ClubError> {
        let activation = self.transact("activate_membership", |snapshot, now| {
            let member = member_mut(snapshot, session)?;
            let plan_id: PlanId = plan_name.parse()?;
            Ok(member.activate(plan_id, now))
        })?;
        tracing::info!(
            account = session.account_id(),
            plan = %activation.plan.id,
            expires_at = %activation.expires_at,
            "membership activated"
        );
        Ok(activation)
    }

    /// Cancel the membership; returns the instant it ended.
    pub fn cancel_membership(&self, session: &Session) -> Result<DateTime<Utc>, ClubError> {
        let at = self.transact("cancel_membership", |snapshot, now| {
            member_mut(snapshot, session)?.cancel(now)?;
            Ok(now)
        })?;
        tracing::info!(account = session.account_id(), "membership cancelled");
        Ok(at)
    }

    /// Record a visit. A lapsed membership is committed to `expired`
    /// instead, and reported through [`VisitOutcome::Expired`].
    pub fn record_visit(&self, session: &Session) -> Result<VisitOutcome, ClubError> {
        let outcome = self.transact("record_visit", |snapshot, now| {
            member_mut(snapshot, session)?.record_visit(now)
        })?;
        match outcome {
            VisitOutcome::Recorded(_) => {
                tracing::info!(account = session.account_id(), "visit recorded");
            }
            VisitOutcome::Expired(expiry) => {
                tracing::info!(
                    account = session.account_id(),
                    %expiry,
                    "membership lapsed; marked expired"
                );
            }
        }
        Ok(outcome)
    }

    // ── zones ───────────────────────────────────────────────────────────

    pub fn check_in(
        &self,
        session: &Session,
        facility_key: &str,
        zone_key: &str,
    ) -> Result<CheckInReceipt, ClubError> {
        let receipt = self.transact("check_in", |snapshot, now| {
            member(snapshot, session)?.require_active(now)?;
            let mut facility = facility(snapshot, facility_key)?;
            coordinator::check_in(member_mut(snapshot, session)?, &mut facility, zone_key)
        })?;
        tracing::info!(
            account = session.account_id(),
            facility = facility_key,
            zone = zone_key,
            occupancy = receipt.occupancy,
            "checked in"
        );
        Ok(receipt)
    }

    pub fn check_out(
        &self,
        session: &Session,
        facility_key: &str,
    ) -> Result<CheckOutReceipt, ClubError> {
        let receipt = self.transact("check_out", |snapshot, _| {
            member(snapshot, session)?;
            let mut facility = facility(snapshot, facility_key)?;
            coordinator::check_out(member_mut(snapshot, session)?, &mut facility)
        })?;
        tracing::info!(
            account = session.account_id(),
            facility = facility_key,
            zone = %receipt.zone,
            "checked out"
        );
        Ok(receipt)
    }

    // ── classes ─────────────────────────────────────────────────────────

    /// Schedule a class (operators only). The room label is the facility's
    /// name.
    pub fn add_class(
        &self,
        session: &Session,
        facility_key: &str,
        new_class: NewClass,
    ) -> Result<ClassScheduled, ClubError> {
        let scheduled = self.transact("add_class", |snapshot, _| {
            account(snapshot, session)?.require_operator()?;
            let mut facility = facility(snapshot, facility_key)?;
            new_class.validate()?;

            let mut id = new_class_id();
            while snapshot.find_class(&id).is_some() {
                id = new_class_id();
            }
            let room = facility.name.clone();
            facility.add_class(ClassSession::new(id.clone(), new_class, room.clone()));
            snapshot.store_facility(facility);
            Ok(ClassScheduled {
                class_id: id,
                facility: facility_key.to_string(),
                room,
            })
        })?;
        tracing::info!(
            operator = session.account_id(),
            facility = facility_key,
            class = %scheduled.class_id,
            "class scheduled"
        );
        Ok(scheduled)
    }

    /// Remove a class (operators only), releasing every reservation on it.
    pub fn remove_class(
        &self,
        session: &Session,
        facility_key: &str,
        class_id: &str,
    ) -> Result<ClassRemoved, ClubError> {
        let removed = self.transact("remove_class", |snapshot, _| {
            account(snapshot, session)?.require_operator()?;
            let mut facility = facility(snapshot, facility_key)?;
            let class = facility
                .remove_class(class_id)
                .ok_or_else(|| GymError::ClassNotFound(class_id.to_string()))?;
            snapshot.store_facility(facility);
            for member in snapshot.members_mut() {
                member.reserved_classes.remove(class_id);
            }
            Ok(ClassRemoved {
                class_id: class_id.to_string(),
                facility: facility_key.to_string(),
                released: class.participants().to_vec(),
            })
        })?;
        tracing::info!(
            operator = session.account_id(),
            facility = facility_key,
            class = class_id,
            released = removed.released.len(),
            "class removed"
        );
        Ok(removed)
    }

    pub fn reserve_class(
        &self,
        session: &Session,
        facility_key: &str,
        class_id: &str,
    ) -> Result<ReservationReceipt, ClubError> {
        let receipt = self.transact("reserve_class", |snapshot, now| {
            member(snapshot, session)?.require_active(now)?;
            let mut facility = facility(snapshot, facility_key)?;
            let receipt = coordinator::reserve_class(
                session.account_id(),
                member_mut(snapshot, session)?,
                &mut facility,
                class_id,
            )?;
            snapshot.store_facility(facility);
            Ok(receipt)
        })?;
        tracing::info!(
            account = session.account_id(),
            class = class_id,
            enrolled = receipt.enrolled,
            capacity = receipt.capacity,
            "class reserved"
        );
        Ok(receipt)
    }

    pub fn cancel_reservation(
        &self,
        session: &Session,
        facility_key: &str,
        class_id: &str,
    ) -> Result<(), ClubError> {
        self.transact("cancel_reservation", |snapshot, _| {
            member(snapshot, session)?;
            let mut facility = facility(snapshot, facility_key)?;
            coordinator::cancel_reservation(
                session.account_id(),
                member_mut(snapshot, session)?,
                &mut facility,
                class_id,
            )?;
            snapshot.store_facility(facility);
            Ok(())
        })?;
        tracing::info!(
            account = session.account_id(),
            class = class_id,
            "reservation cancelled"
        );
        Ok(())
    }

    // ── projections ─────────────────────────────────────────────────────

    pub fn list_facilities(&self) -> Result<Vec<FacilityView>, ClubError> {
        let snapshot = observe("list_facilities", self.snapshot())?;
        Ok(snapshot
            .facilities()
            .values()
            .map(FacilityView::from)
            .collect())
    }

    /// Every scheduled class across all facilities, earliest first.
    pub fn list_classes(&self) -> Result<Vec<ClassView>, ClubError> {
        let snapshot = observe("list_classes", self.snapshot())?;
        let mut classes: Vec<ClassView> = snapshot
            .classes()
            .map(|(facility, class)| ClassView::new(facility, class))
            .collect();
        sort_by_start(&mut classes);
        Ok(classes)
    }

    /// The session member's reserved classes that still exist, earliest
    /// first.
    pub fn list_my_reservations(&self, session: &Session) -> Result<Vec<ClassView>, ClubError> {
        let result = self.snapshot().and_then(|snapshot| {
            let member = member(&snapshot, session)?;
            let mut classes: Vec<ClassView> = member
                .reserved_classes
                .iter()
                .filter_map(|id| snapshot.find_class(id))
                .map(|(facility, class)| ClassView::new(facility, class))
                .collect();
            sort_by_start(&mut classes);
            Ok(classes)
        });
        observe("list_my_reservations", result)
    }

    /// Operator dashboard. Activity is judged by effective status.
    pub fn admin_statistics(&self, session: &Session) -> Result<Statistics, ClubError> {
        let now = self.clock.now();
        let result = self.snapshot().and_then(|snapshot| {
            account(&snapshot, session)?.require_operator()?;
            Ok(statistics(&snapshot, now))
        });
        observe("admin_statistics", result)
    }

    // ── plumbing ────────────────────────────────────────────────────────

    fn snapshot(&self) -> Result<Snapshot, ClubError> {
        Ok(self.store.load()?)
    }

    /// Run `op` as one committed transaction. Any error aborts it.
    fn transact<T, F>(&self, op: &'static str, op_fn: F) -> Result<T, ClubError>
    where
        F: FnOnce(&mut Snapshot, DateTime<Utc>) -> Result<T, GymError>,
    {
        let now = self.clock.now();
        let result = self
            .store
            .transact(|snapshot| {
                op_fn(snapshot, now)
                    .map(|value| (value, true))
                    .map_err(ClubError::from)
            })
            .map_err(TransactionError::flatten);
        observe(op, result)
    }
}

fn observe<T>(op: &'static str, result: Result<T, ClubError>) -> Result<T, ClubError> {
    if let Err(err) = &result {
        match err {
            ClubError::Domain(GymError::ZoneFull { .. } | GymError::ClassFull { .. }) => {
                tracing::warn!(op, failure_class = err.failure_class(), %err, "at capacity");
            }
            ClubError::Domain(_) => {
                tracing::debug!(op, failure_class = err.failure_class(), %err, "rejected");
            }
            ClubError::Store(_) | ClubError::Config(_) => {
                tracing::error!(op, failure_class = err.failure_class(), %err, "store failure");
            }
        }
    }
    result
}

fn account<'a>(snapshot: &'a Snapshot, session: &Session) -> Result<&'a Account, GymError> {
    snapshot
        .account(session.account_id())
        .ok_or_else(|| GymError::AccountNotFound(session.account_id().to_string()))
}

fn account_mut<'a>(
    snapshot: &'a mut Snapshot,
    session: &Session,
) -> Result<&'a mut Account, GymError> {
    snapshot
        .account_mut(session.account_id())
        .ok_or_else(|| GymError::AccountNotFound(session.account_id().to_string()))
}

fn member<'a>(snapshot: &'a Snapshot, session: &Session) -> Result<&'a MemberProfile, GymError> {
    account(snapshot, session)?.member()
}

fn member_mut<'a>(
    snapshot: &'a mut Snapshot,
    session: &Session,
) -> Result<&'a mut MemberProfile, GymError> {
    account_mut(snapshot, session)?.member_mut()
}

fn facility(snapshot: &Snapshot, key: &str) -> Result<Facility, GymError> {
    snapshot
        .facility(key)
        .ok_or_else(|| GymError::UnknownFacility(key.to_string()))
}

fn sort_by_start(classes: &mut [ClassView]) {
    classes.sort_by(|a, b| {
        a.start_time
            .cmp(&b.start_time)
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn statistics(snapshot: &Snapshot, now: DateTime<Utc>) -> Statistics {
    let total_members = snapshot.members().count();
    let active_members = snapshot
        .members()
        .filter(|(_, member)| member.is_active(now))
        .count();
    let activation_rate = if total_members == 0 {
        0.0
    } else {
        active_members as f64 / total_members as f64 * 100.0
    };

    let zones = snapshot
        .facilities()
        .values()
        .flat_map(|facility| {
            facility.zones().map(move |(key, zone)| ZoneOccupancy {
                facility: facility.key.clone(),
                zone: key.to_string(),
                occupancy: zone.occupancy(),
                capacity: zone.capacity(),
                occupancy_rate: zone.occupancy_rate(),
            })
        })
        .collect();

    Statistics {
        active_members,
        total_members,
        activation_rate,
        zones,
        total_classes: snapshot.classes().count(),
        total_participants: snapshot.classes().map(|(_, class)| class.occupancy()).sum(),
    }
}
