//! Canonical in-memory representation of the persisted snapshot.
//!
//! This is the memory boundary for `gym-store`:
//! - accounts keyed by identifier
//! - class sessions keyed by facility
//! - facility hydration (catalog zones + persisted classes + derived occupancy)
//!
//! Zones are not persisted. Their occupancy is recomputed on every hydration
//! from the members whose recorded presence points at them.

use gym_kernel::facility::catalog;
use gym_kernel::{
    Account, ClassSession, Facility, GymError, MemberProfile, is_known_facility, is_known_zone,
};
use std::collections::BTreeMap;

/// Errors raised while assembling a snapshot from decoded records.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SnapshotError {
    #[error("duplicate account record: {0}")]
    DuplicateAccount(String),

    #[error("class record for unknown facility: {0}")]
    UnknownFacility(String),

    #[error("duplicate class id: {0}")]
    DuplicateClass(String),

    #[error("invalid roster: {0}")]
    InvalidRoster(String),

    #[error("account {account} is checked in to unknown zone {facility}/{zone}")]
    DanglingPresence {
        account: String,
        facility: String,
        zone: String,
    },

    #[error("reservation of {class_id} by {account} is not recorded on both sides")]
    ReservationMismatch { account: String, class_id: String },
}

/// The complete durable state: every account and every class session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    revision: u64,
    accounts: BTreeMap<String, Account>,
    facility_classes: BTreeMap<String, Vec<ClassSession>>,
}

impl Snapshot {
    /// An empty snapshot at revision 0 (first-run bootstrap).
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build a snapshot from decoded records, checking structural invariants.
    pub fn from_records(
        revision: u64,
        accounts: Vec<Account>,
        classes: Vec<(String, ClassSession)>,
    ) -> Result<Self, SnapshotError> {
        let mut snapshot = Self {
            revision,
            ..Self::default()
        };

        for account in accounts {
            if snapshot.accounts.contains_key(&account.id) {
                return Err(SnapshotError::DuplicateAccount(account.id));
            }
            snapshot.accounts.insert(account.id.clone(), account);
        }

        for (facility, class) in classes {
            if !is_known_facility(&facility) {
                return Err(SnapshotError::UnknownFacility(facility));
            }
            if snapshot.find_class(class.id()).is_some() {
                return Err(SnapshotError::DuplicateClass(class.id().to_string()));
            }
            class.check_roster().map_err(SnapshotError::InvalidRoster)?;
            snapshot
                .facility_classes
                .entry(facility)
                .or_default()
                .push(class);
        }

        snapshot.check_links()?;
        Ok(snapshot)
    }

    /// Cross-record checks: presence points at a catalog zone, and every
    /// reservation appears both on the member and on the class roster.
    fn check_links(&self) -> Result<(), SnapshotError> {
        for (id, member) in self.members() {
            if let Some(presence) = &member.current_zone
                && !is_known_zone(&presence.facility, &presence.zone)
            {
                return Err(SnapshotError::DanglingPresence {
                    account: id.to_string(),
                    facility: presence.facility.clone(),
                    zone: presence.zone.clone(),
                });
            }
            for class_id in &member.reserved_classes {
                let on_roster = self
                    .find_class(class_id)
                    .is_some_and(|(_, class)| class.has_participant(id));
                if !on_roster {
                    return Err(mismatch(id, class_id));
                }
            }
        }

        for (_, class) in self.classes() {
            for participant in class.participants() {
                let reserved = self
                    .account(participant)
                    .and_then(|account| account.member().ok())
                    .is_some_and(|member| member.reserved_classes.contains(class.id()));
                if !reserved {
                    return Err(mismatch(participant, class.id()));
                }
            }
        }
        Ok(())
    }

    /// Monotonic save counter; bumped by every committed transaction.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn bump_revision(&mut self) {
        self.revision += 1;
    }

    pub(crate) fn rollback_revision(&mut self) {
        self.revision = self.revision.saturating_sub(1);
    }

    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    pub fn accounts(&self) -> impl Iterator<Item = &Account> {
        self.accounts.values()
    }

    pub fn account(&self, id: &str) -> Option<&Account> {
        self.accounts.get(id)
    }

    pub fn account_mut(&mut self, id: &str) -> Option<&mut Account> {
        self.accounts.get_mut(id)
    }

    /// Insert a new account; identifiers are unique.
    pub fn insert_account(&mut self, account: Account) -> Result<(), GymError> {
        if self.accounts.contains_key(&account.id) {
            return Err(GymError::DuplicateIdentifier(account.id));
        }
        self.accounts.insert(account.id.clone(), account);
        Ok(())
    }

    /// Iterate `(identifier, profile)` for every member account.
    pub fn members(&self) -> impl Iterator<Item = (&str, &MemberProfile)> {
        self.accounts
            .values()
            .filter_map(|a| a.member().ok().map(|m| (a.id.as_str(), m)))
    }

    /// Mutable access to every member profile.
    pub fn members_mut(&mut self) -> impl Iterator<Item = &mut MemberProfile> {
        self.accounts
            .values_mut()
            .filter_map(|a| a.member_mut().ok())
    }

    /// Iterate `(facility_key, class)` over every persisted class session.
    pub fn classes(&self) -> impl Iterator<Item = (&str, &ClassSession)> {
        self.facility_classes
            .iter()
            .flat_map(|(key, classes)| classes.iter().map(move |c| (key.as_str(), c)))
    }

    pub fn classes_at(&self, facility: &str) -> &[ClassSession] {
        self.facility_classes
            .get(facility)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn find_class(&self, id: &str) -> Option<(&str, &ClassSession)> {
        self.classes().find(|(_, c)| c.id() == id)
    }

    /// Rebuild one facility from the catalog plus persisted state.
    pub fn facility(&self, key: &str) -> Option<Facility> {
        let template = catalog().remove(key)?;
        Some(self.hydrate(template))
    }

    /// Rebuild every facility in catalog order.
    pub fn facilities(&self) -> BTreeMap<String, Facility> {
        catalog()
            .into_iter()
            .map(|(key, facility)| (key, self.hydrate(facility)))
            .collect()
    }

    fn hydrate(&self, facility: Facility) -> Facility {
        let classes = self.classes_at(&facility.key).to_vec();
        let mut facility = facility.with_classes(classes);
        for (_, member) in self.members() {
            let Some(presence) = member.current_zone.as_ref() else {
                continue;
            };
            if presence.facility != facility.key {
                continue;
            }
            if let Some(zone) = facility.zone_mut(&presence.zone) {
                zone.try_enter();
            }
        }
        facility
    }

    /// Flatten a facility's classes back into the snapshot.
    ///
    /// Zone counters are dropped; they are derived state.
    pub fn store_facility(&mut self, facility: Facility) {
        let key = facility.key.clone();
        let classes = facility.into_classes();
        if classes.is_empty() {
            self.facility_classes.remove(&key);
        } else {
            self.facility_classes.insert(key, classes);
        }
    }
}

fn mismatch(account: &str, class_id: &str) -> SnapshotError {
    SnapshotError::ReservationMismatch {
        account: account.to_string(),
        class_id: class_id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, TimeZone, Utc};
    use gym_kernel::{ClassCategory, NewClass, PlanId, Trainer, ZonePresence};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 4, 1, 7, 0, 0)
            .single()
            .expect("fixed time")
    }

    fn class(id: &str, capacity: u32) -> ClassSession {
        ClassSession::new(
            id,
            NewClass {
                category: ClassCategory::Fitness,
                trainer: Trainer {
                    name: "Mihai".to_string(),
                    specialization: "HIIT".to_string(),
                },
                duration_minutes: 50,
                capacity,
                start_time: now(),
            },
            "Central Fitness",
        )
    }

    fn checked_in(id: &str, facility: &str, zone: &str) -> Account {
        let mut account = Account::new_member(id, "pw", id, now()).expect("account");
        let member = account.member_mut().expect("member");
        member.activate(PlanId::Monthly, now());
        member.current_zone = Some(ZonePresence {
            facility: facility.to_string(),
            zone: zone.to_string(),
        });
        account
    }

    #[test]
    fn insert_account_rejects_duplicates() {
        let mut snapshot = Snapshot::empty();
        let ana = Account::new_member("ana", "pw", "Ana Pop", now()).expect("account");
        snapshot.insert_account(ana.clone()).expect("first insert");
        assert_eq!(
            snapshot.insert_account(ana),
            Err(GymError::DuplicateIdentifier("ana".to_string()))
        );
        assert_eq!(snapshot.account_count(), 1);
    }

    #[test]
    fn hydration_derives_zone_occupancy_from_members() {
        let snapshot = Snapshot::from_records(
            3,
            vec![
                checked_in("ana", "F1", "Cardio"),
                checked_in("bob", "F1", "Cardio"),
                checked_in("cid", "F2", "Strength"),
            ],
            Vec::new(),
        )
        .expect("snapshot");

        let facilities = snapshot.facilities();
        let f1 = &facilities["F1"];
        assert_eq!(f1.zone("Cardio").expect("cardio").occupancy(), 2);
        assert_eq!(f1.zone("Strength").expect("strength").occupancy(), 0);
        assert_eq!(
            facilities["F2"]
                .zone("Strength")
                .expect("strength")
                .occupancy(),
            1
        );
    }

    #[test]
    fn store_facility_round_trips_classes() {
        let mut snapshot = Snapshot::empty();
        let mut f1 = snapshot.facility("F1").expect("F1");
        f1.add_class(class("aaaa0001", 4));
        snapshot.store_facility(f1);

        assert_eq!(snapshot.classes_at("F1").len(), 1);
        assert_eq!(
            snapshot.find_class("aaaa0001").map(|(key, _)| key),
            Some("F1")
        );

        let mut f1 = snapshot.facility("F1").expect("F1");
        f1.remove_class("aaaa0001").expect("class should exist");
        snapshot.store_facility(f1);
        assert!(snapshot.classes_at("F1").is_empty());
        assert!(snapshot.facility("F9").is_none());
    }

    #[test]
    fn from_records_rejects_structural_corruption() {
        let ana = Account::new_member("ana", "pw", "Ana", now()).expect("account");
        assert_eq!(
            Snapshot::from_records(0, vec![ana.clone(), ana], Vec::new()),
            Err(SnapshotError::DuplicateAccount("ana".to_string()))
        );

        assert_eq!(
            Snapshot::from_records(0, Vec::new(), vec![("F7".to_string(), class("x", 1))]),
            Err(SnapshotError::UnknownFacility("F7".to_string()))
        );

        assert_eq!(
            Snapshot::from_records(
                0,
                Vec::new(),
                vec![
                    ("F1".to_string(), class("dup", 1)),
                    ("F2".to_string(), class("dup", 1)),
                ],
            ),
            Err(SnapshotError::DuplicateClass("dup".to_string()))
        );
    }

    #[test]
    fn from_records_rejects_dangling_presence() {
        assert_eq!(
            Snapshot::from_records(0, vec![checked_in("ana", "F1", "Sauna")], Vec::new()),
            Err(SnapshotError::DanglingPresence {
                account: "ana".to_string(),
                facility: "F1".to_string(),
                zone: "Sauna".to_string(),
            })
        );
        assert!(matches!(
            Snapshot::from_records(0, vec![checked_in("bob", "F8", "Cardio")], Vec::new()),
            Err(SnapshotError::DanglingPresence { .. })
        ));
    }

    #[test]
    fn from_records_requires_reservations_on_both_sides() {
        let mut ana = Account::new_member("ana", "pw", "Ana", now()).expect("account");
        ana.member_mut()
            .expect("member")
            .reserved_classes
            .insert("aaaa0002".to_string());

        let member_only = Snapshot::from_records(
            0,
            vec![ana.clone()],
            vec![("F1".to_string(), class("aaaa0002", 4))],
        );
        assert_eq!(
            member_only,
            Err(SnapshotError::ReservationMismatch {
                account: "ana".to_string(),
                class_id: "aaaa0002".to_string(),
            })
        );

        let vanished_class = Snapshot::from_records(0, vec![ana.clone()], Vec::new());
        assert!(matches!(
            vanished_class,
            Err(SnapshotError::ReservationMismatch { .. })
        ));

        let mut rostered = class("aaaa0003", 4);
        rostered.reserve("ghost");
        assert_eq!(
            Snapshot::from_records(0, Vec::new(), vec![("F1".to_string(), rostered)]),
            Err(SnapshotError::ReservationMismatch {
                account: "ghost".to_string(),
                class_id: "aaaa0003".to_string(),
            })
        );

        let mut both = class("aaaa0002", 4);
        both.reserve("ana");
        let snapshot = Snapshot::from_records(0, vec![ana], vec![("F1".to_string(), both)])
            .expect("consistent reservation");
        assert_eq!(snapshot.classes_at("F1")[0].occupancy(), 1);
    }
}
