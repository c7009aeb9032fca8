//! Cross-entity operations: zone presence and class reservations.
//!
//! Each function touches both a member profile and a facility, and either
//! updates both sides or neither. The façade runs them inside one store
//! transaction, so the pair is also persisted together. Membership status is
//! gated by the caller before the facility is resolved.

use chrono::{DateTime, Utc};
use gym_kernel::{ClassCategory, Facility, GymError, MemberProfile, ZonePresence};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInReceipt {
    pub facility: String,
    pub facility_name: String,
    pub zone: String,
    pub zone_name: String,
    pub occupancy: u32,
    pub capacity: u32,
}

impl fmt::Display for CheckInReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "checked in to {} at {} ({}/{})",
            self.zone_name, self.facility_name, self.occupancy, self.capacity
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckOutReceipt {
    pub facility: String,
    pub zone: String,
    pub zone_name: String,
    pub occupancy: u32,
}

impl fmt::Display for CheckOutReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "checked out of {} ({} still inside)",
            self.zone_name, self.occupancy
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReservationReceipt {
    pub class_id: String,
    pub facility: String,
    pub category: ClassCategory,
    pub start_time: DateTime<Utc>,
    pub enrolled: u32,
    pub capacity: u32,
}

impl fmt::Display for ReservationReceipt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "reserved {} class {} on {} ({}/{})",
            self.category,
            self.class_id,
            self.start_time.format("%Y-%m-%d %H:%M"),
            self.enrolled,
            self.capacity
        )
    }
}

/// Enter a zone. Requires no current presence.
pub fn check_in(
    member: &mut MemberProfile,
    facility: &mut Facility,
    zone_key: &str,
) -> Result<CheckInReceipt, GymError> {
    if let Some(presence) = &member.current_zone {
        return Err(GymError::AlreadyCheckedIn {
            facility: presence.facility.clone(),
            zone: presence.zone.clone(),
        });
    }

    let facility_key = facility.key.clone();
    let facility_name = facility.name.clone();
    let zone = facility
        .zone_mut(zone_key)
        .ok_or_else(|| GymError::UnknownZone {
            facility: facility_key.clone(),
            zone: zone_key.to_string(),
        })?;
    if !zone.try_enter() {
        return Err(GymError::ZoneFull {
            zone: zone.name.clone(),
            occupancy: zone.occupancy(),
            capacity: zone.capacity(),
        });
    }

    member.current_zone = Some(ZonePresence {
        facility: facility_key.clone(),
        zone: zone_key.to_string(),
    });
    member.preferred_facility = Some(facility_key.clone());

    Ok(CheckInReceipt {
        facility: facility_key,
        facility_name,
        zone: zone_key.to_string(),
        zone_name: zone.name.clone(),
        occupancy: zone.occupancy(),
        capacity: zone.capacity(),
    })
}

/// Leave the current zone. `facility` must be the one the member is in.
pub fn check_out(
    member: &mut MemberProfile,
    facility: &mut Facility,
) -> Result<CheckOutReceipt, GymError> {
    let Some(presence) = member.current_zone.clone() else {
        return Err(GymError::NotCheckedIn);
    };
    if presence.facility != facility.key {
        return Err(GymError::CheckedInElsewhere {
            facility: presence.facility,
            zone: presence.zone,
            requested: facility.key.clone(),
        });
    }

    let zone = facility
        .zone_mut(&presence.zone)
        .ok_or_else(|| GymError::UnknownZone {
            facility: presence.facility.clone(),
            zone: presence.zone.clone(),
        })?;
    zone.leave();
    member.current_zone = None;

    Ok(CheckOutReceipt {
        facility: presence.facility,
        zone: presence.zone,
        zone_name: zone.name.clone(),
        occupancy: zone.occupancy(),
    })
}

/// Put `member_id` on a class roster and record the reservation.
pub fn reserve_class(
    member_id: &str,
    member: &mut MemberProfile,
    facility: &mut Facility,
    class_id: &str,
) -> Result<ReservationReceipt, GymError> {
    let facility_key = facility.key.clone();
    let class = facility
        .class_mut(class_id)
        .ok_or_else(|| GymError::ClassNotFound(class_id.to_string()))?;

    if class.has_participant(member_id) {
        return Err(GymError::AlreadyReserved(class_id.to_string()));
    }
    if !class.reserve(member_id) {
        return Err(GymError::ClassFull {
            class_id: class_id.to_string(),
            capacity: class.capacity(),
        });
    }
    member.reserved_classes.insert(class_id.to_string());

    Ok(ReservationReceipt {
        class_id: class_id.to_string(),
        facility: facility_key,
        category: class.category,
        start_time: class.start_time,
        enrolled: class.occupancy(),
        capacity: class.capacity(),
    })
}

/// Take `member_id` off a class roster. Membership status is not checked.
pub fn cancel_reservation(
    member_id: &str,
    member: &mut MemberProfile,
    facility: &mut Facility,
    class_id: &str,
) -> Result<(), GymError> {
    let class = facility
        .class_mut(class_id)
        .ok_or_else(|| GymError::ClassNotFound(class_id.to_string()))?;
    if !class.cancel(member_id) {
        return Err(GymError::NoSuchReservation(class_id.to_string()));
    }
    member.reserved_classes.remove(class_id);
    Ok(())
}
