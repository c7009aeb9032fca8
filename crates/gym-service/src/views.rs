//! Read-only projections returned by the façade.

use chrono::{DateTime, Utc};
use gym_kernel::{ClassCategory, ClassSession, Facility, Trainer, Zone};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneView {
    pub key: String,
    pub name: String,
    pub schedule: String,
    pub occupancy: u32,
    pub capacity: u32,
    pub occupancy_rate: f64,
    pub available: bool,
}

impl ZoneView {
    pub fn new(key: &str, zone: &Zone) -> Self {
        Self {
            key: key.to_string(),
            name: zone.name.clone(),
            schedule: zone.schedule.clone(),
            occupancy: zone.occupancy(),
            capacity: zone.capacity(),
            occupancy_rate: zone.occupancy_rate(),
            available: zone.can_enter(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacilityView {
    pub key: String,
    pub name: String,
    pub address: String,
    pub zones: Vec<ZoneView>,
    pub class_count: usize,
}

impl From<&Facility> for FacilityView {
    fn from(facility: &Facility) -> Self {
        Self {
            key: facility.key.clone(),
            name: facility.name.clone(),
            address: facility.address.clone(),
            zones: facility
                .zones()
                .map(|(key, zone)| ZoneView::new(key, zone))
                .collect(),
            class_count: facility.classes().len(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassView {
    pub id: String,
    pub facility: String,
    pub category: ClassCategory,
    pub trainer: Trainer,
    pub duration_minutes: u32,
    pub start_time: DateTime<Utc>,
    pub room: String,
    pub enrolled: u32,
    pub capacity: u32,
    pub occupancy_rate: f64,
    pub available: bool,
}

impl ClassView {
    pub fn new(facility: &str, class: &ClassSession) -> Self {
        Self {
            id: class.id().to_string(),
            facility: facility.to_string(),
            category: class.category,
            trainer: class.trainer.clone(),
            duration_minutes: class.duration_minutes,
            start_time: class.start_time,
            room: class.room.clone(),
            enrolled: class.occupancy(),
            capacity: class.capacity(),
            occupancy_rate: class.occupancy_rate(),
            available: class.can_reserve(),
        }
    }
}

impl fmt::Display for ClassView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}  {:<8} {}  {} ({})  {}min  {} @ {}  {}/{}",
            self.id,
            self.category,
            self.start_time.format("%Y-%m-%d %H:%M"),
            self.trainer.name,
            self.trainer.specialization,
            self.duration_minutes,
            self.room,
            self.facility,
            self.enrolled,
            self.capacity
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoneOccupancy {
    pub facility: String,
    pub zone: String,
    pub occupancy: u32,
    pub capacity: u32,
    pub occupancy_rate: f64,
}

/// Operator dashboard figures.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub active_members: usize,
    pub total_members: usize,
    /// Percentage of members whose membership is currently active.
    pub activation_rate: f64,
    pub zones: Vec<ZoneOccupancy>,
    pub total_classes: usize,
    pub total_participants: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassScheduled {
    pub class_id: String,
    pub facility: String,
    pub room: String,
}

impl fmt::Display for ClassScheduled {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class {} scheduled in {} at {}",
            self.class_id, self.room, self.facility
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassRemoved {
    pub class_id: String,
    pub facility: String,
    /// Members whose reservation was dropped along with the class.
    pub released: Vec<String>,
}

impl fmt::Display for ClassRemoved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "class {} removed from {} ({} reservation(s) released)",
            self.class_id,
            self.facility,
            self.released.len()
        )
    }
}
