//! Facilities: a fixed set of zones plus a dynamic list of class sessions.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::class_session::ClassSession;
use crate::zone::Zone;

/// Static description of one zone in the built-in catalog.
#[derive(Debug, Clone, Copy)]
pub struct ZoneTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub schedule: &'static str,
    pub capacity: u32,
}

/// Static description of one facility in the built-in catalog.
#[derive(Debug, Clone, Copy)]
pub struct FacilityTemplate {
    pub key: &'static str,
    pub name: &'static str,
    pub address: &'static str,
}

pub const ZONE_TEMPLATES: [ZoneTemplate; 3] = [
    ZoneTemplate {
        key: "Cardio",
        name: "Cardio Zone",
        schedule: "06:00 - 12:00",
        capacity: 25,
    },
    ZoneTemplate {
        key: "Strength",
        name: "Strength Zone",
        schedule: "12:00 - 19:00",
        capacity: 20,
    },
    ZoneTemplate {
        key: "Calisthenics",
        name: "Calisthenics Zone",
        schedule: "18:00 - 23:00",
        capacity: 15,
    },
];

pub const FACILITY_TEMPLATES: [FacilityTemplate; 3] = [
    FacilityTemplate {
        key: "F1",
        name: "Central Fitness",
        address: "10 Victoriei Street",
    },
    FacilityTemplate {
        key: "F2",
        name: "North Fitness",
        address: "25 Aviatorilor Boulevard",
    },
    FacilityTemplate {
        key: "F3",
        name: "South Fitness",
        address: "150 Vacaresti Road",
    },
];

/// A physical gym location.
///
/// The zone map is fixed at construction; classes come and go.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Facility {
    pub key: String,
    pub name: String,
    pub address: String,
    zones: BTreeMap<String, Zone>,
    classes: Vec<ClassSession>,
}

impl Facility {
    pub fn from_template(template: &FacilityTemplate) -> Self {
        let zones = ZONE_TEMPLATES
            .iter()
            .map(|z| (z.key.to_string(), Zone::new(z.name, z.schedule, z.capacity)))
            .collect();
        Self {
            key: template.key.to_string(),
            name: template.name.to_string(),
            address: template.address.to_string(),
            zones,
            classes: Vec::new(),
        }
    }

    pub fn zones(&self) -> impl Iterator<Item = (&str, &Zone)> {
        self.zones.iter().map(|(k, z)| (k.as_str(), z))
    }

    pub fn zone(&self, key: &str) -> Option<&Zone> {
        self.zones.get(key)
    }

    pub fn zone_mut(&mut self, key: &str) -> Option<&mut Zone> {
        self.zones.get_mut(key)
    }

    pub fn classes(&self) -> &[ClassSession] {
        &self.classes
    }

    pub fn class(&self, id: &str) -> Option<&ClassSession> {
        self.classes.iter().find(|c| c.id() == id)
    }

    pub fn class_mut(&mut self, id: &str) -> Option<&mut ClassSession> {
        self.classes.iter_mut().find(|c| c.id() == id)
    }

    pub fn add_class(&mut self, class: ClassSession) {
        self.classes.push(class);
    }

    pub fn remove_class(&mut self, id: &str) -> Option<ClassSession> {
        let index = self.classes.iter().position(|c| c.id() == id)?;
        Some(self.classes.remove(index))
    }

    /// Hand the class list back to the caller, consuming the facility.
    pub fn into_classes(self) -> Vec<ClassSession> {
        self.classes
    }

    /// Replace the class list wholesale (used when rebuilding from storage).
    pub fn with_classes(mut self, classes: Vec<ClassSession>) -> Self {
        self.classes = classes;
        self
    }
}

/// Build the fixed facility catalog, keyed by facility key.
pub fn catalog() -> BTreeMap<String, Facility> {
    FACILITY_TEMPLATES
        .iter()
        .map(|t| (t.key.to_string(), Facility::from_template(t)))
        .collect()
}

pub fn is_known_facility(key: &str) -> bool {
    FACILITY_TEMPLATES.iter().any(|t| t.key == key)
}

/// True when `zone` is one of the catalog zones of facility `facility`.
pub fn is_known_zone(facility: &str, zone: &str) -> bool {
    is_known_facility(facility) && ZONE_TEMPLATES.iter().any(|z| z.key == zone)
}
