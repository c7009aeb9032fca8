//! Scheduled, capacity-bounded group classes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::GymError;

/// Length of a generated class identifier.
pub const CLASS_ID_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassCategory {
    Fitness,
    Pilates,
    Yoga,
}

impl ClassCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Fitness => "fitness",
            Self::Pilates => "pilates",
            Self::Yoga => "yoga",
        }
    }
}

impl fmt::Display for ClassCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ClassCategory {
    type Err = GymError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fitness" => Ok(Self::Fitness),
            "pilates" => Ok(Self::Pilates),
            "yoga" => Ok(Self::Yoga),
            other => Err(GymError::invalid(
                "category",
                format!("expected fitness, pilates or yoga (got `{other}`)"),
            )),
        }
    }
}

/// Trainer descriptor. A plain value with no identity of its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trainer {
    pub name: String,
    pub specialization: String,
}

/// Everything an operator supplies when scheduling a class.
#[derive(Debug, Clone)]
pub struct NewClass {
    pub category: ClassCategory,
    pub trainer: Trainer,
    pub duration_minutes: u32,
    pub capacity: u32,
    pub start_time: DateTime<Utc>,
}

impl NewClass {
    pub fn validate(&self) -> Result<(), GymError> {
        if self.duration_minutes == 0 {
            return Err(GymError::invalid("duration", "must be at least one minute"));
        }
        if self.capacity == 0 {
            return Err(GymError::invalid("capacity", "must be at least one"));
        }
        if self.trainer.name.trim().is_empty() {
            return Err(GymError::invalid("trainer name", "must not be empty"));
        }
        Ok(())
    }
}

/// A class session and its roster.
///
/// Invariants: the roster holds unique member identifiers and never grows
/// past `capacity`; `id` is assigned once and never changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSession {
    id: String,
    pub category: ClassCategory,
    pub trainer: Trainer,
    pub duration_minutes: u32,
    capacity: u32,
    pub start_time: DateTime<Utc>,
    pub room: String,
    #[serde(default)]
    participants: Vec<String>,
}

impl ClassSession {
    pub fn new(id: impl Into<String>, details: NewClass, room: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            category: details.category,
            trainer: details.trainer,
            duration_minutes: details.duration_minutes,
            capacity: details.capacity,
            start_time: details.start_time,
            room: room.into(),
            participants: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn participants(&self) -> &[String] {
        &self.participants
    }

    pub fn occupancy(&self) -> u32 {
        u32::try_from(self.participants.len()).unwrap_or(u32::MAX)
    }

    pub fn has_participant(&self, member_id: &str) -> bool {
        self.participants.iter().any(|p| p == member_id)
    }

    pub fn can_reserve(&self) -> bool {
        self.occupancy() < self.capacity
    }

    /// Add a member to the roster. False (and no change) if the member is
    /// already enrolled or the roster is full.
    pub fn reserve(&mut self, member_id: &str) -> bool {
        if self.has_participant(member_id) || !self.can_reserve() {
            return false;
        }
        self.participants.push(member_id.to_string());
        true
    }

    /// Remove a member from the roster; reports whether anything was removed.
    pub fn cancel(&mut self, member_id: &str) -> bool {
        let before = self.participants.len();
        self.participants.retain(|p| p != member_id);
        self.participants.len() != before
    }

    pub fn occupancy_rate(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(self.occupancy()) / f64::from(self.capacity) * 100.0
    }

    /// Check the roster invariants on a session decoded from storage.
    pub fn check_roster(&self) -> Result<(), String> {
        if self.occupancy() > self.capacity {
            return Err(format!(
                "class {} has {} participants over capacity {}",
                self.id,
                self.participants.len(),
                self.capacity
            ));
        }
        for (index, participant) in self.participants.iter().enumerate() {
            if self.participants[..index].contains(participant) {
                return Err(format!(
                    "class {} lists participant {participant} twice",
                    self.id
                ));
            }
        }
        Ok(())
    }
}

/// Generate a fresh short class identifier.
pub fn new_class_id() -> String {
    let mut id = uuid::Uuid::new_v4().simple().to_string();
    id.truncate(CLASS_ID_LEN);
    id
}
