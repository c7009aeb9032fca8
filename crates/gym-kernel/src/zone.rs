//! Capacity-bounded occupancy counter.

use serde::Serialize;

/// A physical area inside a facility, tracked only by an occupancy counter.
///
/// Invariant: `0 <= occupancy <= capacity`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Zone {
    pub name: String,
    pub schedule: String,
    capacity: u32,
    occupancy: u32,
}

impl Zone {
    pub fn new(name: impl Into<String>, schedule: impl Into<String>, capacity: u32) -> Self {
        Self {
            name: name.into(),
            schedule: schedule.into(),
            capacity,
            occupancy: 0,
        }
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    pub fn occupancy(&self) -> u32 {
        self.occupancy
    }

    pub fn can_enter(&self) -> bool {
        self.occupancy < self.capacity
    }

    /// Admit one person if there is room.
    pub fn try_enter(&mut self) -> bool {
        if !self.can_enter() {
            return false;
        }
        self.occupancy += 1;
        true
    }

    /// Release one person. No-op on an empty zone.
    pub fn leave(&mut self) {
        self.occupancy = self.occupancy.saturating_sub(1);
    }

    /// Occupancy as a percentage of capacity; 0 for a zero-capacity zone.
    pub fn occupancy_rate(&self) -> f64 {
        if self.capacity == 0 {
            return 0.0;
        }
        f64::from(self.occupancy) / f64::from(self.capacity) * 100.0
    }
}
