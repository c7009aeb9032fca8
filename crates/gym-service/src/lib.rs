//! # gym-service
//!
//! The operation façade for gymkeep.
//!
//! [`Club`] exposes every user-facing operation: registration, login,
//! membership lifecycle, zone check-in/out, class scheduling and
//! reservations, and the read-only projections. Each mutating call runs as a
//! single lock-scoped store transaction, so concurrent callers (threads or
//! processes sharing one snapshot file) never lose updates and never push a
//! zone or class past capacity.
//!
//! ```text
//! Club (façade, one transaction per call)
//!   ├── coordinator   ← member ⇄ facility pairs (presence, reservations)
//!   ├── gym-kernel    ← entities and invariants
//!   └── gym-store     ← JSONL snapshot + lock
//! ```

pub mod clock;
pub mod club;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod session;
pub mod views;

pub use clock::{Clock, ManualClock, SystemClock};
pub use club::Club;
pub use config::{
    ClubConfig, ConfigError, DEFAULT_CONFIG_PATH, DEFAULT_STORE_PATH, LockConfig, STORE_PATH_ENV,
};
pub use coordinator::{CheckInReceipt, CheckOutReceipt, ReservationReceipt};
pub use error::ClubError;
pub use session::Session;
pub use views::{
    ClassRemoved, ClassScheduled, ClassView, FacilityView, Statistics, ZoneOccupancy, ZoneView,
};
