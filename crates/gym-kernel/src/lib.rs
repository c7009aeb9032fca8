//! # gym-kernel
//!
//! Domain state and invariants for a small fitness-club chain.
//!
//! This crate is pure: it owns no files and never reads the clock. Every
//! time-dependent operation takes `now` from the caller.
//!
//! ## Architecture
//!
//! ```text
//! Account               ← identity + credential, Role = Member | Operator
//!     │
//! MemberProfile         ← membership lifecycle, visits, presence, reservations
//!     │
//! Plan                  ← static catalog (monthly / annual)
//!
//! Facility              ← fixed zones + dynamic class sessions
//!     ├── Zone          ← capacity-bounded occupancy counter
//!     └── ClassSession  ← capacity-bounded roster
//! ```

pub mod account;
pub mod class_session;
pub mod error;
pub mod facility;
pub mod membership;
pub mod plan;
pub mod zone;

pub use account::{
    Account, AccountKind, Credential, DEFAULT_ACCESS_LEVEL, OperatorProfile, Role,
    validate_identifier,
};
pub use class_session::{CLASS_ID_LEN, ClassCategory, ClassSession, NewClass, Trainer, new_class_id};
pub use error::GymError;
pub use facility::{
    FACILITY_TEMPLATES, Facility, ZONE_TEMPLATES, is_known_facility, is_known_zone,
};
pub use membership::{Activation, MemberProfile, MembershipStatus, VisitOutcome, ZonePresence};
pub use plan::{Plan, PlanId, plan, plan_by_name};
pub use zone::Zone;
