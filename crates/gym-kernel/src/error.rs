//! Error types for gymkeep domain operations.

/// Recoverable domain failures.
///
/// Every variant is reported to the caller as a typed failure; none of them
/// leave partially applied state behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GymError {
    /// An account with this identifier already exists.
    #[error("identifier already registered: {0}")]
    DuplicateIdentifier(String),

    /// Unknown identifier or wrong secret. Deliberately does not say which.
    #[error("invalid identifier or secret")]
    InvalidCredentials,

    /// A session refers to an account that no longer exists.
    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("unknown plan: {0}")]
    UnknownPlan(String),

    #[error("unknown facility: {0}")]
    UnknownFacility(String),

    #[error("unknown zone `{zone}` at facility {facility}")]
    UnknownZone { facility: String, zone: String },

    /// The zone is at capacity; occupancy is reported for display.
    #[error("{zone} is full ({occupancy}/{capacity})")]
    ZoneFull {
        zone: String,
        occupancy: u32,
        capacity: u32,
    },

    #[error("already checked in to {zone} at {facility}; check out first")]
    AlreadyCheckedIn { facility: String, zone: String },

    #[error("not checked in to any zone")]
    NotCheckedIn,

    /// Check-out was requested against a facility other than the recorded one.
    #[error("checked in to {zone} at {facility}, not at {requested}")]
    CheckedInElsewhere {
        facility: String,
        zone: String,
        requested: String,
    },

    #[error("membership is not active")]
    MembershipNotActive,

    #[error("no membership to cancel")]
    NoActiveMembership,

    #[error("only members can perform this operation")]
    NotAMember,

    #[error("only operators can perform this operation")]
    NotAnOperator,

    #[error("class not found: {0}")]
    ClassNotFound(String),

    #[error("already reserved a place in class {0}")]
    AlreadyReserved(String),

    #[error("class {class_id} is full ({capacity}/{capacity})")]
    ClassFull { class_id: String, capacity: u32 },

    #[error("no reservation for class {0}")]
    NoSuchReservation(String),

    #[error("invalid {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl GymError {
    /// Stable machine-readable failure class.
    pub fn failure_class(&self) -> &'static str {
        match self {
            Self::DuplicateIdentifier(_) => "duplicate_identifier",
            Self::InvalidCredentials => "invalid_credentials",
            Self::AccountNotFound(_) => "account_not_found",
            Self::UnknownPlan(_) => "unknown_plan",
            Self::UnknownFacility(_) => "unknown_facility",
            Self::UnknownZone { .. } => "unknown_zone",
            Self::ZoneFull { .. } => "zone_full",
            Self::AlreadyCheckedIn { .. } => "already_checked_in",
            Self::NotCheckedIn => "not_checked_in",
            Self::CheckedInElsewhere { .. } => "checked_in_elsewhere",
            Self::MembershipNotActive => "membership_not_active",
            Self::NoActiveMembership => "no_active_membership",
            Self::NotAMember => "not_a_member",
            Self::NotAnOperator => "not_an_operator",
            Self::ClassNotFound(_) => "class_not_found",
            Self::AlreadyReserved(_) => "already_reserved",
            Self::ClassFull { .. } => "class_full",
            Self::NoSuchReservation(_) => "no_such_reservation",
            Self::InvalidField { .. } => "invalid_field",
        }
    }

    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            field,
            reason: reason.into(),
        }
    }
}
