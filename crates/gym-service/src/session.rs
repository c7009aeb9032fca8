//! Login sessions.

use chrono::{DateTime, Utc};
use gym_kernel::AccountKind;
use serde::Serialize;

/// Proof of a successful login.
///
/// Only [`crate::Club::login`] hands these out. The session names an
/// account; the account itself is re-read from the snapshot on every call,
/// so a session never carries stale profile data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    account_id: String,
    kind: AccountKind,
    opened_at: DateTime<Utc>,
}

impl Session {
    pub(crate) fn open(account_id: &str, kind: AccountKind, opened_at: DateTime<Utc>) -> Self {
        Self {
            account_id: account_id.to_string(),
            kind,
            opened_at,
        }
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    pub fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }
}
