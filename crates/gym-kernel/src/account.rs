//! Accounts: identity, credential verification and role payloads.
//!
//! Members and operators share identity and credential behaviour; the
//! role-specific state lives in [`Role`], a tagged union serialised with a
//! `kind` discriminator.

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use crate::error::GymError;
use crate::membership::MemberProfile;

pub const DEFAULT_ACCESS_LEVEL: &str = "standard";

fn identifier_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._-]{1,64}$").expect("identifier regex must compile")
    })
}

/// Validate an account identifier.
pub fn validate_identifier(id: &str) -> Result<(), GymError> {
    if identifier_re().is_match(id) {
        Ok(())
    } else {
        Err(GymError::invalid(
            "identifier",
            "expected 1-64 characters from [A-Za-z0-9._-]",
        ))
    }
}

/// One-way digest of a secret (lowercase hex SHA-256).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credential(String);

impl Credential {
    pub fn from_secret(secret: &str) -> Result<Self, GymError> {
        if secret.is_empty() {
            return Err(GymError::invalid("secret", "must not be empty"));
        }
        Ok(Self(digest(secret)))
    }

    pub fn verify(&self, secret: &str) -> bool {
        self.0 == digest(secret)
    }

    pub fn as_hex(&self) -> &str {
        &self.0
    }
}

fn digest(secret: &str) -> String {
    let hash = Sha256::digest(secret.as_bytes());
    format!("{hash:x}")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Member,
    Operator,
}

impl AccountKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Member => "member",
            Self::Operator => "operator",
        }
    }
}

impl fmt::Display for AccountKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperatorProfile {
    #[serde(default = "default_access_level")]
    pub access_level: String,
}

fn default_access_level() -> String {
    DEFAULT_ACCESS_LEVEL.to_string()
}

/// Role-specific payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Role {
    Member(MemberProfile),
    Operator(OperatorProfile),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    pub id: String,
    pub display_name: String,
    credential: Credential,
    pub created_at: DateTime<Utc>,
    #[serde(flatten)]
    pub role: Role,
}

impl Account {
    pub fn new_member(
        id: impl Into<String>,
        secret: &str,
        display_name: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, GymError> {
        Self::new(
            id.into(),
            secret,
            display_name.into(),
            now,
            Role::Member(MemberProfile::default()),
        )
    }

    pub fn new_operator(
        id: impl Into<String>,
        secret: &str,
        display_name: impl Into<String>,
        access_level: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, GymError> {
        let access_level = access_level.into();
        let access_level = if access_level.trim().is_empty() {
            default_access_level()
        } else {
            access_level
        };
        Self::new(
            id.into(),
            secret,
            display_name.into(),
            now,
            Role::Operator(OperatorProfile { access_level }),
        )
    }

    fn new(
        id: String,
        secret: &str,
        display_name: String,
        now: DateTime<Utc>,
        role: Role,
    ) -> Result<Self, GymError> {
        validate_identifier(&id)?;
        Ok(Self {
            id,
            display_name,
            credential: Credential::from_secret(secret)?,
            created_at: now,
            role,
        })
    }

    pub fn kind(&self) -> AccountKind {
        match self.role {
            Role::Member(_) => AccountKind::Member,
            Role::Operator(_) => AccountKind::Operator,
        }
    }

    pub fn verify(&self, secret: &str) -> bool {
        self.credential.verify(secret)
    }

    /// Replace the credential after verifying the old secret.
    pub fn change_credential(&mut self, old: &str, new: &str) -> Result<(), GymError> {
        if !self.verify(old) {
            return Err(GymError::InvalidCredentials);
        }
        self.credential = Credential::from_secret(new)?;
        Ok(())
    }

    pub fn member(&self) -> Result<&MemberProfile, GymError> {
        match &self.role {
            Role::Member(profile) => Ok(profile),
            Role::Operator(_) => Err(GymError::NotAMember),
        }
    }

    pub fn member_mut(&mut self) -> Result<&mut MemberProfile, GymError> {
        match &mut self.role {
            Role::Member(profile) => Ok(profile),
            Role::Operator(_) => Err(GymError::NotAMember),
        }
    }

    pub fn require_operator(&self) -> Result<&OperatorProfile, GymError> {
        match &self.role {
            Role::Operator(profile) => Ok(profile),
            Role::Member(_) => Err(GymError::NotAnOperator),
        }
    }

    /// Role-specific string projection for display.
    pub fn describe(&self, now: DateTime<Utc>) -> BTreeMap<String, String> {
        const NA: &str = "N/A";
        let mut out = BTreeMap::new();
        out.insert("identifier".to_string(), self.id.clone());
        out.insert("displayName".to_string(), self.display_name.clone());
        out.insert("role".to_string(), self.kind().to_string());
        out.insert(
            "createdAt".to_string(),
            self.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        );

        match &self.role {
            Role::Member(member) => {
                out.insert(
                    "status".to_string(),
                    member.effective_status(now).to_string(),
                );
                out.insert(
                    "plan".to_string(),
                    member
                        .plan
                        .map_or_else(|| NA.to_string(), |p| p.to_string()),
                );
                out.insert(
                    "expiry".to_string(),
                    member.expiry.map_or_else(
                        || NA.to_string(),
                        |e| e.format("%Y-%m-%d").to_string(),
                    ),
                );
                out.insert("visits".to_string(), member.visits.len().to_string());
                out.insert(
                    "reservations".to_string(),
                    member.reserved_classes.len().to_string(),
                );
                out.insert(
                    "currentZone".to_string(),
                    member
                        .current_zone
                        .as_ref()
                        .map_or_else(|| NA.to_string(), |z| z.zone.clone()),
                );
                out.insert(
                    "preferredFacility".to_string(),
                    member
                        .preferred_facility
                        .clone()
                        .unwrap_or_else(|| NA.to_string()),
                );
            }
            Role::Operator(operator) => {
                out.insert("accessLevel".to_string(), operator.access_level.clone());
                out.insert("roleLabel".to_string(), "Administrator".to_string());
            }
        }
        out
    }
}
