//! Member account records as seen by the pipeline.

use crate::domain::error::{codes, MemberError, MemberResult};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Member role, ordered from least to most privileged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[default]
    Basic,
    Standard,
    Premium,
    Manager,
    Admin,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Basic => "BASIC",
            Self::Standard => "STANDARD",
            Self::Premium => "PREMIUM",
            Self::Manager => "MANAGER",
            Self::Admin => "ADMIN",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MemberStatus {
    #[default]
    Normal,
    Sleeping,
    Banned,
    Deregistered,
}

/// Where the account was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Agency {
    #[default]
    Direct,
    Google,
}

/// Authenticated member account.
///
/// `id` is the login handle and the token subject; `nickname` is the public
/// handle and is unique as well. Timestamps are seconds since epoch.
#[derive(Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub nickname: String,
    pub name: String,
    pub credential_hash: Option<String>,
    pub status: MemberStatus,
    pub role: Role,
    pub agency: Agency,
    pub joined_at: u64,
    pub last_login_at: Option<u64>,
    pub deregistered_at: Option<u64>,
}

impl Principal {
    pub fn new(id: impl Into<String>, nickname: impl Into<String>, joined_at: u64) -> Self {
        Self {
            id: id.into(),
            nickname: nickname.into(),
            name: String::new(),
            credential_hash: None,
            status: MemberStatus::Normal,
            role: Role::Basic,
            agency: Agency::Direct,
            joined_at,
            last_login_at: None,
            deregistered_at: None,
        }
    }

    /// Reject accounts that may not hold a session.
    pub fn ensure_loginable(&self) -> MemberResult<()> {
        let code = match self.status {
            MemberStatus::Normal => return Ok(()),
            MemberStatus::Banned => codes::M_BANNED_MEMBER,
            MemberStatus::Deregistered => codes::M_DEREGISTERED_MEMBER,
            MemberStatus::Sleeping => codes::M_SLEEPING_MEMBER,
        };
        Err(MemberError::authorization(format!(
            "member '{}' is {:?}",
            self.id, self.status
        ))
        .with_code(code))
    }

    pub fn has_role(&self, minimum: Role) -> bool {
        self.role >= minimum
    }

    pub fn view(&self) -> MemberView {
        MemberView::from(self)
    }
}

// Keeps the credential hash out of logs.
impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("nickname", &self.nickname)
            .field("status", &self.status)
            .field("role", &self.role)
            .field("agency", &self.agency)
            .finish_non_exhaustive()
    }
}

/// Outward representation of a member; never carries the credential hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberView {
    pub id: String,
    pub nickname: String,
    pub name: String,
    pub status: MemberStatus,
    pub role: Role,
    pub agency: Agency,
    pub joined_at: String,
    pub last_login_at: Option<String>,
}

impl From<&Principal> for MemberView {
    fn from(p: &Principal) -> Self {
        Self {
            id: p.id.clone(),
            nickname: p.nickname.clone(),
            name: p.name.clone(),
            status: p.status,
            role: p.role,
            agency: p.agency,
            joined_at: rfc3339(p.joined_at),
            last_login_at: p.last_login_at.map(rfc3339),
        }
    }
}

/// RFC 3339 rendering of seconds since epoch.
pub fn rfc3339(secs: u64) -> String {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Secs, true))
        .unwrap_or_default()
}
