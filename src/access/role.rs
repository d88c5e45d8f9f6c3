use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::database::models::user::User;

/// The three access tiers of the archive. They are not ranked: each carries its own capability set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Unrestricted read and write over every unit.
    Admin,
    /// Unit manager: reads own unit plus public documents, writes own unit only.
    Pengelola,
    /// Staff: same read scope as a pengelola, no write capability.
    Staf,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Pengelola => "pengelola",
            Role::Staf => "staf",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "pengelola" => Ok(Role::Pengelola),
            "staf" => Ok(Role::Staf),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}

/// Identity of the caller as seen by the access predicates.
///
/// Every operation takes this explicitly; nothing in the core reads ambient session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    pub user_id: i64,
    pub role: Role,
    pub opd_id: Option<i64>,
}

impl Requester {
    pub fn new(user_id: i64, role: Role, opd_id: Option<i64>) -> Self {
        Self { user_id, role, opd_id }
    }

    /// Unit the requester is scoped to. Admins are never unit-scoped even if a stale reference remains.
    pub fn scoped_opd(&self) -> Option<i64> {
        if self.role.is_admin() {
            None
        } else {
            self.opd_id
        }
    }
}

impl From<&User> for Requester {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.role, user.opd_id)
    }
}
