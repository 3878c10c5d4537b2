//! Well-known role names and the acting identity.
//!
//! Authentication happens elsewhere; the console only ever receives an
//! already-resolved [`Actor`].

use serde::{Deserialize, Serialize};

pub const ROLE_OWNER: &str = "owner";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_CURATOR: &str = "curator";
pub const ROLE_SME: &str = "sme";
pub const ROLE_VIEWER: &str = "viewer";

/// Roles allowed to run workflow actions on unassigned items.
pub const CURATING_ROLES: &[&str] = &[ROLE_OWNER, ROLE_ADMIN, ROLE_CURATOR, ROLE_SME];

/// Roles that may act on items regardless of assignment.
pub const PRIVILEGED_ROLES: &[&str] = &[ROLE_OWNER, ROLE_ADMIN];

/// Returns `true` if the role may act on unassigned items.
pub fn is_curating_role(role: &str) -> bool {
    CURATING_ROLES.contains(&role)
}

/// Returns `true` if the role overrides assignment restrictions.
pub fn is_privileged_role(role: &str) -> bool {
    PRIVILEGED_ROLES.contains(&role)
}

/// The authenticated identity performing an action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub role: String,
}

impl Actor {
    pub fn new(id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            email: None,
            role: role.into(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn is_privileged(&self) -> bool {
        is_privileged_role(&self.role)
    }

    pub fn can_curate(&self) -> bool {
        is_curating_role(&self.role)
    }
}
