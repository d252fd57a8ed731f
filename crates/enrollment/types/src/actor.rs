//! Actors: who is asking the engine to do something
//!
//! Every call carries its actor explicitly; the engine keeps no
//! session state. The role determines which edges of the transition
//! table are open, and the identity is checked on self-only edges.

use crate::ActorId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// The roles the surrounding application knows about.
///
/// Only student, admin, dean, and registrar appear in the transition
/// table. Superadmin inherits admin's edges; cashier acts on the Fee
/// Ledger collaborator, never on enrollment status directly.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActorRole {
    Student,
    Admin,
    Dean,
    Registrar,
    Superadmin,
    Cashier,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
            Self::Dean => "dean",
            Self::Registrar => "registrar",
            Self::Superadmin => "superadmin",
            Self::Cashier => "cashier",
        }
    }

    /// Whether this role carries admin privileges on the transition table
    pub fn acts_as_admin(&self) -> bool {
        matches!(self, Self::Admin | Self::Superadmin)
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ActorRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Self::Student),
            "admin" => Ok(Self::Admin),
            "dean" => Ok(Self::Dean),
            "registrar" => Ok(Self::Registrar),
            "superadmin" => Ok(Self::Superadmin),
            "cashier" => Ok(Self::Cashier),
            other => Err(format!(
                "unknown role '{}'; expected one of: student, admin, dean, registrar, superadmin, cashier",
                other
            )),
        }
    }
}

/// The actor behind a request: role plus identity
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub role: ActorRole,
    pub id: ActorId,
}

impl Actor {
    pub fn new(role: ActorRole, id: impl Into<String>) -> Self {
        Self {
            role,
            id: ActorId::new(id),
        }
    }
}

impl fmt::Display for Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.role, self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [
            ActorRole::Student,
            ActorRole::Admin,
            ActorRole::Dean,
            ActorRole::Registrar,
            ActorRole::Superadmin,
            ActorRole::Cashier,
        ] {
            assert_eq!(role.as_str().parse::<ActorRole>().unwrap(), role);
        }
    }

    #[test]
    fn test_role_parse_unknown() {
        assert!("janitor".parse::<ActorRole>().is_err());
    }

    #[test]
    fn test_admin_privileges() {
        assert!(ActorRole::Admin.acts_as_admin());
        assert!(ActorRole::Superadmin.acts_as_admin());
        assert!(!ActorRole::Registrar.acts_as_admin());
        assert!(!ActorRole::Cashier.acts_as_admin());
    }

    #[test]
    fn test_actor_display() {
        let actor = Actor::new(ActorRole::Registrar, "reg-7");
        assert_eq!(actor.to_string(), "registrar:reg-7");
    }

    #[test]
    fn test_role_serde_lowercase() {
        let json = serde_json::to_string(&ActorRole::Dean).unwrap();
        assert_eq!(json, "\"dean\"");
    }
}
