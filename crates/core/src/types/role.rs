//! User roles on the tutoring platform.

use serde::{Deserialize, Serialize};

/// Role a platform account holds.
///
/// Role is immutable for the lifetime of a session from the client's
/// perspective. Only `parent` accounts are subject to entitlement checks;
/// `admin` accounts are never permitted to hold a session on this client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Platform administrator. Sessions are issued on other clients only.
    Admin,
    /// A tutor delivering classes.
    Tutor,
    /// A student attending classes.
    Student,
    /// A parent account, gated by subscription entitlement.
    Parent,
}

impl Role {
    /// Whether this role is subject to subscription entitlement checks.
    #[must_use]
    pub const fn requires_entitlement(self) -> bool {
        matches!(self, Self::Parent)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Admin => write!(f, "admin"),
            Self::Tutor => write!(f, "tutor"),
            Self::Student => write!(f, "student"),
            Self::Parent => write!(f, "parent"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "tutor" => Ok(Self::Tutor),
            "student" => Ok(Self::Student),
            "parent" => Ok(Self::Parent),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_only_parent_requires_entitlement() {
        assert!(Role::Parent.requires_entitlement());
        assert!(!Role::Admin.requires_entitlement());
        assert!(!Role::Tutor.requires_entitlement());
        assert!(!Role::Student.requires_entitlement());
    }

    #[test]
    fn test_serde_snake_case() {
        assert_eq!(serde_json::to_string(&Role::Parent).unwrap(), "\"parent\"");
        let role: Role = serde_json::from_str("\"tutor\"").unwrap();
        assert_eq!(role, Role::Tutor);
    }

    #[test]
    fn test_from_str_roundtrip() {
        for role in [Role::Admin, Role::Tutor, Role::Student, Role::Parent] {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("guardian".parse::<Role>().is_err());
    }
}
