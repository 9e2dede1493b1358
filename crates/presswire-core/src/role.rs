//! Caller identity and the role hierarchy.
//!
//! Authentication happens outside the core: every operation receives a
//! resolved [`Caller`] and threads it explicitly. There is no ambient
//! "current user" anywhere in this workspace.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::ActorId;

/// The closed, totally ordered role set. Higher roles inherit all
/// permissions of lower ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Anonymous,
    Subscriber,
    Journalist,
    Moderator,
    Editor,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Anonymous => "anonymous",
            Role::Subscriber => "subscriber",
            Role::Journalist => "journalist",
            Role::Moderator => "moderator",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "anonymous" => Some(Role::Anonymous),
            "subscriber" => Some(Role::Subscriber),
            "journalist" => Some(Role::Journalist),
            "moderator" => Some(Role::Moderator),
            "editor" => Some(Role::Editor),
            "admin" => Some(Role::Admin),
            _ => None,
        }
    }

    /// True if this role meets or exceeds `required`.
    pub fn at_least(self, required: Role) -> bool {
        self >= required
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved caller: opaque identity plus role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Caller {
    pub id: ActorId,
    pub role: Role,
}

impl Caller {
    pub fn new(id: ActorId, role: Role) -> Self {
        Self { id, role }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_total_order() {
        assert!(Role::Anonymous < Role::Subscriber);
        assert!(Role::Subscriber < Role::Journalist);
        assert!(Role::Journalist < Role::Moderator);
        assert!(Role::Moderator < Role::Editor);
        assert!(Role::Editor < Role::Admin);
    }

    #[test]
    fn test_higher_role_inherits() {
        assert!(Role::Admin.at_least(Role::Editor));
        assert!(Role::Editor.at_least(Role::Journalist));
        assert!(!Role::Journalist.at_least(Role::Editor));
    }

    #[test]
    fn test_role_parse_roundtrip() {
        for r in [
            Role::Anonymous,
            Role::Subscriber,
            Role::Journalist,
            Role::Moderator,
            Role::Editor,
            Role::Admin,
        ] {
            assert_eq!(Role::parse(r.as_str()), Some(r));
        }
    }
}
