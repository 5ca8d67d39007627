//! Platform roles carried inside issued credentials

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role of a subject on the content platform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Full administrative access to the content hierarchy
    Admin,
    /// Can author and reorder courses, lessons and exercises
    Editor,
    /// Consumes published content
    #[default]
    Learner,
}

impl Role {
    /// Stable string form, as stored in the database and in claims
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::Learner => "learner",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a role string is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown role: {0}")]
pub struct RoleParseError(pub String);

impl std::str::FromStr for Role {
    type Err = RoleParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "editor" => Ok(Self::Editor),
            "learner" => Ok(Self::Learner),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}
