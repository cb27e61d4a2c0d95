//! Inventory vocabulary shared by storage and the HTTP layer.

pub mod attributes;
pub mod sort;

pub use attributes::{AttributeValue, AttributeViolation, FieldRule, FieldType};
pub use sort::{ServerSort, SortDirection, SortField};

use serde::{Deserialize, Serialize};

/// Deployment environment of a server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Prod,
    Stg,
    #[default]
    Dev,
}

impl Environment {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Prod => "prod",
            Self::Stg => "stg",
            Self::Dev => "dev",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prod" => Ok(Self::Prod),
            "stg" => Ok(Self::Stg),
            "dev" => Ok(Self::Dev),
            other => Err(format!(
                "Unknown environment: {other}. Expected one of: prod, stg, dev"
            )),
        }
    }
}

/// Kind of mutation recorded in the audit log.
///
/// Stored as free text so older rows with other actions still read back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
