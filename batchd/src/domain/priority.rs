//! Priority classes for ingestions

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Priority string outside the closed set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid priority: {0} (expected one of HIGH, MEDIUM, LOW)")]
pub struct InvalidPriority(pub String);

/// Priority class of an ingestion.
///
/// Variants are declared in dispatch order, so the derived `Ord` puts `High`
/// first: the queue pops the smallest key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Medium => "MEDIUM",
            Self::Low => "LOW",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "HIGH" => Ok(Self::High),
            "MEDIUM" => Ok(Self::Medium),
            "LOW" => Ok(Self::Low),
            _ => Err(InvalidPriority(s.to_string())),
        }
    }
}
