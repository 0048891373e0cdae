//! Organization plan tier

use serde::{Deserialize, Serialize};

/// Subscription tier an organization is on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PlanTier {
    Starter,
    Professional,
    Enterprise,
}

impl PlanTier {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "STARTER" => Some(Self::Starter),
            "PROFESSIONAL" => Some(Self::Professional),
            "ENTERPRISE" => Some(Self::Enterprise),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Starter => "STARTER",
            Self::Professional => "PROFESSIONAL",
            Self::Enterprise => "ENTERPRISE",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_db())
    }
}
