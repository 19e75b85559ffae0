//! Company model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Plan identifier used when a company has no plan assigned
pub const FALLBACK_PLAN: &str = "free";

/// Company entity representing a tenant in the system
///
/// The company is the unit of billing and resource-quota scoping. All
/// countable resources (billboards, contracts, team members, templates)
/// belong to exactly one company.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Company {
    /// Unique identifier
    pub id: Uuid,
    /// Company name
    pub name: String,
    /// Subscription plan identifier (free, pro, business)
    pub subscription_plan: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Company {
    /// Effective plan identifier, falling back to `free` when unset
    pub fn plan(&self) -> &str {
        self.subscription_plan.as_deref().unwrap_or(FALLBACK_PLAN)
    }
}

/// Plan tier enumeration
///
/// The closed set of plans the rule store is seeded for. Companies carry the
/// plan as a string column, so unknown values are possible at runtime; those
/// simply resolve to no rules and the safe defaults.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    #[default]
    Free,
    Pro,
    Business,
}

impl PlanTier {
    pub const ALL: [PlanTier; 3] = [PlanTier::Free, PlanTier::Pro, PlanTier::Business];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanTier::Free => "free",
            PlanTier::Pro => "pro",
            PlanTier::Business => "business",
        }
    }
}

impl std::fmt::Display for PlanTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
