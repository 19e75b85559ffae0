//! Limit service: combines the plan gate with usage counts
//!
//! Answers "can this company create one more X" and produces the usage
//! summary consumed by the account UI. All lookups go through the decoded
//! plan gate; absent rules resolve to safe defaults (allowed for limits,
//! disabled for flags) and never error.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;

use crate::error::AppResult;
use crate::models::Company;
use crate::plan::{LimitValue, PlanGate};
use crate::usage::{ResourceKind, UsageRepository};

/// Rule key for the team invitation feature flag
///
/// Team invitation is the only resource gated by a boolean flag in addition
/// to its numeric limit. The other three kinds check only the count.
pub const TEAM_INVITATIONS_KEY: &str = "team.invitations";

/// The fixed set of boolean feature flags reported in the usage summary
pub const FEATURE_FLAGS: [&str; 11] = [
    "analytics.advanced",
    "support.priority",
    "api.access",
    "export.enabled",
    "bulk.operations",
    "notifications.email",
    "notifications.sms",
    "team.invitations",
    "templates.custom",
    "contracts.pdf",
    "branding.custom",
];

/// Usage and limit for a single resource kind
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UsageItem {
    /// Current row count
    pub current: u64,
    /// Numeric cap; None when unlimited or no rule is configured
    pub limit: Option<u32>,
    /// Whether one more row may be created right now
    pub can_create: bool,
}

/// Per-resource usage breakdown
#[derive(Debug, Clone, Serialize)]
pub struct ResourceUsage {
    pub billboards: UsageItem,
    pub contracts: UsageItem,
    pub team_members: UsageItem,
    pub templates: UsageItem,
}

/// Full usage summary for a company
#[derive(Debug, Clone, Serialize)]
pub struct UsageSummary {
    /// Effective plan identifier
    pub plan: String,
    pub resources: ResourceUsage,
    /// The fixed feature flag set, each read independently from the gate
    pub features: BTreeMap<String, bool>,
}

/// Plan-gating and usage-accounting service
#[derive(Clone)]
pub struct LimitService<R> {
    gate: Arc<PlanGate>,
    usage: R,
}

impl<R: UsageRepository> LimitService<R> {
    pub fn new(gate: Arc<PlanGate>, usage: R) -> Self {
        Self { gate, usage }
    }

    /// Whether the company may create one more resource of `kind`
    ///
    /// An absent rule means unlimited by omission.
    pub async fn can_create(&self, company: &Company, kind: ResourceKind) -> AppResult<bool> {
        let limit = match self.gate.limit(company.plan(), kind.limit_key()) {
            None | Some(LimitValue::Unlimited) => return Ok(true),
            Some(limit) => limit,
        };

        let current = self.usage.count(company.id, kind).await?;
        Ok(limit.permits(current))
    }

    /// Whether the company may invite one more team member
    ///
    /// Gated by the `team.invitations` flag first, then by the member count.
    pub async fn can_invite_team_member(&self, company: &Company) -> AppResult<bool> {
        if !self
            .gate
            .allows(company.plan(), TEAM_INVITATIONS_KEY, false)
        {
            return Ok(false);
        }

        self.can_create(company, ResourceKind::TeamMembers).await
    }

    /// Aggregate usage, limits and feature flags for the company
    pub async fn usage_summary(&self, company: &Company) -> AppResult<UsageSummary> {
        let plan = company.plan();

        let billboards = self.usage_item(company, ResourceKind::Billboards).await?;
        let contracts = self.usage_item(company, ResourceKind::Contracts).await?;
        let team_members = self.usage_item(company, ResourceKind::TeamMembers).await?;
        let templates = self.usage_item(company, ResourceKind::Templates).await?;

        let features = FEATURE_FLAGS
            .iter()
            .map(|key| (key.to_string(), self.gate.allows(plan, key, false)))
            .collect();

        Ok(UsageSummary {
            plan: plan.to_string(),
            resources: ResourceUsage {
                billboards,
                contracts,
                team_members,
                templates,
            },
            features,
        })
    }

    async fn usage_item(&self, company: &Company, kind: ResourceKind) -> AppResult<UsageItem> {
        let current = self.usage.count(company.id, kind).await?;
        let limit = self.gate.limit(company.plan(), kind.limit_key());

        let can_create = match limit {
            None | Some(LimitValue::Unlimited) => true,
            Some(limit) => limit.permits(current),
        };

        Ok(UsageItem {
            current,
            limit: limit.and_then(|l| l.as_count()),
            can_create,
        })
    }

    /// The plan gate backing this service
    pub fn gate(&self) -> &PlanGate {
        &self.gate
    }
}
