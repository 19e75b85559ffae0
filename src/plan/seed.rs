//! Default rule set for the three plans
//!
//! The free tier is the default for all new companies and is intentionally
//! restrictive to encourage upgrades. Business is uncapped on every
//! countable resource.

use crate::models::PlanFeatureRule;

/// Raw (key, value) pairs for one plan
type PlanRules = &'static [(&'static str, &'static str)];

const FREE_RULES: PlanRules = &[
    ("billboards.max", "5"),
    ("contracts.max", "10"),
    ("team.members.max", "3"),
    ("templates.max", "2"),
    ("team.invitations", "1"),
    ("analytics.advanced", "0"),
    ("support.priority", "0"),
    ("api.access", "0"),
    ("export.enabled", "0"),
    ("bulk.operations", "0"),
    ("notifications.email", "1"),
    ("notifications.sms", "0"),
    ("templates.custom", "0"),
    ("contracts.pdf", "0"),
    ("branding.custom", "0"),
];

const PRO_RULES: PlanRules = &[
    ("billboards.max", "50"),
    ("contracts.max", "100"),
    ("team.members.max", "10"),
    ("templates.max", "20"),
    ("team.invitations", "1"),
    ("analytics.advanced", "1"),
    ("support.priority", "0"),
    ("api.access", "1"),
    ("export.enabled", "1"),
    ("bulk.operations", "1"),
    ("notifications.email", "1"),
    ("notifications.sms", "0"),
    ("templates.custom", "1"),
    ("contracts.pdf", "1"),
    ("branding.custom", "0"),
];

const BUSINESS_RULES: PlanRules = &[
    ("billboards.max", "unlimited"),
    ("contracts.max", "unlimited"),
    ("team.members.max", "unlimited"),
    ("templates.max", "unlimited"),
    ("team.invitations", "1"),
    ("analytics.advanced", "1"),
    ("support.priority", "1"),
    ("api.access", "1"),
    ("export.enabled", "1"),
    ("bulk.operations", "1"),
    ("notifications.email", "1"),
    ("notifications.sms", "1"),
    ("templates.custom", "1"),
    ("contracts.pdf", "1"),
    ("branding.custom", "1"),
];

/// The full default rule set across all plans
pub fn default_rules() -> Vec<PlanFeatureRule> {
    let plans = [
        ("free", FREE_RULES),
        ("pro", PRO_RULES),
        ("business", BUSINESS_RULES),
    ];

    plans
        .into_iter()
        .flat_map(|(plan, rules)| {
            rules
                .iter()
                .map(move |(key, value)| PlanFeatureRule::new(plan, *key, *value))
        })
        .collect()
}
