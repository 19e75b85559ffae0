//! Plan gate: decoded plan rules and feature/limit lookups
//!
//! The gate is built once at process start from the loaded rule set and
//! passed by reference into every service that needs it. Rules are
//! admin/seed-time data, so the load-time snapshot is the only "cache".

use std::collections::HashMap;

use sqlx::PgPool;
use tracing::{info, warn};

use crate::error::AppResult;
use crate::models::{PlanFeatureRule, PlanTier};

mod seed;

pub use seed::default_rules;

/// A numeric limit value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitValue {
    /// No cap on this resource
    Unlimited,
    Count(u32),
}

impl LimitValue {
    /// Whether `current` existing rows leave room for one more
    pub fn permits(&self, current: u64) -> bool {
        match self {
            LimitValue::Unlimited => true,
            LimitValue::Count(max) => current < u64::from(*max),
        }
    }

    /// Numeric cap, if any
    pub fn as_count(&self) -> Option<u32> {
        match self {
            LimitValue::Unlimited => None,
            LimitValue::Count(max) => Some(*max),
        }
    }
}

/// Decoded rule value
///
/// The rule store keeps raw strings; interpretation depends on the key
/// shape. Keys ending in `.max` are limits, everything else is a flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleValue {
    Flag(bool),
    Limit(LimitValue),
}

impl RuleValue {
    /// Decode a raw rule value for the given key
    ///
    /// Returns None for limit keys whose value is neither an integer nor
    /// the `unlimited` sentinel; callers skip such rules.
    pub fn decode(key: &str, raw: &str) -> Option<RuleValue> {
        if key.ends_with(".max") {
            if raw == "unlimited" {
                return Some(RuleValue::Limit(LimitValue::Unlimited));
            }
            raw.trim()
                .parse::<u32>()
                .ok()
                .map(|n| RuleValue::Limit(LimitValue::Count(n)))
        } else {
            Some(RuleValue::Flag(raw == "1" || raw == "true"))
        }
    }
}

/// Decoded rule set keyed by plan, then feature key
#[derive(Debug, Clone, Default)]
pub struct PlanGate {
    rules: HashMap<String, HashMap<String, RuleValue>>,
}

impl PlanGate {
    /// Build a gate from raw rules, decoding each value once
    ///
    /// Undecodable rules are skipped with a warning, never a crash.
    pub fn from_rules(rules: impl IntoIterator<Item = PlanFeatureRule>) -> Self {
        let mut decoded: HashMap<String, HashMap<String, RuleValue>> = HashMap::new();

        for rule in rules {
            match RuleValue::decode(&rule.key, &rule.value) {
                Some(value) => {
                    decoded
                        .entry(rule.plan_id)
                        .or_default()
                        .insert(rule.key, value);
                }
                None => {
                    warn!(
                        plan = %rule.plan_id,
                        key = %rule.key,
                        value = %rule.value,
                        "Skipping undecodable plan rule"
                    );
                }
            }
        }

        Self { rules: decoded }
    }

    /// Build a gate from the built-in seed rule set
    pub fn with_defaults() -> Self {
        Self::from_rules(default_rules())
    }

    /// Whether the feature is enabled for the plan
    ///
    /// Returns `default` when no rule exists for the (plan, key) pair.
    pub fn allows(&self, plan: &str, key: &str, default: bool) -> bool {
        match self.rules.get(plan).and_then(|keys| keys.get(key)) {
            Some(RuleValue::Flag(enabled)) => *enabled,
            // A limit stored under a flag key counts as absent
            Some(RuleValue::Limit(_)) | None => default,
        }
    }

    /// Numeric limit for the plan, if one is configured
    ///
    /// Returns None when the rule is absent; the limit service treats that
    /// as unlimited by omission.
    pub fn limit(&self, plan: &str, key: &str) -> Option<LimitValue> {
        match self.rules.get(plan).and_then(|keys| keys.get(key)) {
            Some(RuleValue::Limit(limit)) => Some(*limit),
            Some(RuleValue::Flag(_)) | None => None,
        }
    }

    /// Number of decoded rules across all plans
    pub fn rule_count(&self) -> usize {
        self.rules.values().map(|keys| keys.len()).sum()
    }
}

/// Load all rules from the rule store
pub async fn load_rules(pool: &PgPool) -> AppResult<Vec<PlanFeatureRule>> {
    let rules: Vec<PlanFeatureRule> =
        sqlx::query_as("SELECT plan_id, key, value FROM plan_feature_rules ORDER BY plan_id, key")
            .fetch_all(pool)
            .await?;

    info!(count = rules.len(), "Loaded plan feature rules");
    Ok(rules)
}

/// Seed the rule store with the default rule set for the three plans
///
/// Idempotent: existing (plan, key) rows are left untouched so that
/// administrative edits survive restarts.
pub async fn seed_default_rules(pool: &PgPool) -> AppResult<u64> {
    let mut inserted = 0;

    for rule in default_rules() {
        let result = sqlx::query(
            r#"
            INSERT INTO plan_feature_rules (plan_id, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (plan_id, key) DO NOTHING
            "#,
        )
        .bind(&rule.plan_id)
        .bind(&rule.key)
        .bind(&rule.value)
        .execute(pool)
        .await?;

        inserted += result.rows_affected();
    }

    if inserted > 0 {
        info!(count = inserted, plans = PlanTier::ALL.len(), "Seeded plan feature rules");
    }

    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_flag_values() {
        assert_eq!(
            RuleValue::decode("api.access", "1"),
            Some(RuleValue::Flag(true))
        );
        assert_eq!(
            RuleValue::decode("api.access", "true"),
            Some(RuleValue::Flag(true))
        );
        assert_eq!(
            RuleValue::decode("api.access", "0"),
            Some(RuleValue::Flag(false))
        );
        // Anything else is a disabled flag, not an error
        assert_eq!(
            RuleValue::decode("api.access", "yes"),
            Some(RuleValue::Flag(false))
        );
    }

    #[test]
    fn test_decode_limit_values() {
        assert_eq!(
            RuleValue::decode("billboards.max", "5"),
            Some(RuleValue::Limit(LimitValue::Count(5)))
        );
        assert_eq!(
            RuleValue::decode("billboards.max", "unlimited"),
            Some(RuleValue::Limit(LimitValue::Unlimited))
        );
        assert_eq!(RuleValue::decode("billboards.max", "lots"), None);
        assert_eq!(RuleValue::decode("billboards.max", "-3"), None);
    }

    #[test]
    fn test_allows_returns_caller_default_for_missing_rule() {
        let gate = PlanGate::from_rules(vec![]);
        assert!(gate.allows("free", "api.access", true));
        assert!(!gate.allows("free", "api.access", false));
    }

    #[test]
    fn test_allows_reads_rule_value() {
        let gate = PlanGate::from_rules(vec![
            PlanFeatureRule::new("free", "api.access", "0"),
            PlanFeatureRule::new("pro", "api.access", "1"),
        ]);
        assert!(!gate.allows("free", "api.access", true));
        assert!(gate.allows("pro", "api.access", false));
    }

    #[test]
    fn test_limit_returns_none_for_missing_rule() {
        let gate = PlanGate::from_rules(vec![]);
        assert_eq!(gate.limit("free", "billboards.max"), None);
    }

    #[test]
    fn test_limit_decodes_count_and_sentinel() {
        let gate = PlanGate::from_rules(vec![
            PlanFeatureRule::new("free", "billboards.max", "5"),
            PlanFeatureRule::new("business", "billboards.max", "unlimited"),
        ]);
        assert_eq!(
            gate.limit("free", "billboards.max"),
            Some(LimitValue::Count(5))
        );
        assert_eq!(
            gate.limit("business", "billboards.max"),
            Some(LimitValue::Unlimited)
        );
    }

    #[test]
    fn test_undecodable_rule_is_skipped() {
        let gate = PlanGate::from_rules(vec![
            PlanFeatureRule::new("free", "billboards.max", "many"),
            PlanFeatureRule::new("free", "api.access", "1"),
        ]);
        assert_eq!(gate.limit("free", "billboards.max"), None);
        assert_eq!(gate.rule_count(), 1);
    }

    #[test]
    fn test_limit_permits() {
        assert!(LimitValue::Unlimited.permits(1_000_000));
        assert!(LimitValue::Count(5).permits(4));
        assert!(!LimitValue::Count(5).permits(5));
        assert!(!LimitValue::Count(0).permits(0));
    }

    #[test]
    fn test_defaults_cover_all_plans() {
        let gate = PlanGate::with_defaults();
        for tier in PlanTier::ALL {
            assert!(
                gate.limit(tier.as_str(), "billboards.max").is_some(),
                "plan {} should have a billboard limit rule",
                tier
            );
        }
    }
}
