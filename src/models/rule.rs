//! Plan feature rule model

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single (plan, key) -> value mapping from the rule store
///
/// The raw value is a string interpreted by key shape: keys ending in `.max`
/// are numeric limits (or the literal `unlimited`), all other keys are
/// boolean flags stored as `"1"`/`"0"`. Decoding happens once at load time in
/// the plan gate.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct PlanFeatureRule {
    pub plan_id: String,
    pub key: String,
    pub value: String,
}

impl PlanFeatureRule {
    pub fn new(
        plan_id: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            plan_id: plan_id.into(),
            key: key.into(),
            value: value.into(),
        }
    }
}
