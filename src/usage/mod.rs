//! Usage counting for quota-scoped resources
//!
//! The limit service depends only on the `UsageRepository` abstraction, so
//! the counting backend (Postgres in production, in-memory in tests) is
//! swappable. Counts always reflect current state at call time; the read
//! skew window between a count and a subsequent create is tolerated because
//! the quota is advisory.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;

/// The four quota-counted resource kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Billboards,
    Contracts,
    TeamMembers,
    Templates,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Billboards,
        ResourceKind::Contracts,
        ResourceKind::TeamMembers,
        ResourceKind::Templates,
    ];

    /// Stable identifier used in notification payloads
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Billboards => "billboards",
            ResourceKind::Contracts => "contracts",
            ResourceKind::TeamMembers => "team_members",
            ResourceKind::Templates => "templates",
        }
    }

    /// Rule store key holding the numeric limit for this kind
    pub fn limit_key(&self) -> &'static str {
        match self {
            ResourceKind::Billboards => "billboards.max",
            ResourceKind::Contracts => "contracts.max",
            ResourceKind::TeamMembers => "team.members.max",
            ResourceKind::Templates => "templates.max",
        }
    }

    /// Human-readable name for notification text
    pub fn display_name(&self) -> &'static str {
        match self {
            ResourceKind::Billboards => "billboards",
            ResourceKind::Contracts => "active contracts",
            ResourceKind::TeamMembers => "team members",
            ResourceKind::Templates => "contract templates",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counting capability the limit service and sweep depend on
pub trait UsageRepository {
    /// Current number of rows of `kind` owned by the company
    fn count(
        &self,
        company_id: Uuid,
        kind: ResourceKind,
    ) -> impl std::future::Future<Output = AppResult<u64>> + Send;
}

impl<T> UsageRepository for std::sync::Arc<T>
where
    T: UsageRepository + Send + Sync,
{
    async fn count(&self, company_id: Uuid, kind: ResourceKind) -> AppResult<u64> {
        (**self).count(company_id, kind).await
    }
}

/// Postgres-backed usage counts
///
/// One COUNT query per resource kind. Only active contracts count toward
/// the contract quota.
#[derive(Clone)]
pub struct PgUsageRepository {
    pool: PgPool,
}

impl PgUsageRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UsageRepository for PgUsageRepository {
    async fn count(&self, company_id: Uuid, kind: ResourceKind) -> AppResult<u64> {
        let query = match kind {
            ResourceKind::Billboards => {
                "SELECT COUNT(*) FROM billboards WHERE company_id = $1"
            }
            ResourceKind::Contracts => {
                "SELECT COUNT(*) FROM contracts WHERE company_id = $1 AND status = 'active'"
            }
            ResourceKind::TeamMembers => {
                "SELECT COUNT(*) FROM team_members WHERE company_id = $1"
            }
            ResourceKind::Templates => {
                "SELECT COUNT(*) FROM contract_templates WHERE company_id = $1"
            }
        };

        let row: (i64,) = sqlx::query_as(query)
            .bind(company_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.0 as u64)
    }
}

/// In-memory usage counts for tests
#[derive(Debug, Default)]
pub struct InMemoryUsageRepository {
    counts: Mutex<HashMap<(Uuid, ResourceKind), u64>>,
}

impl InMemoryUsageRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the count for a (company, kind) pair
    pub fn set_count(&self, company_id: Uuid, kind: ResourceKind, count: u64) {
        self.counts
            .lock()
            .expect("usage lock poisoned")
            .insert((company_id, kind), count);
    }

    /// Simulate creating one more resource row
    pub fn add_one(&self, company_id: Uuid, kind: ResourceKind) {
        *self
            .counts
            .lock()
            .expect("usage lock poisoned")
            .entry((company_id, kind))
            .or_insert(0) += 1;
    }
}

impl UsageRepository for InMemoryUsageRepository {
    async fn count(&self, company_id: Uuid, kind: ResourceKind) -> AppResult<u64> {
        Ok(*self
            .counts
            .lock()
            .expect("usage lock poisoned")
            .get(&(company_id, kind))
            .unwrap_or(&0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_keys() {
        assert_eq!(ResourceKind::Billboards.limit_key(), "billboards.max");
        assert_eq!(ResourceKind::TeamMembers.limit_key(), "team.members.max");
    }

    #[test]
    fn test_all_kinds_are_distinct() {
        let mut keys: Vec<_> = ResourceKind::ALL.iter().map(|k| k.limit_key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), ResourceKind::ALL.len());
    }

    #[tokio::test]
    async fn test_in_memory_counts() {
        let repo = InMemoryUsageRepository::new();
        let company = Uuid::new_v4();

        assert_eq!(
            repo.count(company, ResourceKind::Billboards).await.unwrap(),
            0
        );

        repo.set_count(company, ResourceKind::Billboards, 4);
        repo.add_one(company, ResourceKind::Billboards);
        assert_eq!(
            repo.count(company, ResourceKind::Billboards).await.unwrap(),
            5
        );

        // Other kinds and companies are unaffected
        assert_eq!(
            repo.count(company, ResourceKind::Contracts).await.unwrap(),
            0
        );
        assert_eq!(
            repo.count(Uuid::new_v4(), ResourceKind::Billboards)
                .await
                .unwrap(),
            0
        );
    }
}
