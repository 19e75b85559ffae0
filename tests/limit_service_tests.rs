//! Limit service behavior against the seeded default rule set

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use adboard_backend::limits::{LimitService, FEATURE_FLAGS};
use adboard_backend::models::Company;
use adboard_backend::plan::PlanGate;
use adboard_backend::usage::{InMemoryUsageRepository, ResourceKind, UsageRepository};

fn company(plan: Option<&str>) -> Company {
    Company {
        id: Uuid::new_v4(),
        name: "Acme Outdoor".to_string(),
        subscription_plan: plan.map(String::from),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn default_service() -> (
    LimitService<Arc<InMemoryUsageRepository>>,
    Arc<InMemoryUsageRepository>,
) {
    let usage = Arc::new(InMemoryUsageRepository::new());
    let service = LimitService::new(Arc::new(PlanGate::with_defaults()), usage.clone());
    (service, usage)
}

#[tokio::test]
async fn free_plan_billboard_quota_is_enforced() {
    let (service, usage) = default_service();
    let acme = company(Some("free"));

    // Seeded free limit is 5 billboards
    usage.set_count(acme.id, ResourceKind::Billboards, 4);
    assert!(service
        .can_create(&acme, ResourceKind::Billboards)
        .await
        .unwrap());

    usage.add_one(acme.id, ResourceKind::Billboards);
    assert!(!service
        .can_create(&acme, ResourceKind::Billboards)
        .await
        .unwrap());

    let summary = service.usage_summary(&acme).await.unwrap();
    assert_eq!(summary.resources.billboards.current, 5);
    assert_eq!(summary.resources.billboards.limit, Some(5));
    assert!(!summary.resources.billboards.can_create);
}

#[tokio::test]
async fn business_plan_is_uncapped() {
    let (service, usage) = default_service();
    let acme = company(Some("business"));

    usage.set_count(acme.id, ResourceKind::Billboards, 1000);
    assert!(service
        .can_create(&acme, ResourceKind::Billboards)
        .await
        .unwrap());

    let summary = service.usage_summary(&acme).await.unwrap();
    assert_eq!(summary.resources.billboards.current, 1000);
    assert_eq!(summary.resources.billboards.limit, None);
    assert!(summary.resources.billboards.can_create);
}

#[tokio::test]
async fn only_active_contracts_would_count() {
    // The repository abstraction owns the status filter; at this level the
    // service just sees whatever the count reports.
    let (service, usage) = default_service();
    let acme = company(Some("free"));

    usage.set_count(acme.id, ResourceKind::Contracts, 10);
    assert!(!service
        .can_create(&acme, ResourceKind::Contracts)
        .await
        .unwrap());
}

#[tokio::test]
async fn company_without_plan_falls_back_to_free() {
    let (service, usage) = default_service();
    let acme = company(None);

    usage.set_count(acme.id, ResourceKind::TeamMembers, 3);

    let summary = service.usage_summary(&acme).await.unwrap();
    assert_eq!(summary.plan, "free");
    assert_eq!(summary.resources.team_members.limit, Some(3));
    assert!(!summary.resources.team_members.can_create);
}

#[tokio::test]
async fn unknown_plan_resolves_to_safe_defaults() {
    let (service, _usage) = default_service();
    let acme = company(Some("legacy-gold"));

    // No rules for this plan: limits are uncapped, flags disabled,
    // and the invitation gate blocks
    assert!(service
        .can_create(&acme, ResourceKind::Billboards)
        .await
        .unwrap());
    assert!(!service.can_invite_team_member(&acme).await.unwrap());

    let summary = service.usage_summary(&acme).await.unwrap();
    assert!(summary.features.values().all(|enabled| !enabled));
}

#[tokio::test]
async fn invitations_require_flag_and_headroom() {
    let (service, usage) = default_service();
    let acme = company(Some("free"));

    // Seeded: team.invitations = 1, team.members.max = 3
    assert!(service.can_invite_team_member(&acme).await.unwrap());

    usage.set_count(acme.id, ResourceKind::TeamMembers, 3);
    assert!(!service.can_invite_team_member(&acme).await.unwrap());
}

#[tokio::test]
async fn summary_reports_the_full_flag_set_per_plan() {
    let (service, _usage) = default_service();

    let free = service
        .usage_summary(&company(Some("free")))
        .await
        .unwrap();
    let business = service
        .usage_summary(&company(Some("business")))
        .await
        .unwrap();

    assert_eq!(free.features.len(), FEATURE_FLAGS.len());
    assert_eq!(business.features.len(), FEATURE_FLAGS.len());

    assert!(!free.features["api.access"]);
    assert!(business.features["api.access"]);
    assert!(business.features["support.priority"]);
}

#[tokio::test]
async fn counts_are_monotonic_per_company_and_kind() {
    let usage = InMemoryUsageRepository::new();
    let id = Uuid::new_v4();

    for expected in 1..=10u64 {
        usage.add_one(id, ResourceKind::Templates);
        assert_eq!(
            usage.count(id, ResourceKind::Templates).await.unwrap(),
            expected
        );
    }
}
