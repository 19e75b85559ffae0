//! Limit notification sweep
//!
//! Periodic batch job that walks companies, compares usage to plan limits,
//! and creates a `subscription_limit` notification when usage crosses 75%
//! of a finite limit. Notices are deduplicated per (company, resource) over
//! a 24 hour window. A separate pass deletes expired notifications.
//!
//! The sweep is a single-threaded read-then-write loop per company; two
//! racing sweeps can at worst duplicate an informational notice, which is
//! accepted rather than hardened against.

use std::sync::Arc;
use std::time::Duration as StdDuration;

use anyhow::Result;
use chrono::{Duration, Utc};
use serde_json::json;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::SweepSettings;
use crate::error::AppResult;
use crate::models::{Company, NewNotification, NotificationLevel, SUBSCRIPTION_LIMIT};
use crate::observability::Metrics;
use crate::plan::{LimitValue, PlanGate};
use crate::usage::{ResourceKind, UsageRepository};

mod store;

pub use store::{
    CompanyStore, InMemoryCompanyStore, InMemoryNotificationStore, NotificationStore,
    PgCompanyStore, PgNotificationStore,
};

/// Usage percentage at which a notice is created
pub const NOTIFY_THRESHOLD_PCT: f64 = 75.0;
/// Usage percentage escalating the notice to a warning
pub const WARNING_PCT: f64 = 90.0;
/// Usage percentage escalating the notice to an error
pub const ERROR_PCT: f64 = 100.0;

/// Dedup window: at most one notice per (company, resource) in this span
const DEDUP_WINDOW_HOURS: i64 = 24;
/// How long created notices live before the expiry pass removes them
const NOTICE_TTL_DAYS: i64 = 7;

/// Severity level for a usage percentage
///
/// The `success` arm is unreachable from the sweep because notices are only
/// created at or above [`NOTIFY_THRESHOLD_PCT`]; the function is kept total
/// pending product clarification of the intended thresholds (see DESIGN.md).
pub fn level_for_usage(percentage: f64) -> NotificationLevel {
    if percentage >= ERROR_PCT {
        NotificationLevel::Error
    } else if percentage >= WARNING_PCT {
        NotificationLevel::Warning
    } else if percentage >= NOTIFY_THRESHOLD_PCT {
        NotificationLevel::Info
    } else {
        NotificationLevel::Success
    }
}

/// Outcome of a single sweep run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Companies processed to completion
    pub companies_checked: u64,
    /// Notices created across all companies
    pub notifications_created: u64,
    /// Companies skipped because of an error
    pub errors: u64,
}

/// The limit notification sweeper
pub struct Sweeper<C, R, N> {
    gate: Arc<PlanGate>,
    companies: C,
    usage: R,
    notifications: N,
    metrics: Arc<Metrics>,
}

impl<C, R, N> Sweeper<C, R, N>
where
    C: CompanyStore,
    R: UsageRepository,
    N: NotificationStore,
{
    pub fn new(
        gate: Arc<PlanGate>,
        companies: C,
        usage: R,
        notifications: N,
        metrics: Arc<Metrics>,
    ) -> Self {
        Self {
            gate,
            companies,
            usage,
            notifications,
            metrics,
        }
    }

    /// Run the sweep and expiry passes on their intervals until shutdown
    pub async fn run(
        &self,
        settings: &SweepSettings,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<()> {
        info!("Limit sweeper starting");

        let mut sweep_ticker = interval(StdDuration::from_secs(settings.interval_secs));
        let mut expiry_ticker = interval(StdDuration::from_secs(settings.expiry_interval_secs));

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("Sweeper shutdown signal received");
                        break;
                    }
                }

                _ = sweep_ticker.tick() => {
                    match self.sweep_once(None).await {
                        Ok(report) => {
                            info!(
                                companies = report.companies_checked,
                                created = report.notifications_created,
                                errors = report.errors,
                                "Limit sweep completed"
                            );
                        }
                        Err(e) => {
                            error!(error = %e, "Limit sweep failed");
                        }
                    }
                }

                _ = expiry_ticker.tick() => {
                    if let Err(e) = self.purge_expired().await {
                        error!(error = %e, "Failed to purge expired notifications");
                    }
                }
            }
        }

        info!("Sweeper shutdown complete");
        Ok(())
    }

    /// Walk all companies (or the single filtered one) and emit limit notices
    ///
    /// A failure while processing one company is logged and counted; the
    /// sweep continues with the next company.
    pub async fn sweep_once(&self, company_filter: Option<Uuid>) -> AppResult<SweepReport> {
        let timer = self.metrics.sweep_duration.start_timer();
        let companies = self.companies.list(company_filter).await?;

        let mut report = SweepReport::default();

        for company in &companies {
            match self.check_company(company).await {
                Ok(created) => {
                    report.companies_checked += 1;
                    report.notifications_created += created;
                }
                Err(e) => {
                    error!(company_id = %company.id, error = %e, "Failed to check company limits");
                    report.errors += 1;
                }
            }
        }

        self.metrics.sweeps_total.inc();
        self.metrics
            .companies_checked
            .set(report.companies_checked as i64);
        self.metrics
            .notifications_created_total
            .inc_by(report.notifications_created);
        self.metrics.sweep_errors_total.inc_by(report.errors);
        timer.observe_duration();

        Ok(report)
    }

    /// Check one company's four resources against its current plan
    async fn check_company(&self, company: &Company) -> AppResult<u64> {
        let plan = company.plan();
        let mut created = 0;

        for kind in ResourceKind::ALL {
            let limit = match self.gate.limit(plan, kind.limit_key()) {
                Some(LimitValue::Count(n)) if n > 0 => n,
                // Absent, unlimited, or zero limits never notify
                _ => continue,
            };

            let current = self.usage.count(company.id, kind).await?;
            let percentage = (current as f64 / f64::from(limit)) * 100.0;

            if percentage < NOTIFY_THRESHOLD_PCT {
                continue;
            }

            let since = Utc::now() - Duration::hours(DEDUP_WINDOW_HOURS);
            if self
                .notifications
                .recent_limit_notice_exists(company.id, kind.as_str(), since)
                .await?
            {
                debug!(
                    company_id = %company.id,
                    resource = kind.as_str(),
                    "Limit notice already sent within dedup window"
                );
                continue;
            }

            self.notifications
                .create(limit_notice(company, kind, current, limit, percentage))
                .await?;
            created += 1;

            info!(
                company_id = %company.id,
                resource = kind.as_str(),
                current,
                limit,
                percentage = percentage.round(),
                "Created limit notification"
            );
        }

        Ok(created)
    }

    /// Delete all notifications whose expiry has passed
    pub async fn purge_expired(&self) -> AppResult<u64> {
        let deleted = self.notifications.delete_expired(Utc::now()).await?;

        if deleted > 0 {
            info!(count = deleted, "Purged expired notifications");
        }
        self.metrics.notifications_expired_total.inc_by(deleted);

        Ok(deleted)
    }
}

/// Build the notification payload for a limit notice
fn limit_notice(
    company: &Company,
    kind: ResourceKind,
    current: u64,
    limit: u32,
    percentage: f64,
) -> NewNotification {
    let level = level_for_usage(percentage);
    let name = kind.display_name();

    let title = if percentage >= ERROR_PCT {
        format!("{name} limit reached")
    } else {
        format!("{name} limit almost reached")
    };

    let message = format!(
        "You are using {current} of {limit} {name} ({percentage:.0}%) on the {} plan. \
         Upgrade your plan to raise this limit.",
        company.plan()
    );

    NewNotification {
        notification_type: SUBSCRIPTION_LIMIT.to_string(),
        level,
        title,
        message,
        company_id: Some(company.id),
        user_id: None,
        data: json!({
            "resource": kind.as_str(),
            "current": current,
            "limit": limit,
            "percentage": percentage,
        }),
        expires_at: Some(Utc::now() + Duration::days(NOTICE_TTL_DAYS)),
    }
}
