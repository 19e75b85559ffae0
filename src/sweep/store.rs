//! Company and notification storage backing the sweep
//!
//! The sweeper depends on these two abstractions plus the usage repository,
//! so the whole state machine is testable without a database.

use std::future::Future;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use crate::models::{Company, NewNotification, Notification, SUBSCRIPTION_LIMIT};

/// Read access to the company roster
pub trait CompanyStore {
    /// All companies, or just the one matching `filter`
    fn list(
        &self,
        filter: Option<Uuid>,
    ) -> impl Future<Output = AppResult<Vec<Company>>> + Send;
}

/// Write access to notification records
pub trait NotificationStore {
    fn create(&self, notification: NewNotification)
        -> impl Future<Output = AppResult<()>> + Send;

    /// Whether a `subscription_limit` notice for this (company, resource)
    /// pair was created at or after `since`
    fn recent_limit_notice_exists(
        &self,
        company_id: Uuid,
        resource: &str,
        since: DateTime<Utc>,
    ) -> impl Future<Output = AppResult<bool>> + Send;

    /// Delete notifications whose expiry has passed; returns the count
    fn delete_expired(&self, now: DateTime<Utc>)
        -> impl Future<Output = AppResult<u64>> + Send;
}

impl<T> CompanyStore for std::sync::Arc<T>
where
    T: CompanyStore + Send + Sync,
{
    async fn list(&self, filter: Option<Uuid>) -> AppResult<Vec<Company>> {
        (**self).list(filter).await
    }
}

impl<T> NotificationStore for std::sync::Arc<T>
where
    T: NotificationStore + Send + Sync,
{
    async fn create(&self, notification: NewNotification) -> AppResult<()> {
        (**self).create(notification).await
    }

    async fn recent_limit_notice_exists(
        &self,
        company_id: Uuid,
        resource: &str,
        since: DateTime<Utc>,
    ) -> AppResult<bool> {
        (**self)
            .recent_limit_notice_exists(company_id, resource, since)
            .await
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        (**self).delete_expired(now).await
    }
}

/// Postgres-backed company roster
#[derive(Clone)]
pub struct PgCompanyStore {
    pool: PgPool,
}

impl PgCompanyStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CompanyStore for PgCompanyStore {
    async fn list(&self, filter: Option<Uuid>) -> AppResult<Vec<Company>> {
        let companies = match filter {
            Some(id) => {
                sqlx::query_as(
                    "SELECT id, name, subscription_plan, created_at, updated_at \
                     FROM companies WHERE id = $1",
                )
                .bind(id)
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as(
                    "SELECT id, name, subscription_plan, created_at, updated_at \
                     FROM companies ORDER BY created_at",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        Ok(companies)
    }
}

/// Postgres-backed notification records
#[derive(Clone)]
pub struct PgNotificationStore {
    pool: PgPool,
}

impl PgNotificationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl NotificationStore for PgNotificationStore {
    async fn create(&self, notification: NewNotification) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO notifications (
                id, notification_type, level, title, message,
                company_id, user_id, data, is_read, is_dismissed,
                expires_at, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, FALSE, FALSE, $9, NOW())
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&notification.notification_type)
        .bind(notification.level.as_str())
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.company_id)
        .bind(notification.user_id)
        .bind(&notification.data)
        .bind(notification.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn recent_limit_notice_exists(
        &self,
        company_id: Uuid,
        resource: &str,
        since: DateTime<Utc>,
    ) -> AppResult<bool> {
        let row: (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM notifications
                WHERE notification_type = $1
                  AND company_id = $2
                  AND data->>'resource' = $3
                  AND created_at >= $4
            )
            "#,
        )
        .bind(SUBSCRIPTION_LIMIT)
        .bind(company_id)
        .bind(resource)
        .bind(since)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE expires_at IS NOT NULL AND expires_at < $1",
        )
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

/// In-memory company roster for tests
#[derive(Debug, Default)]
pub struct InMemoryCompanyStore {
    companies: Mutex<Vec<Company>>,
}

impl InMemoryCompanyStore {
    pub fn new(companies: Vec<Company>) -> Self {
        Self {
            companies: Mutex::new(companies),
        }
    }
}

impl CompanyStore for InMemoryCompanyStore {
    async fn list(&self, filter: Option<Uuid>) -> AppResult<Vec<Company>> {
        let companies = self.companies.lock().expect("company lock poisoned");
        Ok(companies
            .iter()
            .filter(|c| filter.map_or(true, |id| c.id == id))
            .cloned()
            .collect())
    }
}

/// In-memory notification records for tests
#[derive(Debug, Default)]
pub struct InMemoryNotificationStore {
    items: Mutex<Vec<Notification>>,
}

impl InMemoryNotificationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all stored notifications
    pub fn all(&self) -> Vec<Notification> {
        self.items.lock().expect("notification lock poisoned").clone()
    }
}

impl NotificationStore for InMemoryNotificationStore {
    async fn create(&self, notification: NewNotification) -> AppResult<()> {
        let mut items = self.items.lock().expect("notification lock poisoned");
        items.push(Notification {
            id: Uuid::new_v4(),
            notification_type: notification.notification_type,
            level: notification.level.as_str().to_string(),
            title: notification.title,
            message: notification.message,
            company_id: notification.company_id,
            user_id: notification.user_id,
            data: notification.data,
            is_read: false,
            is_dismissed: false,
            expires_at: notification.expires_at,
            created_at: Utc::now(),
        });
        Ok(())
    }

    async fn recent_limit_notice_exists(
        &self,
        company_id: Uuid,
        resource: &str,
        since: DateTime<Utc>,
    ) -> AppResult<bool> {
        let items = self.items.lock().expect("notification lock poisoned");
        Ok(items.iter().any(|n| {
            n.notification_type == SUBSCRIPTION_LIMIT
                && n.company_id == Some(company_id)
                && n.data["resource"] == resource
                && n.created_at >= since
        }))
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut items = self.items.lock().expect("notification lock poisoned");
        let before = items.len();
        items.retain(|n| n.expires_at.map_or(true, |at| at >= now));
        Ok((before - items.len()) as u64)
    }
}
