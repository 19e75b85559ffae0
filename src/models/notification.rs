//! Notification model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Notification type emitted by the limit sweep
pub const SUBSCRIPTION_LIMIT: &str = "subscription_limit";

/// Notification severity level
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl NotificationLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationLevel::Success => "success",
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        }
    }
}

impl std::fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification entity
///
/// Created by the limit sweep, read and dismissed by end users through the
/// notification API (out of scope here), and deleted by the expiry sweep
/// once `expires_at` has passed.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub notification_type: String,
    pub level: String,
    pub title: String,
    pub message: String,
    pub company_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    /// Structured payload; limit notices carry
    /// `{resource, current, limit, percentage}` and the sweep deduplicates
    /// on `data->>'resource'`
    pub data: serde_json::Value,
    pub is_read: bool,
    pub is_dismissed: bool,
    pub expires_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a new notification
#[derive(Debug, Clone)]
pub struct NewNotification {
    pub notification_type: String,
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
    pub company_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub data: serde_json::Value,
    pub expires_at: Option<DateTime<Utc>>,
}
