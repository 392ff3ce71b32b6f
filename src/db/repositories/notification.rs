//! Notification repository

use crate::db::DbPool;
use crate::models::{Notification, NotificationKind};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use std::str::FromStr;
use std::sync::Arc;

/// Notification repository trait
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Create a new notification
    async fn create(&self, notification: &Notification) -> Result<Notification>;

    /// Get notification by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Notification>>;

    /// List a user's notifications, newest first
    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Notification>>;

    /// Count a user's unread notifications
    async fn count_unread(&self, user_id: i64) -> Result<i64>;

    /// Mark a notification as read
    async fn mark_read(&self, id: i64) -> Result<()>;

    /// Mark all of a user's notifications as read. Returns the number updated.
    async fn mark_all_read(&self, user_id: i64) -> Result<i64>;

    /// Delete a notification
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based notification repository implementation
pub struct SqlxNotificationRepository {
    pool: DbPool,
}

impl SqlxNotificationRepository {
    /// Create a new SQLx notification repository
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DbPool) -> Arc<dyn NotificationRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl NotificationRepository for SqlxNotificationRepository {
    async fn create(&self, notification: &Notification) -> Result<Notification> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO notifications (user_id, kind, message, related_id, is_read, created_at)
            VALUES (?, ?, ?, ?, 0, ?)
            "#,
        )
        .bind(notification.user_id)
        .bind(notification.kind.to_string())
        .bind(&notification.message)
        .bind(notification.related_id)
        .bind(now)
        .execute(&self.pool)
        .await
        .context("Failed to create notification")?;

        Ok(Notification {
            id: result.last_insert_rowid(),
            is_read: false,
            created_at: now,
            ..notification.clone()
        })
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Notification>> {
        let row = sqlx::query(
            r#"
            SELECT id, user_id, kind, message, related_id, is_read, created_at
            FROM notifications
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to get notification by ID")?;

        match row {
            Some(row) => Ok(Some(row_to_notification(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_by_user(&self, user_id: i64) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, kind, message, related_id, is_read, created_at
            FROM notifications
            WHERE user_id = ?
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list notifications")?;

        rows.iter().map(row_to_notification).collect()
    }

    async fn count_unread(&self, user_id: i64) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .context("Failed to count unread notifications")?;

        Ok(count)
    }

    async fn mark_read(&self, id: i64) -> Result<()> {
        sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to mark notification read")?;

        Ok(())
    }

    async fn mark_all_read(&self, user_id: i64) -> Result<i64> {
        let result =
            sqlx::query("UPDATE notifications SET is_read = 1 WHERE user_id = ? AND is_read = 0")
                .bind(user_id)
                .execute(&self.pool)
                .await
                .context("Failed to mark notifications read")?;

        Ok(result.rows_affected() as i64)
    }

    async fn delete(&self, id: i64) -> Result<()> {
        sqlx::query("DELETE FROM notifications WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .context("Failed to delete notification")?;

        Ok(())
    }
}

fn row_to_notification(row: &sqlx::sqlite::SqliteRow) -> Result<Notification> {
    let kind_str: String = row.get("kind");
    let kind = NotificationKind::from_str(&kind_str)
        .with_context(|| format!("Invalid notification kind in database: {}", kind_str))?;

    Ok(Notification {
        id: row.get("id"),
        user_id: row.get("user_id"),
        kind,
        message: row.get("message"),
        related_id: row.get("related_id"),
        is_read: row.get("is_read"),
        created_at: row.get("created_at"),
    })
}
