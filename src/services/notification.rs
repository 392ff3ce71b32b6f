//! Notification service
//!
//! Per-user inbox operations. All reads and mutations are scoped to the
//! owning user; other components write inbox entries through the repository.

use crate::db::repositories::NotificationRepository;
use crate::models::Notification;
use anyhow::Context;
use std::sync::Arc;

/// Error types for notification service operations
#[derive(Debug, thiserror::Error)]
pub enum NotificationServiceError {
    /// Notification not found
    #[error("Notification not found")]
    NotFound,

    /// Acting user is not the recipient
    #[error("{0}")]
    Forbidden(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Inbox listing with its unread count
#[derive(Debug, Clone, serde::Serialize)]
pub struct Inbox {
    pub notifications: Vec<Notification>,
    pub unread: i64,
}

/// Notification service
pub struct NotificationService {
    repo: Arc<dyn NotificationRepository>,
}

impl NotificationService {
    pub fn new(repo: Arc<dyn NotificationRepository>) -> Self {
        Self { repo }
    }

    /// List a user's inbox with the unread count
    pub async fn inbox(&self, user_id: i64) -> Result<Inbox, NotificationServiceError> {
        let notifications = self
            .repo
            .list_by_user(user_id)
            .await
            .context("Failed to list notifications")?;
        let unread = self
            .repo
            .count_unread(user_id)
            .await
            .context("Failed to count unread")?;

        Ok(Inbox {
            notifications,
            unread,
        })
    }

    /// Mark one notification read. Owner only.
    pub async fn mark_read(
        &self,
        user_id: i64,
        notification_id: i64,
    ) -> Result<(), NotificationServiceError> {
        self.owned(user_id, notification_id).await?;

        self.repo
            .mark_read(notification_id)
            .await
            .context("Failed to mark read")?;

        Ok(())
    }

    /// Mark the whole inbox read. Returns the number updated.
    pub async fn mark_all_read(&self, user_id: i64) -> Result<i64, NotificationServiceError> {
        let updated = self
            .repo
            .mark_all_read(user_id)
            .await
            .context("Failed to mark all read")?;

        Ok(updated)
    }

    /// Delete one notification. Owner only.
    pub async fn delete(
        &self,
        user_id: i64,
        notification_id: i64,
    ) -> Result<(), NotificationServiceError> {
        self.owned(user_id, notification_id).await?;

        self.repo
            .delete(notification_id)
            .await
            .context("Failed to delete notification")?;

        Ok(())
    }

    async fn owned(
        &self,
        user_id: i64,
        notification_id: i64,
    ) -> Result<Notification, NotificationServiceError> {
        let notification = self
            .repo
            .get_by_id(notification_id)
            .await
            .context("Failed to get notification")?
            .ok_or(NotificationServiceError::NotFound)?;

        if notification.user_id != user_id {
            return Err(NotificationServiceError::Forbidden(
                "This notification belongs to another user".to_string(),
            ));
        }

        Ok(notification)
    }
}
