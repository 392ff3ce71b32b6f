//! Notification model
//!
//! Per-user inbox entries written by other components (application workflow,
//! comment replies). The client polls; nothing is pushed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Notification entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub id: i64,
    /// Recipient user ID
    pub user_id: i64,
    pub kind: NotificationKind,
    /// Human-readable message
    pub message: String,
    /// Id of the related entity (application, comment), when applicable
    pub related_id: Option<i64>,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// What triggered a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A new adoption application arrived for one of the shelter's pets
    ApplicationReceived,
    /// The status of the user's application changed
    ApplicationStatus,
    /// Someone replied to the user's comment
    CommentReply,
}

impl fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotificationKind::ApplicationReceived => write!(f, "application_received"),
            NotificationKind::ApplicationStatus => write!(f, "application_status"),
            NotificationKind::CommentReply => write!(f, "comment_reply"),
        }
    }
}

impl FromStr for NotificationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "application_received" => Ok(NotificationKind::ApplicationReceived),
            "application_status" => Ok(NotificationKind::ApplicationStatus),
            "comment_reply" => Ok(NotificationKind::CommentReply),
            _ => Err(anyhow::anyhow!("Invalid notification kind: {}", s)),
        }
    }
}
