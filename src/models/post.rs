//! Community forum models
//!
//! Posts, threaded comments and per-user likes. Likes are an explicit
//! membership table rather than an embedded id array, so adding and removing
//! are idempotent set operations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Forum post entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub title: String,
    pub content: String,
    /// Free-form category label used for filtered listing
    pub category: String,
    #[serde(default)]
    pub view_count: i64,
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub comment_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    /// Parent comment for one level of threading
    pub parent_id: Option<i64>,
    pub content: String,
    #[serde(default)]
    pub like_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Comment with display metadata and nested replies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithMeta {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub parent_id: Option<i64>,
    pub content: String,
    pub like_count: i64,
    pub is_liked: bool,
    pub avatar_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub replies: Vec<CommentWithMeta>,
}

impl CommentWithMeta {
    /// Generate Gravatar URL from email
    pub fn gravatar_url(email: &str) -> String {
        if email.is_empty() {
            return "https://www.gravatar.com/avatar/?d=mp&s=80".to_string();
        }
        let hash = format!("{:x}", md5::compute(email.trim().to_lowercase()));
        format!("https://www.gravatar.com/avatar/{}?d=mp&s=80", hash)
    }
}

/// Input for creating a post
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePostInput {
    pub title: String,
    pub content: String,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    "general".to_string()
}

/// Input for editing a post
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub category: Option<String>,
}

/// Input for creating a comment
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCommentInput {
    pub content: String,
    pub parent_id: Option<i64>,
}

/// Like target type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LikeTargetType {
    Post,
    Comment,
}

impl std::fmt::Display for LikeTargetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Post => write!(f, "post"),
            Self::Comment => write!(f, "comment"),
        }
    }
}

/// Like entity: one row per (target, user) membership
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: i64,
    pub target_type: LikeTargetType,
    pub target_id: i64,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}
